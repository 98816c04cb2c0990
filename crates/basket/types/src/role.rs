use serde::{Deserialize, Serialize};

use crate::address::Address;

/// Capabilities checked through an injected access policy.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Platform administration: minimum thresholds, implementation versions
    Admin,
    /// Platform fee configuration
    FeeManager,
    /// Management of a single basket (reserve sync, composition, emergency sweep)
    BasketManager { basket: Address },
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => f.write_str("admin"),
            Role::FeeManager => f.write_str("fee-manager"),
            Role::BasketManager { basket } => write!(f, "basket-manager({})", basket.short_id()),
        }
    }
}
