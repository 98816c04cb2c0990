use basket_types::Amount;
use serde::{Deserialize, Serialize};

/// Claim units minted for the first deposit into an empty basket.
pub const DEFAULT_BOOTSTRAP_UNITS: Amount = 1_000;

/// Per-implementation ledger parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Fixes the initial unit price of a basket
    #[serde(default = "default_bootstrap_units")]
    pub bootstrap_units: Amount,
}

fn default_bootstrap_units() -> Amount {
    DEFAULT_BOOTSTRAP_UNITS
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            bootstrap_units: DEFAULT_BOOTSTRAP_UNITS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_uses_default() {
        let config: LedgerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.bootstrap_units, DEFAULT_BOOTSTRAP_UNITS);
    }
}
