use std::collections::HashSet;

use basket_types::{Address, Role};
use parking_lot::RwLock;
use tracing::info;

/// Answers whether a caller holds a role.
///
/// Injected into controllers and the factory; no component inherits its
/// authorization rules.
pub trait AccessPolicy: Send + Sync {
    fn check_role(&self, caller: &Address, role: &Role) -> bool;
}

/// Explicit role grants.
pub struct RoleRegistry {
    grants: RwLock<HashSet<(Address, Role)>>,
}

impl RoleRegistry {
    pub fn new() -> Self {
        Self {
            grants: RwLock::new(HashSet::new()),
        }
    }

    /// A registry where `admin` holds both platform roles.
    pub fn with_admin(admin: Address) -> Self {
        let registry = Self::new();
        registry.grant(admin, Role::Admin);
        registry.grant(admin, Role::FeeManager);
        registry
    }

    pub fn grant(&self, account: Address, role: Role) {
        info!(account = %account, role = %role, "Role granted");
        self.grants.write().insert((account, role));
    }

    pub fn revoke(&self, account: &Address, role: &Role) -> bool {
        let removed = self.grants.write().remove(&(*account, role.clone()));
        if removed {
            info!(account = %account, role = %role, "Role revoked");
        }
        removed
    }
}

impl Default for RoleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AccessPolicy for RoleRegistry {
    fn check_role(&self, caller: &Address, role: &Role) -> bool {
        self.grants.read().contains(&(*caller, role.clone()))
    }
}
