use std::collections::{BTreeSet, HashMap};

use basket_types::{Address, Amount, AssetId};
use parking_lot::RwLock;
use tracing::debug;

use crate::error::BankError;

/// Custody of fungible tokens for every listed asset.
///
/// Stands in for the host environment's token contracts. Implementations must
/// apply a transfer entirely or not at all.
pub trait TokenBank: Send + Sync {
    /// Whether the asset resolves to a deployed token.
    fn is_listed(&self, asset: &AssetId) -> bool;

    /// Current balance of `holder` in `asset`. Unlisted assets report zero.
    fn balance_of(&self, asset: &AssetId, holder: &Address) -> Amount;

    /// Move `amount` of `asset` from `from` to `to`.
    fn transfer(
        &self,
        asset: &AssetId,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), BankError>;
}

#[derive(Default)]
struct BankState {
    listed: BTreeSet<AssetId>,
    balances: HashMap<(AssetId, Address), Amount>,
}

/// In-memory token bank.
pub struct InMemoryBank {
    state: RwLock<BankState>,
}

impl InMemoryBank {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(BankState::default()),
        }
    }

    /// List a new asset. Listing twice is a no-op.
    pub fn list_asset(&self, asset: AssetId) {
        debug!(asset = %asset, "Listing asset");
        self.state.write().listed.insert(asset);
    }

    /// Create `amount` of `asset` out of thin air for `to`.
    pub fn mint(&self, asset: &AssetId, to: &Address, amount: Amount) -> Result<(), BankError> {
        if to.is_zero() {
            return Err(BankError::ZeroAddress);
        }
        let mut state = self.state.write();
        if !state.listed.contains(asset) {
            return Err(BankError::UnlistedAsset(asset.clone()));
        }
        let balance = state.balances.entry((asset.clone(), *to)).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| BankError::Overflow {
                asset: asset.clone(),
            })?;
        Ok(())
    }

    /// Every listed asset, in sorted order.
    pub fn listed_assets(&self) -> Vec<AssetId> {
        self.state.read().listed.iter().cloned().collect()
    }
}

impl Default for InMemoryBank {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenBank for InMemoryBank {
    fn is_listed(&self, asset: &AssetId) -> bool {
        self.state.read().listed.contains(asset)
    }

    fn balance_of(&self, asset: &AssetId, holder: &Address) -> Amount {
        self.state
            .read()
            .balances
            .get(&(asset.clone(), *holder))
            .copied()
            .unwrap_or(0)
    }

    fn transfer(
        &self,
        asset: &AssetId,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), BankError> {
        if from.is_zero() || to.is_zero() {
            return Err(BankError::ZeroAddress);
        }
        let mut state = self.state.write();
        if !state.listed.contains(asset) {
            return Err(BankError::UnlistedAsset(asset.clone()));
        }
        if amount == 0 || from == to {
            return Ok(());
        }

        let from_key = (asset.clone(), *from);
        let to_key = (asset.clone(), *to);
        let available = state.balances.get(&from_key).copied().unwrap_or(0);
        if available < amount {
            return Err(BankError::InsufficientBalance {
                asset: asset.clone(),
                holder: *from,
                needed: amount,
                available,
            });
        }
        let receiver = state.balances.get(&to_key).copied().unwrap_or(0);
        let credited = receiver
            .checked_add(amount)
            .ok_or_else(|| BankError::Overflow {
                asset: asset.clone(),
            })?;

        state.balances.insert(from_key, available - amount);
        state.balances.insert(to_key, credited);
        Ok(())
    }
}
