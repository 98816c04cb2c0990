use std::collections::BTreeMap;

use basket_types::math::{checked_add, checked_sub};
use basket_types::{Address, Amount};

use crate::error::LedgerError;

/// The fungible claim token of one basket.
///
/// Supply changes only through [`ClaimToken::mint`] and [`ClaimToken::burn`];
/// transfers move units between holders without changing it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClaimToken {
    total_supply: Amount,
    balances: BTreeMap<Address, Amount>,
    allowances: BTreeMap<Address, BTreeMap<Address, Amount>>,
}

impl ClaimToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    pub fn balance_of(&self, holder: &Address) -> Amount {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(owner)
            .and_then(|spenders| spenders.get(spender))
            .copied()
            .unwrap_or(0)
    }

    /// Holders with a non-zero balance, in address order.
    pub fn holders(&self) -> Vec<(Address, Amount)> {
        self.balances
            .iter()
            .filter(|(_, amount)| **amount > 0)
            .map(|(holder, amount)| (*holder, *amount))
            .collect()
    }

    pub(crate) fn mint(&mut self, to: &Address, amount: Amount) -> Result<(), LedgerError> {
        if to.is_zero() {
            return Err(LedgerError::InvalidRecipient);
        }
        let supply = checked_add(self.total_supply, amount)?;
        let balance = checked_add(self.balance_of(to), amount)?;
        self.total_supply = supply;
        self.balances.insert(*to, balance);
        Ok(())
    }

    pub(crate) fn burn(&mut self, from: &Address, amount: Amount) -> Result<(), LedgerError> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(LedgerError::InsufficientClaimBalance {
                holder: *from,
                needed: amount,
                available,
            });
        }
        let supply = checked_sub(self.total_supply, amount)?;
        self.total_supply = supply;
        self.set_balance(from, available - amount);
        Ok(())
    }

    pub fn transfer(&mut self, from: &Address, to: &Address, amount: Amount) -> Result<(), LedgerError> {
        if to.is_zero() {
            return Err(LedgerError::InvalidRecipient);
        }
        let available = self.balance_of(from);
        if available < amount {
            return Err(LedgerError::InsufficientClaimBalance {
                holder: *from,
                needed: amount,
                available,
            });
        }
        if from == to {
            return Ok(());
        }
        let credited = checked_add(self.balance_of(to), amount)?;
        self.set_balance(from, available - amount);
        self.balances.insert(*to, credited);
        Ok(())
    }

    pub fn approve(&mut self, owner: &Address, spender: &Address, amount: Amount) -> Result<(), LedgerError> {
        if spender.is_zero() {
            return Err(LedgerError::InvalidRecipient);
        }
        self.allowances
            .entry(*owner)
            .or_default()
            .insert(*spender, amount);
        Ok(())
    }

    /// Move `amount` from `from` to `to` on behalf of `spender`.
    ///
    /// An allowance of `Amount::MAX` is treated as unlimited and never
    /// decremented.
    pub fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let approved = self.allowance(from, spender);
        if approved < amount {
            return Err(LedgerError::InsufficientAllowance {
                spender: *spender,
                needed: amount,
                approved,
            });
        }
        self.transfer(from, to, amount)?;
        if approved != Amount::MAX {
            self.allowances
                .entry(*from)
                .or_default()
                .insert(*spender, approved - amount);
        }
        Ok(())
    }

    fn set_balance(&mut self, holder: &Address, amount: Amount) {
        if amount == 0 {
            self.balances.remove(holder);
        } else {
            self.balances.insert(*holder, amount);
        }
    }
}
