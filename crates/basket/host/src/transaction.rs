use basket_types::{Address, Amount, AssetId};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::bank::TokenBank;
use crate::error::BankError;

/// One applied transfer, kept so it can be reversed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub asset: AssetId,
    pub from: Address,
    pub to: Address,
    pub amount: Amount,
}

/// A journaled sequence of token movements that commits as a unit.
///
/// Transfers are applied to the bank immediately, so later steps observe them.
/// If the transaction is dropped without [`BankTransaction::commit`], every
/// journaled transfer is reversed newest-first, restoring the balances the
/// operation started from.
pub struct BankTransaction<'a> {
    bank: &'a dyn TokenBank,
    journal: Vec<TransferRecord>,
    committed: bool,
}

impl<'a> BankTransaction<'a> {
    pub fn begin(bank: &'a dyn TokenBank) -> Self {
        Self {
            bank,
            journal: Vec::new(),
            committed: false,
        }
    }

    /// The underlying bank, for reads.
    pub fn bank(&self) -> &'a dyn TokenBank {
        self.bank
    }

    pub fn balance_of(&self, asset: &AssetId, holder: &Address) -> Amount {
        self.bank.balance_of(asset, holder)
    }

    /// Apply a transfer and journal it. Zero amounts are skipped.
    pub fn transfer(
        &mut self,
        asset: &AssetId,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), BankError> {
        if amount == 0 {
            return Ok(());
        }
        self.bank.transfer(asset, from, to, amount)?;
        self.journal.push(TransferRecord {
            asset: asset.clone(),
            from: *from,
            to: *to,
            amount,
        });
        Ok(())
    }

    /// Transfers applied so far.
    pub fn journal(&self) -> &[TransferRecord] {
        &self.journal
    }

    /// Keep every applied transfer.
    pub fn commit(mut self) -> Vec<TransferRecord> {
        self.committed = true;
        std::mem::take(&mut self.journal)
    }

    /// Reverse every applied transfer now.
    pub fn rollback(mut self) {
        self.revert();
        self.committed = true;
    }

    fn revert(&mut self) {
        if self.journal.is_empty() {
            return;
        }
        debug!(transfers = self.journal.len(), "Reverting bank transaction");
        while let Some(record) = self.journal.pop() {
            if let Err(e) = self
                .bank
                .transfer(&record.asset, &record.to, &record.from, record.amount)
            {
                error!(
                    asset = %record.asset,
                    from = %record.to,
                    to = %record.from,
                    amount = record.amount,
                    error = %e,
                    "Compensating transfer failed"
                );
            }
        }
    }
}

impl Drop for BankTransaction<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.revert();
        }
    }
}
