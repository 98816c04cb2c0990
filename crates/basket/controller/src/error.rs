use basket_host::{BankError, ExchangeError};
use basket_ledger::LedgerError;
use basket_types::{Address, Amount, AssetId, Bps, ContextError, MathError};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors from controller entry points. Every variant is returned before any
/// state or balance change becomes observable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControllerError {
    // --- Preconditions ---
    #[error("contribution amount must be greater than zero")]
    ZeroContributionAmount,

    #[error("deadline {deadline} is in the past (now {now})")]
    DeadlineInPast {
        deadline: DateTime<Utc>,
        now: DateTime<Utc>,
    },

    #[error("slippage buffer {buffer} bps must be below {max} bps")]
    InvalidBuffer { buffer: Bps, max: Bps },

    #[error("withdrawal of {amount} claim units is below the minimum of {minimum}")]
    InvalidWithdrawalAmount { amount: Amount, minimum: Amount },

    #[error("invalid address: {0}")]
    InvalidAddress(Address),

    // --- Composition ---
    #[error("invalid weights: {0}")]
    InvalidWeights(String),

    #[error("asset {0} is not a listed token")]
    UnlistedAsset(AssetId),

    // --- Authorization ---
    #[error("sender {sender} may not transfer the base asset to this basket")]
    UnauthorizedSender { sender: Address },

    #[error("caller {caller} is not authorized to {action}")]
    Unauthorized { caller: Address, action: &'static str },

    #[error("reentrant call rejected")]
    ReentrantCall,

    // --- External ---
    #[error("swap into {asset} returned {received}, below the tolerated minimum {minimum}")]
    SlippageExceeded {
        asset: AssetId,
        received: Amount,
        minimum: Amount,
    },

    // --- Propagated ---
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("bank error: {0}")]
    Bank(#[from] BankError),

    #[error("exchange error: {0}")]
    Exchange(#[from] ExchangeError),

    #[error("math error: {0}")]
    Math(#[from] MathError),
}

impl From<ContextError> for ControllerError {
    fn from(err: ContextError) -> Self {
        match err {
            ContextError::DeadlineInPast { deadline, now } => Self::DeadlineInPast { deadline, now },
            ContextError::InvalidBuffer { buffer, max } => Self::InvalidBuffer { buffer, max },
            ContextError::InvalidAddress(address) => Self::InvalidAddress(address),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_errors_map_to_flat_variants() {
        let err: ControllerError = ContextError::InvalidBuffer {
            buffer: 6_000,
            max: 5_000,
        }
        .into();
        assert_eq!(
            err,
            ControllerError::InvalidBuffer {
                buffer: 6_000,
                max: 5_000
            }
        );
    }

    #[test]
    fn nested_errors_keep_their_message() {
        let err: ControllerError = ExchangeError::Halted.into();
        assert_eq!(err.to_string(), "exchange error: exchange halted");
    }
}
