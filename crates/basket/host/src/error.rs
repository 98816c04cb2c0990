use basket_types::{Address, Amount, AssetId, MathError};
use thiserror::Error;

/// Errors from the token bank.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BankError {
    #[error("asset {0} is not a listed token")]
    UnlistedAsset(AssetId),

    #[error("insufficient {asset} balance for {holder}: needed {needed}, available {available}")]
    InsufficientBalance {
        asset: AssetId,
        holder: Address,
        needed: Amount,
        available: Amount,
    },

    #[error("transfer involves the zero address")]
    ZeroAddress,

    #[error("balance overflow for {asset}")]
    Overflow { asset: AssetId },
}

/// Errors from the exchange collaborator. Any of these aborts the enclosing
/// basket operation in full.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    #[error("invalid swap path: {0}")]
    InvalidPath(String),

    #[error("exchange has no price for {0}")]
    UnknownAsset(AssetId),

    #[error("insufficient output amount: got {actual}, minimum {minimum}")]
    InsufficientOutputAmount { actual: Amount, minimum: Amount },

    #[error("swap deadline expired")]
    Expired,

    #[error("exchange halted")]
    Halted,

    #[error("math error: {0}")]
    Math(#[from] MathError),

    #[error("bank error: {0}")]
    Bank(#[from] BankError),
}
