use basket_host::{BankError, ExchangeError};
use basket_types::{Address, Amount, AssetId, MathError};
use thiserror::Error;

/// Errors from the basket ledger.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    // --- Lifecycle ---
    #[error("ledger already initialized")]
    AlreadyInitialized,

    #[error("ledger not initialized")]
    NotInitialized,

    // --- Input validation ---
    #[error("invalid token list: {0}")]
    InvalidToken(String),

    #[error("string parameter cannot be empty: {0}")]
    EmptyStringParameter(&'static str),

    #[error("owner cannot be the zero address")]
    InvalidOwner,

    #[error("deposit vector has {actual} entries, basket has {expected} assets")]
    LengthMismatch { expected: usize, actual: usize },

    // --- Authorization ---
    #[error("caller {caller} is not the ledger owner")]
    Unauthorized { caller: Address },

    // --- Liquidity state ---
    #[error("recipient cannot be the zero address")]
    InvalidRecipient,

    #[error("insufficient liquidity: {0}")]
    InsufficientLiquidity(String),

    #[error("deposit mints zero claim units")]
    InsufficientLiquidityMinted,

    #[error("reserve of {asset} is zero while claims are outstanding; resync required")]
    ReserveDesynchronized { asset: AssetId },

    #[error("deposit of {asset} not in custody: reserve would be {claimed}, custody holds {custody}")]
    UntrackedDeposit {
        asset: AssetId,
        claimed: Amount,
        custody: Amount,
    },

    #[error("claim amount {requested} exceeds supply {supply}")]
    ExceedsSupply { requested: Amount, supply: Amount },

    // --- Claim token ---
    #[error("insufficient claim balance for {holder}: needed {needed}, available {available}")]
    InsufficientClaimBalance {
        holder: Address,
        needed: Amount,
        available: Amount,
    },

    #[error("insufficient claim allowance for {spender}: needed {needed}, approved {approved}")]
    InsufficientAllowance {
        spender: Address,
        needed: Amount,
        approved: Amount,
    },

    // --- Propagated ---
    #[error("math error: {0}")]
    Math(#[from] MathError),

    #[error("bank error: {0}")]
    Bank(#[from] BankError),

    #[error("exchange error: {0}")]
    Exchange(#[from] ExchangeError),
}
