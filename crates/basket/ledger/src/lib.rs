//! # basket-ledger
//!
//! Swap-agnostic accounting for one basket: an ordered asset list, a parallel
//! reserve vector, and the claim token whose units represent proportional
//! ownership of those reserves.
//!
//! ## Invariants
//!
//! - `claim_supply == Σ holder balances` at all times
//! - `reserves[i] <= custody balance of asset i`; equal right after a resync
//! - Minting credits `min_i(deposit[i] * supply / reserves[i])`, so excess in
//!   a single asset earns nothing
//! - Burning pays `reserves[i] * burned / supply` of every asset
//!
//! Only the owning controller may mint, burn, resync or sweep.

#![deny(unsafe_code)]

pub mod claim;
pub mod config;
pub mod error;
pub mod ledger;

pub use claim::ClaimToken;
pub use config::{LedgerConfig, DEFAULT_BOOTSTRAP_UNITS};
pub use error::LedgerError;
pub use ledger::{BasketLedger, BurnReceipt, LedgerSnapshot};
