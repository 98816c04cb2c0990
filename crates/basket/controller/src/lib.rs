//! # basket-controller
//!
//! User-facing orchestration of one basket. A controller owns its ledger and
//! sequences every flow as
//! `Idle → FeeComputed → ExternalSwapInFlight → LedgerUpdated → FundsDelivered`:
//!
//! - **contribute**: take the contribution fee, split the net base amount by
//!   weight, swap each portion into its basket asset, mint claims
//! - **withdraw**: burn claims, take the withdrawal fee from every payout,
//!   deliver the remainder in kind
//! - **withdraw_eth**: burn claims, swap every payout back to the base asset,
//!   take the fee from the total
//!
//! Each flow runs inside a [`basket_host::BankTransaction`] against a staged
//! copy of the ledger. Nothing is observable until the whole flow succeeds;
//! events are published after commit.
//!
//! Every mutating entry point holds the [`ReentrancyGuard`]. A nested call
//! from inside a swap fails with [`ControllerError::ReentrantCall`].

#![deny(unsafe_code)]

pub mod controller;
pub mod error;
pub mod guard;
pub mod platform;
pub mod receipt;
pub mod weights;

pub use controller::{BasketController, ControllerDeps, ControllerInit};
pub use error::ControllerError;
pub use guard::{GuardToken, ReentrancyGuard};
pub use platform::{PlatformConfig, StaticPlatformConfig};
pub use receipt::{ContributionPreview, ContributionReceipt, EthWithdrawalReceipt, WithdrawalReceipt};
pub use weights::{split_by_weights, validate_weights};
