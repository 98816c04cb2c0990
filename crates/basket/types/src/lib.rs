//! # basket-types
//!
//! Shared vocabulary for the basket liquidity accounting engine:
//!
//! - **Identifiers**: [`Address`] for accounts and contracts, [`AssetId`] for
//!   fungible assets held in reserve
//! - **Fixed-point math**: checked integer helpers; overflow is an error, never
//!   a wrap
//! - **Fees**: [`FeeConfig`] with its ceiling and [`FeeAction`] labels
//! - **Call context**: per-operation deadline and slippage tolerance
//! - **Events**: the [`BasketEvent`] stream emitted by committed operations
//! - **Roles**: capabilities checked through an injected access policy

#![deny(unsafe_code)]

pub mod address;
pub mod context;
pub mod error;
pub mod event;
pub mod fee;
pub mod math;
pub mod role;

pub use address::{Address, AssetId};
pub use context::{CallContext, MAX_SLIPPAGE_BUFFER_BPS};
pub use error::{ContextError, FeeConfigError, MathError};
pub use event::BasketEvent;
pub use fee::{FeeAction, FeeConfig, MAX_FEE_BPS};
pub use math::{Amount, Bps, BPS_DENOMINATOR};
pub use role::Role;
