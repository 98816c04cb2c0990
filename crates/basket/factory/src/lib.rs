//! # basket-factory
//!
//! Creates matched controller and ledger pairs and owns the platform-wide
//! parameters every basket reads:
//!
//! - fee configuration (capped at 50 bps per action) and its collector
//! - minimum withdrawal and minimum creation amounts
//! - the base asset contributions are made in
//! - the versioned ledger implementation used for new baskets
//!
//! Creation is all-or-nothing: a basket is registered, its creator granted
//! the manager role and `BtsCreated` emitted only after the seed contribution
//! has committed.

#![deny(unsafe_code)]

pub mod error;
pub mod factory;
pub mod settings;

pub use error::{ConfigError, FactoryError};
pub use factory::{
    BasketFactory, BasketRecord, CreateBasket, CreatedBasket, FactoryDeps, ImplementationVersion,
};
pub use settings::{FactorySettings, SharedSettings, DEFAULT_BASE_ASSET};
