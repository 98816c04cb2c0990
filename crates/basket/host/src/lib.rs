//! # basket-host
//!
//! The collaborators a basket runs against, expressed as traits, together with
//! in-memory reference implementations used by tests and the scenario runner.
//!
//! - [`TokenBank`]: fungible-token custody for every listed asset
//! - [`BankTransaction`]: journals transfers so a failed operation reverts
//!   every token movement it made
//! - [`Exchange`]: quotes and executes swaps; [`FixedRateExchange`] settles at
//!   configured prices out of its own inventory
//! - [`Clock`]: wall/chain time used for deadline checks
//! - [`EventSink`]: receives events of committed operations
//! - [`AccessPolicy`]: answers role checks; [`RoleRegistry`] stores grants

#![deny(unsafe_code)]

pub mod access;
pub mod bank;
pub mod clock;
pub mod error;
pub mod events;
pub mod exchange;
pub mod transaction;

pub use access::{AccessPolicy, RoleRegistry};
pub use bank::{InMemoryBank, TokenBank};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{BankError, ExchangeError};
pub use events::{EventSink, MemoryEventLog};
pub use exchange::{Exchange, FixedRateExchange, SwapHook, SwapRequest};
pub use transaction::{BankTransaction, TransferRecord};
