use thiserror::Error;

use crate::address::Address;
use crate::math::Bps;

/// Fixed-point arithmetic failures. Always fatal for the enclosing call.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathError {
    #[error("arithmetic overflow")]
    Overflow,

    #[error("arithmetic underflow")]
    Underflow,

    #[error("division by zero")]
    DivisionByZero,
}

/// Rejections of a fee configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeeConfigError {
    #[error("{field} of {value} bps exceeds the ceiling of {ceiling} bps")]
    FeeAboveCeiling {
        field: &'static str,
        value: Bps,
        ceiling: Bps,
    },

    #[error("fee collector cannot be the zero address")]
    ZeroCollector,
}

/// Rejections of a per-call context.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    #[error("deadline {deadline} is in the past (now {now})")]
    DeadlineInPast {
        deadline: chrono::DateTime<chrono::Utc>,
        now: chrono::DateTime<chrono::Utc>,
    },

    #[error("slippage buffer {buffer} bps must be below {max} bps")]
    InvalidBuffer { buffer: Bps, max: Bps },

    #[error("invalid address: {0}")]
    InvalidAddress(Address),
}
