use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ContextError;
use crate::math::Bps;

/// Slippage buffers must stay strictly below 50%.
pub const MAX_SLIPPAGE_BUFFER_BPS: Bps = 5_000;

/// Per-operation parameters supplied by the caller. Never persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    /// The operation aborts if the entry time is later than this
    pub deadline: DateTime<Utc>,
    /// Tolerated shortfall of swap output against the quote
    pub slippage_buffer_bps: Bps,
}

impl CallContext {
    pub fn new(deadline: DateTime<Utc>, slippage_buffer_bps: Bps) -> Self {
        Self {
            deadline,
            slippage_buffer_bps,
        }
    }

    /// Evaluated once, at call entry.
    pub fn ensure_not_expired(&self, now: DateTime<Utc>) -> Result<(), ContextError> {
        if now > self.deadline {
            return Err(ContextError::DeadlineInPast {
                deadline: self.deadline,
                now,
            });
        }
        Ok(())
    }

    pub fn ensure_valid_buffer(&self) -> Result<(), ContextError> {
        if self.slippage_buffer_bps >= MAX_SLIPPAGE_BUFFER_BPS {
            return Err(ContextError::InvalidBuffer {
                buffer: self.slippage_buffer_bps,
                max: MAX_SLIPPAGE_BUFFER_BPS,
            });
        }
        Ok(())
    }
}
