use std::sync::atomic::{AtomicBool, Ordering};

use tracing::warn;

use crate::error::ControllerError;

/// Per-instance mutual exclusion for state-mutating entry points.
///
/// Acquisition never blocks: if the guard is already held, including by the
/// current call stack, [`ReentrancyGuard::enter`] fails immediately.
#[derive(Debug, Default)]
pub struct ReentrancyGuard {
    entered: AtomicBool,
}

/// Holds the guard until dropped. Release happens on every exit path.
#[derive(Debug)]
pub struct GuardToken<'a> {
    guard: &'a ReentrancyGuard,
}

impl ReentrancyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&self) -> Result<GuardToken<'_>, ControllerError> {
        if self
            .entered
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Reentrant call rejected");
            return Err(ControllerError::ReentrantCall);
        }
        Ok(GuardToken { guard: self })
    }

    pub fn is_entered(&self) -> bool {
        self.entered.load(Ordering::Acquire)
    }
}

impl Drop for GuardToken<'_> {
    fn drop(&mut self) {
        self.guard.entered.store(false, Ordering::Release);
    }
}
