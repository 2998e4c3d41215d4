use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::foundation::error::{ChatReelError, ChatReelResult};

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// New, not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Cancellation plus an optional deadline, checked between units of work and while waiting on
/// external processes.
#[derive(Clone, Debug, Default)]
pub struct JobControl {
    /// Caller-owned cancellation flag.
    pub cancel: CancelToken,
    /// Instant after which the job is abandoned.
    pub deadline: Option<Instant>,
}

impl JobControl {
    /// Control with a deadline `timeout` from now.
    pub fn with_timeout(cancel: CancelToken, timeout: Option<Duration>) -> Self {
        Self {
            cancel,
            deadline: timeout.map(|t| Instant::now() + t),
        }
    }

    /// `Err(Cancelled)` once cancelled or past the deadline.
    pub fn check(&self, stage: &str) -> ChatReelResult<()> {
        if self.cancel.is_cancelled() {
            return Err(ChatReelError::cancelled(format!("{stage}: cancelled by caller")));
        }
        if let Some(deadline) = self.deadline
            && Instant::now() >= deadline
        {
            return Err(ChatReelError::cancelled(format!("{stage}: deadline exceeded")));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/cancel.rs"]
mod tests;
