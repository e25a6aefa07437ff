//! Cancellation token for job polling loops.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A shared flag that stops a polling loop between iterations.
///
/// Clones observe the same state. Cancellation is cooperative: a loop sees it
/// the next time it calls [`CancellationToken::check`].
///
/// ```
/// use rcpanel_core::CancellationToken;
///
/// let token = CancellationToken::new();
/// let watcher = token.clone();
///
/// token.cancel();
/// assert!(watcher.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// A token that has not been cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel every clone of this token.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Return [`RcError::Cancelled`](crate::RcError::Cancelled) once cancelled.
    pub fn check(&self) -> crate::Result<()> {
        if self.is_cancelled() {
            Err(crate::RcError::Cancelled)
        } else {
            Ok(())
        }
    }
}
