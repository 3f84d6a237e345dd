//! Cancellation handle shared between a bulk run and the job registry.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

/// A one-way cancellation flag.
///
/// Once cancelled a token stays cancelled; a new run gets a new token.
/// Only the first cancellation reason is kept.
pub struct CancellationToken {
    id: Uuid,
    cancelled: AtomicBool,
    reason: RwLock<Option<String>>,
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            cancelled: AtomicBool::new(false),
            reason: RwLock::new(None),
        }
    }
}

impl CancellationToken {
    /// Creates a fresh, uncancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Unique id of this token.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Requests cancellation. Returns true if this call flipped the flag.
    pub fn cancel(&self, reason: impl Into<String>) -> bool {
        let flipped = self
            .cancelled
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if flipped {
            *self.reason.write() = Some(reason.into());
        }
        flipped
    }

    /// Returns whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Returns the cancellation reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        self.reason.read().clone()
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("id", &self.id)
            .field("cancelled", &self.is_cancelled())
            .field("reason", &self.reason())
            .finish()
    }
}
