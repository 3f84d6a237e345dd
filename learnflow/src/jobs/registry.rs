//! Per-owner registry of in-flight bulk runs.

use super::CancellationToken;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

const SUPERSEDED: &str = "superseded by a newer request";

/// Tracks the cancellation handles of each owner's bulk runs.
///
/// All mutations go through one mutex, so a concurrent register and
/// cancel for the same owner never lose an update. The registry is
/// in-memory only; a restart forgets every handle.
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: Mutex<HashMap<String, Vec<Arc<CancellationToken>>>>,
}

impl JobRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a fresh handle and appends it to the owner's active list.
    ///
    /// Handles that are already cancelled are pruned first.
    pub fn register(&self, owner_id: &str) -> Arc<CancellationToken> {
        let token = Arc::new(CancellationToken::new());
        let mut jobs = self.jobs.lock();
        let active = jobs.entry(owner_id.to_string()).or_default();
        active.retain(|existing| !existing.is_cancelled());
        active.push(token.clone());
        debug!(owner_id, token = %token.id(), active = active.len(), "Registered bulk job");
        token
    }

    /// Cancels every handle registered for the owner and clears the list.
    ///
    /// Returns the number of handles that were cancelled by this call.
    pub fn cancel_all(&self, owner_id: &str) -> usize {
        let Some(active) = self.jobs.lock().remove(owner_id) else {
            return 0;
        };
        let cancelled = active
            .iter()
            .filter(|token| token.cancel(SUPERSEDED))
            .count();
        if cancelled > 0 {
            info!(owner_id, cancelled, "Cancelled running bulk jobs");
        }
        cancelled
    }

    /// Removes one handle once its run has finished.
    ///
    /// Returns false if the handle was no longer registered.
    pub fn release(&self, owner_id: &str, token: &CancellationToken) -> bool {
        let mut jobs = self.jobs.lock();
        let Some(active) = jobs.get_mut(owner_id) else {
            return false;
        };
        let before = active.len();
        active.retain(|existing| existing.id() != token.id());
        let removed = active.len() != before;
        if active.is_empty() {
            jobs.remove(owner_id);
        }
        removed
    }

    /// Number of handles currently registered for the owner.
    #[must_use]
    pub fn active_count(&self, owner_id: &str) -> usize {
        self.jobs.lock().get(owner_id).map_or(0, Vec::len)
    }
}
