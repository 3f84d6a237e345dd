//! Event sink system for observability.
//!
//! Pipeline, coordinator and bulk-driver lifecycle events are emitted
//! through an [`EventSink`] handed to each component at construction.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink, RecordedEvent};

use std::sync::Arc;

/// Shared handle to an event sink.
pub type SharedEventSink = Arc<dyn EventSink>;

/// Returns a sink that discards every event.
#[must_use]
pub fn noop_sink() -> SharedEventSink {
    Arc::new(NoOpEventSink)
}
