//! Event sinks.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{info, warn};

/// Receives lifecycle events such as `stage.started` or `bulk.cancelled`.
///
/// Emission happens inline on the run's task, so implementations must
/// return quickly and must never fail.
pub trait EventSink: Send + Sync {
    /// Records one event.
    fn try_emit(&self, event_type: &str, data: Option<Value>);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

impl EventSink for NoOpEventSink {
    fn try_emit(&self, _event_type: &str, _data: Option<Value>) {}
}

/// Writes events to the tracing subscriber.
///
/// Events that record lost work (`stage.absorbed`, `artifact.persist_failed`,
/// `bulk.cancelled`) are logged at warn, the rest at info.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingEventSink {
    quiet: bool,
}

impl LoggingEventSink {
    /// A sink that logs every event.
    #[must_use]
    pub fn info() -> Self {
        Self { quiet: false }
    }

    /// A sink that only logs events recording lost work.
    #[must_use]
    pub fn warnings_only() -> Self {
        Self { quiet: true }
    }

    fn is_loss(event_type: &str) -> bool {
        matches!(
            event_type,
            "stage.absorbed" | "artifact.persist_failed" | "bulk.cancelled"
        )
    }
}

impl EventSink for LoggingEventSink {
    fn try_emit(&self, event_type: &str, data: Option<Value>) {
        let payload = data.map(|d| d.to_string()).unwrap_or_default();
        if Self::is_loss(event_type) {
            warn!(event_type, data = %payload, "learnflow event");
        } else if !self.quiet {
            info!(event_type, data = %payload, "learnflow event");
        }
    }
}

/// An event captured by [`CollectingEventSink`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEvent {
    /// Event type, e.g. `stage.completed`.
    pub event_type: String,
    /// Event payload.
    pub data: Option<Value>,
    /// When the event was received.
    pub at: DateTime<Utc>,
}

/// Keeps every event in memory, for tests and local inspection.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: Mutex<Vec<RecordedEvent>>,
}

impl CollectingEventSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All events in emission order.
    #[must_use]
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().clone()
    }

    /// Number of events received.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Returns true if nothing was received.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Event types in emission order.
    #[must_use]
    pub fn event_types(&self) -> Vec<String> {
        self.events.lock().iter().map(|e| e.event_type.clone()).collect()
    }

    /// Events whose type starts with `prefix`.
    #[must_use]
    pub fn events_of_type(&self, prefix: &str) -> Vec<RecordedEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.event_type.starts_with(prefix))
            .cloned()
            .collect()
    }
}

impl EventSink for CollectingEventSink {
    fn try_emit(&self, event_type: &str, data: Option<Value>) {
        self.events.lock().push(RecordedEvent {
            event_type: event_type.to_string(),
            data,
            at: Utc::now(),
        });
    }
}
