//! Sequential multi-target regeneration with cooperative cancellation.

use super::CancellationToken;
use crate::coordinator::RunCoordinator;
use crate::events::{noop_sink, SharedEventSink};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

fn default_inter_target_delay_ms() -> u64 {
    5000
}

fn default_poll_interval_ms() -> u64 {
    1000
}

/// Pacing of a bulk run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkConfig {
    /// Pause between two targets, to stay under external rate limits.
    #[serde(default = "default_inter_target_delay_ms")]
    pub inter_target_delay_ms: u64,
    /// How often the pause checks for cancellation.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            inter_target_delay_ms: default_inter_target_delay_ms(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl BulkConfig {
    /// Sets the pause between targets.
    #[must_use]
    pub fn with_inter_target_delay(mut self, delay: Duration) -> Self {
        self.inter_target_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Sets the cancellation poll interval. Zero is raised to one millisecond.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX).max(1);
        self
    }

    /// Pause between targets.
    #[must_use]
    pub fn inter_target_delay(&self) -> Duration {
        Duration::from_millis(self.inter_target_delay_ms)
    }

    /// Cancellation poll interval.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

/// Runs the pipeline for one target of a bulk run.
#[async_trait]
pub trait TargetRunner: Send + Sync {
    /// Runs one target. Returns true if the run produced content.
    async fn run_target(&self, space_id: &str, owner_id: &str, language: Option<&str>) -> bool;
}

#[async_trait]
impl TargetRunner for RunCoordinator {
    async fn run_target(&self, space_id: &str, owner_id: &str, language: Option<&str>) -> bool {
        self.run_once(space_id, owner_id, language)
            .await
            .is_some_and(|state| state.has_content())
    }
}

/// What a bulk run got through.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkReport {
    /// Number of targets the run was given.
    pub total: usize,
    /// Targets that were started, in order.
    pub processed: Vec<String>,
    /// Started targets whose run produced content.
    pub succeeded: usize,
    /// Index of the first target left untouched because of cancellation.
    pub cancelled_at: Option<usize>,
}

impl BulkReport {
    /// Returns true if the run stopped early.
    #[must_use]
    pub fn was_cancelled(&self) -> bool {
        self.cancelled_at.is_some()
    }
}

/// Drives targets one after another under a single cancellation handle.
///
/// The handle is checked before each target and on every poll interval of
/// the pause between targets. A target already started is allowed to
/// finish; the next one is never started once the handle is cancelled.
pub struct BulkRegenerator {
    runner: Arc<dyn TargetRunner>,
    token: Arc<CancellationToken>,
    config: BulkConfig,
    events: SharedEventSink,
}

impl BulkRegenerator {
    /// Creates a bulk driver bound to `token`.
    #[must_use]
    pub fn new(runner: Arc<dyn TargetRunner>, token: Arc<CancellationToken>, config: BulkConfig) -> Self {
        Self {
            runner,
            token,
            config,
            events: noop_sink(),
        }
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_events(mut self, events: SharedEventSink) -> Self {
        self.events = events;
        self
    }

    /// The handle this run obeys.
    #[must_use]
    pub fn token(&self) -> &Arc<CancellationToken> {
        &self.token
    }

    /// Processes `targets` in order until done or cancelled.
    pub async fn run(&self, owner_id: &str, language: Option<&str>, targets: &[String]) -> BulkReport {
        let total = targets.len();
        let mut report = BulkReport {
            total,
            ..BulkReport::default()
        };
        info!(owner_id, total, "Starting bulk regeneration");

        for (index, space_id) in targets.iter().enumerate() {
            if self.token.is_cancelled() {
                self.cancelled(owner_id, index, &mut report);
                return report;
            }

            info!(owner_id, space_id = %space_id, position = index + 1, total, "Regenerating space");
            report.processed.push(space_id.clone());
            if self.runner.run_target(space_id, owner_id, language).await {
                report.succeeded += 1;
            } else {
                error!(owner_id, space_id = %space_id, "Space produced no content");
            }

            if index + 1 < total && !self.pause().await {
                self.cancelled(owner_id, index + 1, &mut report);
                return report;
            }
        }

        info!(owner_id, total, succeeded = report.succeeded, "Finished bulk regeneration");
        self.events.try_emit(
            "bulk.completed",
            Some(json!({ "owner_id": owner_id, "total": total, "succeeded": report.succeeded })),
        );
        report
    }

    /// Waits out the inter-target delay in poll-sized steps.
    ///
    /// Returns false as soon as the handle is found cancelled.
    async fn pause(&self) -> bool {
        let delay = self.config.inter_target_delay();
        let step = self.config.poll_interval();
        let mut waited = Duration::ZERO;
        while waited < delay {
            if self.token.is_cancelled() {
                return false;
            }
            let chunk = step.min(delay - waited);
            tokio::time::sleep(chunk).await;
            waited += chunk;
        }
        !self.token.is_cancelled()
    }

    fn cancelled(&self, owner_id: &str, index: usize, report: &mut BulkReport) {
        info!(
            owner_id,
            position = index + 1,
            total = report.total,
            reason = ?self.token.reason(),
            "Bulk regeneration cancelled"
        );
        report.cancelled_at = Some(index);
        self.events.try_emit(
            "bulk.cancelled",
            Some(json!({ "owner_id": owner_id, "cancelled_at": index, "total": report.total })),
        );
    }
}
