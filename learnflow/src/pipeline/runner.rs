//! The fixed, linear learning pipeline.

use super::failure::{FailureSummary, StageOutcome, StageRecord};
use crate::context::{PipelineState, RunIdentity};
use crate::core::ArtifactKind;
use crate::events::SharedEventSink;
use crate::stages::{stage_for, Stage, StageDeps};
use chrono::Utc;
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Result of one pipeline execution.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    /// Run id.
    pub run_id: Uuid,
    /// Final state after folding every stage update.
    pub state: PipelineState,
    /// One record per stage, in run order.
    pub records: Vec<StageRecord>,
}

impl PipelineRun {
    /// Returns true if any of summary, quiz or flashcards is present.
    #[must_use]
    pub fn has_content(&self) -> bool {
        self.state.has_content()
    }

    /// Counts completed and absorbed stages.
    #[must_use]
    pub fn failure_summary(&self) -> FailureSummary {
        FailureSummary::from_records(&self.records)
    }

    /// Consumes the run, returning the final state.
    #[must_use]
    pub fn into_state(self) -> PipelineState {
        self.state
    }
}

/// An ordered list of stages folded over one shared state.
///
/// Stages run strictly in sequence. A stage that contributes nothing is
/// recorded as absorbed and the run continues; the pipeline never stops
/// early.
#[derive(Clone)]
pub struct LearningPipeline {
    stages: Vec<Arc<dyn Stage>>,
    events: SharedEventSink,
}

impl fmt::Debug for LearningPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LearningPipeline")
            .field("stages", &self.stage_names())
            .finish_non_exhaustive()
    }
}

impl LearningPipeline {
    /// Builds summary, quiz, recommendation, flashcards and audio script, in that order.
    #[must_use]
    pub fn standard(deps: StageDeps) -> Self {
        let events = deps.events.clone();
        let stages = ArtifactKind::PIPELINE_ORDER
            .iter()
            .map(|kind| stage_for(*kind, deps.clone()))
            .collect();
        Self { stages, events }
    }

    /// Builds a pipeline from an explicit stage list.
    #[must_use]
    pub fn from_stages(stages: Vec<Arc<dyn Stage>>, events: SharedEventSink) -> Self {
        Self { stages, events }
    }

    /// Returns the stage names in run order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Runs every stage under a fresh run identity.
    pub async fn run(&self, initial: PipelineState) -> PipelineRun {
        let identity = RunIdentity::new(initial.space_id.clone());
        self.run_as(&identity, initial).await
    }

    /// Runs every stage, tagging events with `identity`.
    pub async fn run_as(&self, identity: &RunIdentity, initial: PipelineState) -> PipelineRun {
        let run_id = identity.run_id;
        let mut state = initial;
        let mut records = Vec::with_capacity(self.stages.len());

        self.events.try_emit(
            "pipeline.started",
            Some(json!({
                "run_id": run_id,
                "space_id": &state.space_id,
                "stages": self.stage_names(),
            })),
        );

        for stage in &self.stages {
            let name = stage.name();
            let started_at = Utc::now();
            self.events
                .try_emit("stage.started", Some(json!({ "run_id": run_id, "stage": name })));

            let update = stage.run(&state).await;

            let outcome = if update.is_empty() {
                warn!(space_id = %state.space_id, stage = name, "Stage contributed nothing, continuing");
                StageOutcome::Absorbed
            } else {
                StageOutcome::Completed
            };
            let kinds = update.kinds();
            state.apply(update);

            let record = StageRecord::finished(name, outcome, started_at);
            let event = match outcome {
                StageOutcome::Completed => "stage.completed",
                StageOutcome::Absorbed => "stage.absorbed",
            };
            self.events.try_emit(
                event,
                Some(json!({
                    "run_id": run_id,
                    "stage": name,
                    "artifacts": kinds,
                    "duration_ms": record.duration_ms(),
                })),
            );
            records.push(record);
        }

        let run = PipelineRun {
            run_id,
            state,
            records,
        };
        let summary = run.failure_summary();
        info!(
            space_id = %run.state.space_id,
            completed = summary.completed_stages,
            absorbed = ?summary.absorbed,
            has_content = run.has_content(),
            "Pipeline finished"
        );
        self.events.try_emit(
            "pipeline.completed",
            Some(json!({
                "run_id": run_id,
                "space_id": &run.state.space_id,
                "completed_stages": summary.completed_stages,
                "absorbed": summary.absorbed,
                "has_content": run.has_content(),
            })),
        );
        run
    }
}
