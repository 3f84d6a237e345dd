//! Quiz stage.

use super::{Stage, StageDeps};
use crate::context::{PipelineState, StateUpdate};
use crate::core::{ArtifactKind, Quiz};
use async_trait::async_trait;
use tracing::{error, info};

/// Generates a multiple-choice quiz from the summary notes.
#[derive(Debug, Clone)]
pub struct QuizStage {
    deps: StageDeps,
}

impl QuizStage {
    /// Creates the stage.
    #[must_use]
    pub fn new(deps: StageDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl Stage for QuizStage {
    fn name(&self) -> &str {
        "quiz"
    }

    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Quiz
    }

    async fn run(&self, state: &PipelineState) -> StateUpdate {
        let text = StageDeps::summary_or_topic(state, self.name());
        let inputs = StageDeps::inputs(state, text);
        info!(space_id = %state.space_id, language = %inputs.language, "Generating quiz");

        match self.deps.produce::<Quiz>(self.kind(), inputs).await {
            Ok(value) => {
                self.deps
                    .persist(&state.space_id, self.kind(), value.clone())
                    .await;
                StateUpdate::artifact(self.kind(), value)
            }
            Err(e) => {
                error!(space_id = %state.space_id, error = %e, "Failed to generate quiz");
                StateUpdate::empty()
            }
        }
    }
}
