//! Flashcard stage.

use super::{Stage, StageDeps};
use crate::context::{PipelineState, StateUpdate};
use crate::core::{ArtifactKind, FlashcardList};
use async_trait::async_trait;
use tracing::{error, info};

/// Generates an active-recall flashcard deck.
#[derive(Debug, Clone)]
pub struct FlashcardsStage {
    deps: StageDeps,
}

impl FlashcardsStage {
    /// Creates the stage.
    #[must_use]
    pub fn new(deps: StageDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl Stage for FlashcardsStage {
    fn name(&self) -> &str {
        "flashcards"
    }

    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Flashcards
    }

    async fn run(&self, state: &PipelineState) -> StateUpdate {
        let text = StageDeps::summary_or_topic(state, self.name());
        let inputs = StageDeps::inputs(state, text);
        info!(space_id = %state.space_id, language = %inputs.language, "Generating flashcards");

        match self.deps.produce::<FlashcardList>(self.kind(), inputs).await {
            Ok(value) => {
                self.deps
                    .persist(&state.space_id, self.kind(), value.clone())
                    .await;
                StateUpdate::artifact(self.kind(), value)
            }
            Err(e) => {
                error!(space_id = %state.space_id, error = %e, "Failed to generate flashcards");
                StateUpdate::empty()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::testing::{fast_retry, sample_flashcards, sample_state, ScriptedGenerator};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_flashcards_use_profile_language() {
        let generator = Arc::new(
            ScriptedGenerator::new().respond(ArtifactKind::Flashcards, sample_flashcards()),
        );
        let mut state = sample_state("s1", "Cells");
        state.profile.language = "Tamil".to_string();

        let update = FlashcardsStage::new(
            StageDeps::new(generator.clone(), Arc::new(MemoryStore::new())).with_retry(fast_retry()),
        )
        .run(&state)
        .await;

        assert!(update.flashcards.is_some());
        assert_eq!(
            generator.last_request(ArtifactKind::Flashcards).unwrap().inputs.language,
            "Tamil"
        );
    }
}
