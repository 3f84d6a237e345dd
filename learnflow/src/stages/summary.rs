//! Summary notes stage.

use super::{Stage, StageDeps};
use crate::context::{PipelineState, StateUpdate};
use crate::core::{ArtifactKind, SummaryNote, SummaryRef};
use async_trait::async_trait;
use tracing::{error, info};

/// Generates summary notes from the topic and the optional source file.
#[derive(Debug, Clone)]
pub struct SummaryStage {
    deps: StageDeps,
}

impl SummaryStage {
    /// Creates the stage.
    #[must_use]
    pub fn new(deps: StageDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl Stage for SummaryStage {
    fn name(&self) -> &str {
        "summary"
    }

    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Summary
    }

    async fn run(&self, state: &PipelineState) -> StateUpdate {
        let mut inputs = StageDeps::inputs(state, state.prompt.topic.clone());
        inputs.file_url = state.prompt.file_url().map(str::to_string);
        info!(
            space_id = %state.space_id,
            language = %inputs.language,
            has_file = inputs.file_url.is_some(),
            "Generating summary notes"
        );

        match self.deps.produce::<SummaryNote>(self.kind(), inputs).await {
            Ok(value) if SummaryRef::from_value(&value).is_missing() => {
                error!(space_id = %state.space_id, "Generated summary notes have an empty summary");
                StateUpdate::empty()
            }
            Ok(value) => {
                self.deps
                    .persist(&state.space_id, self.kind(), value.clone())
                    .await;
                StateUpdate::artifact(self.kind(), value)
            }
            Err(e) => {
                error!(space_id = %state.space_id, error = %e, "Failed to generate summary notes");
                StateUpdate::empty()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LearningSpace, SummaryRef};
    use crate::errors::GenerationError;
    use crate::testing::{fast_retry, sample_state, ScriptedGenerator};
    use crate::store::MemoryStore;
    use serde_json::json;
    use std::sync::Arc;

    fn deps(generator: Arc<ScriptedGenerator>, store: Arc<MemoryStore>) -> StageDeps {
        StageDeps::new(generator, store).with_retry(fast_retry())
    }

    #[tokio::test]
    async fn test_summary_persists_and_updates_state() {
        let generator = Arc::new(
            ScriptedGenerator::new()
                .respond(ArtifactKind::Summary, json!({"title": "Cells", "summary": "Cells are units."})),
        );
        let store = Arc::new(MemoryStore::new());
        store.insert_space(LearningSpace::new("s1", "u1", "Cells"));

        let update = SummaryStage::new(deps(generator.clone(), store.clone()))
            .run(&sample_state("s1", "Cells"))
            .await;

        assert!(matches!(update.summary, Some(SummaryRef::Structured(_))));
        assert_eq!(store.columns_written("s1"), vec!["summary_notes".to_string()]);
        assert_eq!(generator.calls(ArtifactKind::Summary), 1);
    }

    #[tokio::test]
    async fn test_summary_sends_file_url() {
        let generator = Arc::new(
            ScriptedGenerator::new()
                .respond(ArtifactKind::Summary, json!({"title": "T", "summary": "S"})),
        );
        let store = Arc::new(MemoryStore::new());
        let mut state = sample_state("s1", "Cells");
        state.prompt.file_url = Some("https://files.example.com/cells.pdf".to_string());

        SummaryStage::new(deps(generator.clone(), store)).run(&state).await;

        let request = generator.last_request(ArtifactKind::Summary).unwrap();
        assert_eq!(
            request.inputs.file_url.as_deref(),
            Some("https://files.example.com/cells.pdf")
        );
        assert_eq!(request.inputs.topic_summary, "Cells");
    }

    #[tokio::test]
    async fn test_malformed_summary_is_absorbed() {
        let generator = Arc::new(
            ScriptedGenerator::new().respond(ArtifactKind::Summary, json!({"headline": "no body"})),
        );
        let store = Arc::new(MemoryStore::new());
        store.insert_space(LearningSpace::new("s1", "u1", "Cells"));

        let update = SummaryStage::new(deps(generator, store.clone()))
            .run(&sample_state("s1", "Cells"))
            .await;

        assert!(update.is_empty());
        assert!(store.writes().is_empty());
    }

    #[tokio::test]
    async fn test_empty_summary_is_absorbed_and_keeps_seeded_notes() {
        let generator = Arc::new(
            ScriptedGenerator::new().respond(ArtifactKind::Summary, json!({"title": "Cells", "summary": "  "})),
        );
        let store = Arc::new(MemoryStore::new());
        store.insert_space(LearningSpace::new("s1", "u1", "Cells"));
        let mut state = sample_state("s1", "Cells");
        state.summary = SummaryRef::Raw("Cells are units.".to_string());

        let update = SummaryStage::new(deps(generator, store.clone())).run(&state).await;

        assert!(update.is_empty());
        assert!(store.writes().is_empty());
        state.apply(update);
        assert_eq!(state.summary, SummaryRef::Raw("Cells are units.".to_string()));
    }

    #[tokio::test]
    async fn test_persist_failure_still_returns_artifact() {
        let generator = Arc::new(
            ScriptedGenerator::new()
                .respond(ArtifactKind::Summary, json!({"title": "T", "summary": "S"})),
        );
        let mut store = crate::store::MockRecordStore::new();
        store
            .expect_update_space()
            .returning(|_, _| Err(crate::errors::StoreError::backend("down")));

        let update = SummaryStage::new(StageDeps::new(generator, Arc::new(store)).with_retry(fast_retry()))
            .run(&sample_state("s1", "Cells"))
            .await;

        assert!(update.summary.is_some());
    }

    #[tokio::test]
    async fn test_generation_error_is_absorbed() {
        let generator = Arc::new(
            ScriptedGenerator::new().fail(ArtifactKind::Summary, GenerationError::new("boom")),
        );
        let update = SummaryStage::new(deps(generator.clone(), Arc::new(MemoryStore::new())))
            .run(&sample_state("s1", "Cells"))
            .await;

        assert!(update.is_empty());
        assert_eq!(generator.calls(ArtifactKind::Summary), 1);
    }
}
