//! Learning resource recommendation stage.

use super::{Stage, StageDeps};
use crate::context::{PipelineState, StateUpdate};
use crate::core::{ArtifactKind, RecommendationList};
use async_trait::async_trait;
use tracing::{error, info};

/// Recommends books, lectures and articles for the topic.
#[derive(Debug, Clone)]
pub struct RecommendationStage {
    deps: StageDeps,
}

impl RecommendationStage {
    /// Creates the stage.
    #[must_use]
    pub fn new(deps: StageDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl Stage for RecommendationStage {
    fn name(&self) -> &str {
        "recommendation"
    }

    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Recommendations
    }

    async fn run(&self, state: &PipelineState) -> StateUpdate {
        let text = StageDeps::summary_or_topic(state, self.name());
        let inputs = StageDeps::inputs(state, text);
        info!(space_id = %state.space_id, language = %inputs.language, "Generating recommendations");

        match self.deps.produce::<RecommendationList>(self.kind(), inputs).await {
            Ok(value) => {
                self.deps
                    .persist(&state.space_id, self.kind(), value.clone())
                    .await;
                StateUpdate::artifact(self.kind(), value)
            }
            Err(e) => {
                error!(space_id = %state.space_id, error = %e, "Failed to generate recommendations");
                StateUpdate::empty()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::testing::{fast_retry, sample_state, ScriptedGenerator};
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_missing_url_defaults_to_empty() {
        let generator = Arc::new(ScriptedGenerator::new().respond(
            ArtifactKind::Recommendations,
            json!({"recommendations": [{"title": "Campbell Biology"}]}),
        ));
        let stage = RecommendationStage::new(
            StageDeps::new(generator, Arc::new(MemoryStore::new())).with_retry(fast_retry()),
        );

        let update = stage.run(&sample_state("s1", "Cells")).await;

        assert_eq!(
            update.recommendations,
            Some(json!({"recommendations": [{"title": "Campbell Biology", "description": "", "url": ""}]}))
        );
    }
}
