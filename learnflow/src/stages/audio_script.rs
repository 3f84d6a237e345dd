//! Audio overview script stage.

use super::{Stage, StageDeps};
use crate::context::{PipelineState, StateUpdate};
use crate::core::{ArtifactKind, PodcastContent};
use crate::errors::GenerationError;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{error, info};

/// Removes markdown emphasis and heading markers so the script reads aloud cleanly.
#[must_use]
pub fn clean_script(script: &str) -> String {
    script.replace(['*', '#'], "")
}

/// Accepts either a `PodcastContent` object or a bare script string.
fn script_from(value: Value) -> Result<String, GenerationError> {
    let script = match value {
        Value::String(text) => text,
        other => {
            serde_json::from_value::<PodcastContent>(other)
                .map_err(|e| GenerationError::malformed(ArtifactKind::AudioScript, e))?
                .script
        }
    };
    let cleaned = clean_script(&script);
    if cleaned.trim().is_empty() {
        return Err(GenerationError::malformed(ArtifactKind::AudioScript, "empty script"));
    }
    Ok(cleaned)
}

/// Writes the narration script for the audio overview.
#[derive(Debug, Clone)]
pub struct AudioScriptStage {
    deps: StageDeps,
}

impl AudioScriptStage {
    /// Creates the stage.
    #[must_use]
    pub fn new(deps: StageDeps) -> Self {
        Self { deps }
    }

    async fn generate(&self, state: &PipelineState) -> Result<String, GenerationError> {
        let text = StageDeps::summary_or_topic(state, self.name());
        let inputs = StageDeps::inputs(state, text);
        info!(space_id = %state.space_id, language = %inputs.language, "Generating audio script");
        let raw = self.deps.call(self.kind(), inputs).await?;
        script_from(raw)
    }
}

#[async_trait]
impl Stage for AudioScriptStage {
    fn name(&self) -> &str {
        "audio_script"
    }

    fn kind(&self) -> ArtifactKind {
        ArtifactKind::AudioScript
    }

    async fn run(&self, state: &PipelineState) -> StateUpdate {
        match self.generate(state).await {
            Ok(script) => {
                self.deps
                    .persist(&state.space_id, self.kind(), Value::String(script.clone()))
                    .await;
                StateUpdate {
                    podcast_script: Some(script),
                    ..StateUpdate::empty()
                }
            }
            Err(e) => {
                error!(space_id = %state.space_id, error = %e, "Failed to generate audio script");
                StateUpdate::empty()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LearningSpace;
    use crate::store::MemoryStore;
    use crate::testing::{fast_retry, sample_state, ScriptedGenerator};
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_clean_script() {
        assert_eq!(clean_script("## Intro\n**Welcome** back"), " Intro\nWelcome back");
    }

    #[test]
    fn test_script_from_accepts_both_shapes() {
        assert_eq!(
            script_from(json!({"topic": "Cells", "script": "*Hello*"})).unwrap(),
            "Hello"
        );
        assert_eq!(script_from(json!("# Hi")).unwrap(), " Hi");
        assert!(script_from(json!("**")).is_err());
        assert!(script_from(json!({"topic": "no script"})).is_err());
    }

    #[tokio::test]
    async fn test_script_persisted_cleaned() {
        let generator = Arc::new(ScriptedGenerator::new().respond(
            ArtifactKind::AudioScript,
            json!({"topic": "Cells", "script": "**Welcome** to cells"}),
        ));
        let store = Arc::new(MemoryStore::new());
        store.insert_space(LearningSpace::new("s1", "u1", "Cells"));

        let update = AudioScriptStage::new(
            StageDeps::new(generator.clone(), store.clone()).with_retry(fast_retry()),
        )
        .run(&sample_state("s1", "Cells"))
        .await;

        assert_eq!(update.podcast_script.as_deref(), Some("Welcome to cells"));
        assert_eq!(
            store.space("s1").unwrap().audio_script.as_deref(),
            Some("Welcome to cells")
        );
        let request = generator.last_request(ArtifactKind::AudioScript).unwrap();
        assert!((request.temperature - 0.2).abs() < f32::EPSILON);
    }
}
