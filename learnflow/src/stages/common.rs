//! Collaborators and helpers shared by every stage.

use crate::config::GeneratorConfig;
use crate::context::PipelineState;
use crate::core::ArtifactKind;
use crate::errors::GenerationError;
use crate::events::{noop_sink, SharedEventSink};
use crate::generator::{PromptInputs, SharedGenerator};
use crate::pipeline::{invoke_with_retry, RetryConfig};
use crate::store::{single_field, SharedStore};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;
use tracing::{debug, warn};

use super::prompts::build_request;

/// Everything a stage needs from the outside world.
#[derive(Clone)]
pub struct StageDeps {
    /// Generation capability.
    pub generator: SharedGenerator,
    /// Record store the stage persists its artifact to.
    pub store: SharedStore,
    /// Retry policy for the generation call.
    pub retry: RetryConfig,
    /// Event sink.
    pub events: SharedEventSink,
    /// Temperature for structured artifacts.
    pub temperature: f32,
    /// Temperature for the audio script.
    pub script_temperature: f32,
}

impl fmt::Debug for StageDeps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageDeps")
            .field("retry", &self.retry)
            .field("temperature", &self.temperature)
            .field("script_temperature", &self.script_temperature)
            .finish_non_exhaustive()
    }
}

impl StageDeps {
    /// Creates dependencies with the default retry policy and no event sink.
    #[must_use]
    pub fn new(generator: SharedGenerator, store: SharedStore) -> Self {
        let defaults = GeneratorConfig::default();
        Self {
            generator,
            store,
            retry: RetryConfig::default(),
            events: noop_sink(),
            temperature: defaults.temperature,
            script_temperature: defaults.script_temperature,
        }
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_events(mut self, events: SharedEventSink) -> Self {
        self.events = events;
        self
    }

    /// Takes both temperatures from generator settings.
    #[must_use]
    pub fn with_generator_config(mut self, config: &GeneratorConfig) -> Self {
        self.temperature = config.temperature;
        self.script_temperature = config.script_temperature;
        self
    }

    /// Prompt inputs for `state`, generating from `topic_summary`.
    pub(crate) fn inputs(state: &PipelineState, topic_summary: String) -> PromptInputs {
        PromptInputs {
            grade_level: state.profile.grade_level.clone(),
            language: state.profile.language.clone(),
            gender: state.profile.gender.clone(),
            topic_summary,
            file_url: None,
        }
    }

    /// The summary text downstream stages work from, falling back to the topic.
    pub(crate) fn summary_or_topic(state: &PipelineState, stage: &str) -> String {
        if state.summary.is_missing() {
            warn!(
                space_id = %state.space_id,
                stage,
                "No summary notes found, falling back to topic"
            );
        }
        state.working_text()
    }

    /// Calls the generator for `kind` through the retrying invoker.
    pub(crate) async fn call(
        &self,
        kind: ArtifactKind,
        inputs: PromptInputs,
    ) -> Result<Value, GenerationError> {
        let temperature = if kind == ArtifactKind::AudioScript {
            self.script_temperature
        } else {
            self.temperature
        };
        let request = build_request(kind, inputs, temperature);
        let request = &request;
        let generator = self.generator.as_ref();

        debug!(kind = %kind, language = %request.inputs.language, "Generating artifact");
        invoke_with_retry(&self.retry, kind.state_key(), move || generator.generate(request)).await
    }

    /// Calls the generator and checks the answer against the artifact type `T`.
    ///
    /// Returns the normalized value of `T` so that only well-formed
    /// artifacts are persisted.
    pub(crate) async fn produce<T>(
        &self,
        kind: ArtifactKind,
        inputs: PromptInputs,
    ) -> Result<Value, GenerationError>
    where
        T: DeserializeOwned + Serialize,
    {
        let raw = self.call(kind, inputs).await?;
        let typed: T =
            serde_json::from_value(raw).map_err(|e| GenerationError::malformed(kind, e))?;
        serde_json::to_value(&typed).map_err(|e| GenerationError::malformed(kind, e))
    }

    /// Writes one artifact column. Failures are logged and swallowed.
    pub(crate) async fn persist(&self, space_id: &str, kind: ArtifactKind, value: Value) {
        let column = kind.column();
        match self.store.update_space(space_id, single_field(column, value)).await {
            Ok(true) => {
                debug!(space_id, column, "Persisted artifact");
                self.events.try_emit(
                    "artifact.persisted",
                    Some(json!({ "space_id": space_id, "column": column })),
                );
            }
            Ok(false) => {
                warn!(space_id, column, "Artifact was not persisted");
            }
            Err(e) => {
                warn!(space_id, column, error = %e, "Failed to persist artifact");
                self.events.try_emit(
                    "artifact.persist_failed",
                    Some(json!({ "space_id": space_id, "column": column, "error": e.to_string() })),
                );
            }
        }
    }
}
