//! Generation capability used by the stages.
//!
//! A [`Generator`] turns a prompt into a JSON value. Structured kinds are
//! expected to come back as an object matching the kind's artifact type;
//! the audio script may come back as a bare string.

#[cfg(feature = "remote")]
mod gemini;

#[cfg(feature = "remote")]
pub use gemini::GeminiGenerator;

use crate::core::ArtifactKind;
use crate::errors::GenerationError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Learner and topic values substituted into a prompt.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PromptInputs {
    /// Class or grade level.
    pub grade_level: String,
    /// Output language.
    pub language: String,
    /// Gender / pronoun preference.
    pub gender: String,
    /// Topic or summary text the artifact is generated from.
    pub topic_summary: String,
    /// Optional source file attached to the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
}

/// One call to the generation capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Artifact being generated.
    pub kind: ArtifactKind,
    /// System instruction.
    pub system_prompt: String,
    /// User message.
    pub user_prompt: String,
    /// Values the prompts were rendered from.
    pub inputs: PromptInputs,
    /// Sampling temperature.
    pub temperature: f32,
}

/// Produces artifacts from prompts.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generates one artifact.
    async fn generate(&self, request: &GenerationRequest)
        -> Result<serde_json::Value, GenerationError>;
}

/// Shared handle to a generator.
pub type SharedGenerator = Arc<dyn Generator>;
