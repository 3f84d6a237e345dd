//! Generation stages.
//!
//! Each stage reads the shared [`PipelineState`], makes one generation
//! call through the retrying invoker, persists its own column and returns
//! a [`StateUpdate`]. Failures never leave a stage: they are logged and
//! turned into an empty update.

mod audio_script;
mod common;
mod flashcards;
pub mod prompts;
mod quiz;
mod recommendation;
mod summary;

pub use audio_script::{clean_script, AudioScriptStage};
pub use common::StageDeps;
pub use flashcards::FlashcardsStage;
pub use quiz::QuizStage;
pub use recommendation::RecommendationStage;
pub use summary::SummaryStage;

use crate::context::{PipelineState, StateUpdate};
use crate::core::ArtifactKind;
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

/// A unit of work in the learning pipeline.
#[async_trait]
pub trait Stage: Send + Sync + Debug {
    /// Returns the name of the stage.
    fn name(&self) -> &str;

    /// Returns the artifact this stage produces.
    fn kind(&self) -> ArtifactKind;

    /// Runs the stage against the accumulated state.
    ///
    /// Never fails; an empty update means the stage contributed nothing.
    async fn run(&self, state: &PipelineState) -> StateUpdate;
}

/// Builds the stage that produces `kind`.
#[must_use]
pub fn stage_for(kind: ArtifactKind, deps: StageDeps) -> Arc<dyn Stage> {
    match kind {
        ArtifactKind::Summary => Arc::new(SummaryStage::new(deps)),
        ArtifactKind::Quiz => Arc::new(QuizStage::new(deps)),
        ArtifactKind::Recommendations => Arc::new(RecommendationStage::new(deps)),
        ArtifactKind::Flashcards => Arc::new(FlashcardsStage::new(deps)),
        ArtifactKind::AudioScript => Arc::new(AudioScriptStage::new(deps)),
    }
}
