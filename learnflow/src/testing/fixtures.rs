//! Sample records, artifacts and policies for tests.

use super::ScriptedGenerator;
use crate::context::{LearnerProfile, PipelineState, UserPrompt};
use crate::core::{ArtifactKind, LearningSpace, StudentProfile};
use crate::pipeline::RetryConfig;
use crate::store::MemoryStore;
use serde_json::{json, Value};
use std::sync::Arc;

/// A retry policy with millisecond delays and two retries.
#[must_use]
pub fn fast_retry() -> RetryConfig {
    RetryConfig::default()
        .with_max_retries(2)
        .with_initial_delay_ms(1)
        .with_max_delay_ms(5)
        .with_jitter_ratio(0.0)
}

/// A blank state for `topic` with default learner preferences.
#[must_use]
pub fn sample_state(space_id: &str, topic: &str) -> PipelineState {
    PipelineState::new(
        space_id,
        LearnerProfile::default(),
        UserPrompt {
            topic: topic.to_string(),
            file_url: None,
        },
    )
}

/// A space owned by `owner_id` with nothing generated yet.
#[must_use]
pub fn sample_space(space_id: &str, owner_id: &str) -> LearningSpace {
    LearningSpace::new(space_id, owner_id, "Photosynthesis")
}

/// A profile for `owner_id` in `language`.
#[must_use]
pub fn sample_profile(owner_id: &str, language: &str) -> StudentProfile {
    StudentProfile::new(owner_id)
        .with_language(language)
        .with_grade_level("8")
}

/// A store holding one space and its owner's profile.
#[must_use]
pub fn seeded_store(space_id: &str, owner_id: &str) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.insert_space(sample_space(space_id, owner_id));
    store.insert_profile(sample_profile(owner_id, "english"));
    store
}

/// A valid summary note.
#[must_use]
pub fn sample_summary() -> Value {
    json!({
        "title": "Photosynthesis",
        "summary": "## Photosynthesis\nPlants turn light, water and carbon dioxide into sugar."
    })
}

/// A valid one-question quiz.
#[must_use]
pub fn sample_quiz() -> Value {
    json!({
        "title": "Photosynthesis Quiz",
        "questions": [{
            "question": "What gas do plants absorb?",
            "options": {"A": "Oxygen", "B": "Carbon dioxide", "C": "Nitrogen", "D": "Helium"},
            "correctAnswer": "B",
            "hint": "Animals breathe it out.",
            "explanation": "Plants take in carbon dioxide and release oxygen."
        }]
    })
}

/// A valid recommendation list.
#[must_use]
pub fn sample_recommendations() -> Value {
    json!({
        "recommendations": [{
            "title": "Photosynthesis explained",
            "description": "A short video walkthrough.",
            "url": "NULL"
        }]
    })
}

/// A valid two-card deck.
#[must_use]
pub fn sample_flashcards() -> Value {
    json!({
        "flashcards": [
            {"front": "Chlorophyll", "back": "The green pigment that absorbs light."},
            {"front": "Stomata", "back": "Pores that let gases in and out."}
        ]
    })
}

/// A valid narration script.
#[must_use]
pub fn sample_script() -> Value {
    json!({
        "topic": "Photosynthesis",
        "script": "**Welcome!** Today we learn how plants make food."
    })
}

/// A generator that answers every kind with a valid artifact.
#[must_use]
pub fn scripted_happy_path() -> ScriptedGenerator {
    ScriptedGenerator::new()
        .respond(ArtifactKind::Summary, sample_summary())
        .respond(ArtifactKind::Quiz, sample_quiz())
        .respond(ArtifactKind::Recommendations, sample_recommendations())
        .respond(ArtifactKind::Flashcards, sample_flashcards())
        .respond(ArtifactKind::AudioScript, sample_script())
}
