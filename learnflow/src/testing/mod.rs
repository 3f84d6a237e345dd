//! Testing utilities for learnflow pipelines.
//!
//! This module provides:
//! - A scripted generator with per-kind answers and call recording
//! - Sample records, artifacts and a fast retry policy

mod fixtures;
mod generator;

pub use fixtures::{
    fast_retry, sample_flashcards, sample_profile, sample_quiz, sample_recommendations,
    sample_script, sample_space, sample_state, sample_summary, scripted_happy_path, seeded_store,
};
pub use generator::ScriptedGenerator;
