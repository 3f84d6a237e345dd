//! Core domain model types for learnflow.
//!
//! This module contains the fundamental types used throughout the crate:
//! - Space status and artifact kind enums
//! - Typed artifacts and the summary reference
//! - Persisted space and profile records

mod artifact;
mod records;
mod status;

pub use artifact::{
    Flashcard, FlashcardList, PodcastContent, Question, QuestionOptions, Quiz, Recommendation,
    RecommendationList, SummaryNote, SummaryRef,
};
pub use records::{LearningSpace, StudentProfile};
pub use status::{ArtifactKind, SpaceStatus};
