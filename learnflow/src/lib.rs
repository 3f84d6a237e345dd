//! # Learnflow
//!
//! Generates learning artifacts for a topic by running a fixed pipeline of
//! generation stages over a shared state.
//!
//! Learnflow provides:
//!
//! - **Stage pipeline**: summary, quiz, recommendations, flashcards and an
//!   audio script, each building on what earlier stages produced
//! - **Failure absorption**: a stage that fails contributes nothing while
//!   the rest of the run carries on
//! - **Rate-limit retries**: exponential backoff with jitter, with a fast
//!   exit when the quota is zero
//! - **Run coordination**: per-target status transitions and duplicate-run
//!   refusal
//! - **Job control**: newer requests cancel an owner's in-flight bulk
//!   regeneration
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use learnflow::prelude::*;
//!
//! let deps = StageDeps::new(generator, store);
//! let coordinator = RunCoordinator::new(deps);
//!
//! if let Some(state) = coordinator.run_once("space-id", "owner-id", Some("hindi")).await {
//!     println!("quiz generated: {}", state.quiz.is_some());
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod audio;
pub mod config;
pub mod context;
pub mod coordinator;
pub mod core;
pub mod errors;
pub mod events;
pub mod generator;
pub mod jobs;
pub mod observability;
pub mod pipeline;
pub mod stages;
pub mod store;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::audio::{AudioOutcome, AudioService, SpeechRenderer};
    pub use crate::config::AppConfig;
    pub use crate::context::{LearnerProfile, PipelineState, RunIdentity, StateUpdate};
    pub use crate::coordinator::{RunCoordinator, SingleStageOutcome};
    pub use crate::core::{ArtifactKind, LearningSpace, SpaceStatus, StudentProfile, SummaryRef};
    pub use crate::errors::{ErrorClass, GenerationError, LearnflowError, StoreError};
    pub use crate::events::{EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::generator::{GenerationRequest, Generator};
    pub use crate::jobs::{BulkConfig, BulkReport, CancellationToken, Dispatcher, JobRegistry};
    pub use crate::observability::init_logging;
    pub use crate::pipeline::{LearningPipeline, PipelineRun, RetryConfig};
    pub use crate::stages::{Stage, StageDeps};
    pub use crate::store::{MemoryStore, RecordStore};
}
