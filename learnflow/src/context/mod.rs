//! Per-run context for pipeline execution.
//!
//! This module provides:
//! - The run identity used for correlation in logs and events
//! - The shared state bag threaded through the stages
//! - Partial state updates returned by stages

mod identity;
mod state;

pub use identity::RunIdentity;
pub use state::{LearnerProfile, PipelineState, StateUpdate, UserPrompt};
