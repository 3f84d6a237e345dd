//! Pipeline execution.
//!
//! This module provides:
//! - The retrying invoker used for every generation call
//! - The fixed five-stage learning pipeline
//! - Per-stage records and the run's failure summary

mod failure;
mod retry;
mod runner;


pub use failure::{FailureSummary, StageOutcome, StageRecord};
pub use retry::{
    invoke_with_retry, should_retry, RetryConfig, RetryDecision, RetryState,
};
pub use runner::{LearningPipeline, PipelineRun};
