//! Run coordination for single targets.
//!
//! The coordinator owns a target's status transitions, resolves the run
//! language and seeds the pipeline state from whatever the target already
//! stores, so a rerun continues from partial content.

mod claim;
mod language;
mod run;

pub use language::{normalize_language, resolve_language, DEFAULT_LANGUAGE};
pub use run::{RunCoordinator, SingleStageOutcome};

pub(crate) use language::first_language;
