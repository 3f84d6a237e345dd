//! Job control: cancellation handles, the per-owner registry, the bulk
//! driver and the trigger surface built on them.

mod bulk;
mod dispatcher;
mod registry;
mod token;

pub use bulk::{BulkConfig, BulkRegenerator, BulkReport, TargetRunner};
pub use dispatcher::{BulkJob, Dispatcher};
pub use registry::JobRegistry;
pub use token::CancellationToken;
