//! Observability: tracing subscriber setup.
//!
//! Library code only emits `tracing` events and spans; binaries decide
//! where they go by calling [`init_logging`] once at startup.

mod logging;

pub use logging::{build_env_filter, init_logging, LoggingConfig};
