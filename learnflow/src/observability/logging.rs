//! Subscriber installation for binaries and tests.

use crate::errors::LearnflowError;
use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn default_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Level or filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_level")]
    pub level: String,
    /// Output format: `text` or `json`.
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_format(),
        }
    }
}

impl LoggingConfig {
    /// Sets the level.
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }
}

/// Builds the filter: `RUST_LOG` wins, the configured level is the fallback.
pub fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter, LearnflowError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level)
        .map_err(|e| LearnflowError::InvalidConfig(format!("log level {:?}: {e}", config.level)))
}

/// Installs the global subscriber.
///
/// Calling this more than once is harmless; later calls leave the first
/// subscriber in place.
pub fn init_logging(config: &LoggingConfig) -> Result<(), LearnflowError> {
    let filter = build_env_filter(config)?;
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match config.format.as_str() {
        "json" => registry
            .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
            .try_init(),
        "text" => registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init(),
        other => {
            return Err(LearnflowError::InvalidConfig(format!(
                "log format must be text or json, got {other:?}"
            )))
        }
    };

    if installed.is_err() {
        tracing::debug!("Global subscriber already installed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_unknown_format() {
        let config = LoggingConfig::default().with_format("xml");
        assert!(matches!(
            init_logging(&config),
            Err(LearnflowError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_init_twice_is_ok() {
        let config = LoggingConfig::default().with_level("warn");
        assert!(init_logging(&config).is_ok());
        assert!(init_logging(&config).is_ok());
    }
}
