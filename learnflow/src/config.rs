//! Application configuration.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! environment variables prefixed with `LEARNFLOW` (sections separated by
//! `__`, e.g. `LEARNFLOW__RETRY__MAX_RETRIES=3`).

use crate::errors::LearnflowError;
use crate::jobs::BulkConfig;
use crate::observability::LoggingConfig;
use crate::pipeline::RetryConfig;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

const ENV_PREFIX: &str = "LEARNFLOW";

fn default_model() -> String {
    "gemini-flash-latest".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_script_temperature() -> f32 {
    0.2
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_generator_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_generator_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_store_key_env() -> String {
    "SUPABASE_KEY".to_string()
}

fn default_store_timeout_secs() -> u64 {
    30
}

/// Settings for the hosted generation model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Model name.
    #[serde(default = "default_model")]
    pub model: String,
    /// Sampling temperature for structured artifacts.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Sampling temperature for the audio script.
    #[serde(default = "default_script_temperature")]
    pub script_temperature: f32,
    /// Per-call timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// API base URL.
    #[serde(default = "default_generator_base_url")]
    pub base_url: String,
    /// Environment variable holding the API key.
    #[serde(default = "default_generator_key_env")]
    pub api_key_env: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            script_temperature: default_script_temperature(),
            request_timeout_secs: default_request_timeout_secs(),
            base_url: default_generator_base_url(),
            api_key_env: default_generator_key_env(),
        }
    }
}

impl GeneratorConfig {
    /// Sets the model name.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the API base URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

/// Settings for the hosted record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Project base URL. Unset means no remote store is configured.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Environment variable holding the service key.
    #[serde(default = "default_store_key_env")]
    pub api_key_env: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_store_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key_env: default_store_key_env(),
            timeout_secs: default_store_timeout_secs(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Retry policy for generation calls.
    #[serde(default)]
    pub retry: RetryConfig,
    /// Bulk regeneration pacing.
    #[serde(default)]
    pub bulk: BulkConfig,
    /// Generation model settings.
    #[serde(default)]
    pub generator: GeneratorConfig,
    /// Record store settings.
    #[serde(default)]
    pub store: StoreConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Loads configuration from defaults, an optional file and the environment.
    ///
    /// A missing file is an error only when a path was given explicitly.
    pub fn load(path: Option<&Path>) -> Result<Self, LearnflowError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }
        let settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Parses configuration from TOML text, without consulting the environment.
    pub fn from_toml(text: &str) -> Result<Self, LearnflowError> {
        let settings = Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Renders the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, LearnflowError> {
        toml::to_string_pretty(self).map_err(|e| LearnflowError::InvalidConfig(e.to_string()))
    }

    /// Replaces the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Replaces the bulk pacing.
    #[must_use]
    pub fn with_bulk(mut self, bulk: BulkConfig) -> Self {
        self.bulk = bulk;
        self
    }

    /// Replaces the logging settings.
    #[must_use]
    pub fn with_logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = logging;
        self
    }
}
