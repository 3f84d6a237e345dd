//! PostgREST-style adapter for the hosted record store.

use super::{sanitize_fields, RecordStore, SpaceFields};
use crate::config::StoreConfig;
use crate::core::{LearningSpace, StudentProfile};
use crate::errors::StoreError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

const SPACE_TABLE: &str = "learning_space";
const PROFILE_TABLE: &str = "student_profile";

/// Connection settings for [`RestStore`].
#[derive(Debug, Clone)]
pub struct RestStoreConfig {
    /// Project base URL, without the `/rest/v1` suffix.
    pub base_url: String,
    /// Service key sent as `apikey` and bearer token.
    pub api_key: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl RestStoreConfig {
    /// Resolves settings, reading the key from the configured environment variable.
    pub fn from_settings(settings: &StoreConfig) -> Result<Self, StoreError> {
        let base_url = settings
            .base_url
            .clone()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| StoreError::backend("store.base_url is not set"))?;
        let api_key = std::env::var(&settings.api_key_env)
            .map_err(|_| StoreError::backend(format!("set {} env var", settings.api_key_env)))?;
        Ok(Self {
            base_url,
            api_key,
            timeout: Duration::from_secs(settings.timeout_secs),
        })
    }
}

/// Record store backed by a PostgREST endpoint.
///
/// Construct it once at process start and share it; the inner HTTP client
/// pools connections.
#[derive(Clone)]
pub struct RestStore {
    config: RestStoreConfig,
    http: reqwest::Client,
}

impl RestStore {
    /// Creates a new store client.
    #[must_use]
    pub fn new(config: RestStoreConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { config, http }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.config.base_url.trim_end_matches('/'))
    }

    fn request(&self, method: reqwest::Method, table: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, self.table_url(table))
            .header("apikey", &self.config.api_key)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
    }

    async fn read_rows<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<Vec<T>, StoreError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::backend(format!("HTTP {status}: {body}")));
        }
        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn select_one<T: DeserializeOwned>(
        &self,
        table: &str,
        column: &str,
        value: &str,
    ) -> Result<Option<T>, StoreError> {
        let response = self
            .request(reqwest::Method::GET, table)
            .query(&[("select", "*".to_string()), (column, format!("eq.{value}"))])
            .send()
            .await
            .map_err(|e| StoreError::backend(e.to_string()))?;
        Ok(self.read_rows(response).await?.into_iter().next())
    }
}

#[async_trait]
impl RecordStore for RestStore {
    async fn get_space(&self, space_id: &str) -> Result<Option<LearningSpace>, StoreError> {
        self.select_one(SPACE_TABLE, "id", space_id).await
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<StudentProfile>, StoreError> {
        self.select_one(PROFILE_TABLE, "user_id", user_id).await
    }

    async fn update_space(&self, space_id: &str, fields: SpaceFields) -> Result<bool, StoreError> {
        let fields = sanitize_fields(space_id, fields);
        if fields.is_empty() {
            warn!(space_id, "No valid columns to update");
            return Ok(false);
        }

        let response = self
            .request(reqwest::Method::PATCH, SPACE_TABLE)
            .query(&[("id", format!("eq.{space_id}"))])
            .header("Prefer", "return=representation")
            .json(&fields)
            .send()
            .await
            .map_err(|e| StoreError::backend(e.to_string()))?;
        let rows: Vec<serde_json::Value> = self.read_rows(response).await?;

        debug!(space_id, columns = fields.len(), rows = rows.len(), "Updated learning space");
        Ok(!rows.is_empty())
    }

    async fn list_space_ids(&self, user_id: &str) -> Result<Vec<String>, StoreError> {
        #[derive(serde::Deserialize)]
        struct IdRow {
            id: String,
        }

        let response = self
            .request(reqwest::Method::GET, SPACE_TABLE)
            .query(&[("select", "id".to_string()), ("user_id", format!("eq.{user_id}"))])
            .send()
            .await
            .map_err(|e| StoreError::backend(e.to_string()))?;
        let rows: Vec<IdRow> = self.read_rows(response).await?;
        Ok(rows.into_iter().map(|row| row.id).collect())
    }
}
