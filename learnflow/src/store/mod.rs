//! Record store interface and adapters.
//!
//! The store is keyed by space id. Writes are partial: a stage only ever
//! sends its own column, so re-running a stage overwrites exactly that
//! slot. Unknown columns are dropped with a warning instead of failing
//! the write.

mod memory;
#[cfg(feature = "remote")]
mod rest;

pub use memory::{MemoryStore, StoreSnapshot};
#[cfg(feature = "remote")]
pub use rest::{RestStore, RestStoreConfig};

use crate::core::{LearningSpace, SpaceStatus, StudentProfile};
use crate::errors::StoreError;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

/// Partial column update for a learning space.
pub type SpaceFields = serde_json::Map<String, serde_json::Value>;

/// Shared handle to a record store.
pub type SharedStore = Arc<dyn RecordStore>;

/// Columns a learning space update may touch.
pub const VALID_COLUMNS: [&str; 11] = [
    "summary_notes",
    "audio_script",
    "recommendations",
    "quiz",
    "audio_overview",
    "updated_at",
    "language",
    "status",
    "pdf_source",
    "audio_source",
    "flashcards",
];

/// Persistence collaborator used by the coordinator and the stages.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Loads a learning space.
    async fn get_space(&self, space_id: &str) -> Result<Option<LearningSpace>, StoreError>;

    /// Loads a user's profile.
    async fn get_profile(&self, user_id: &str) -> Result<Option<StudentProfile>, StoreError>;

    /// Applies a partial update. Returns `Ok(false)` when nothing was written.
    async fn update_space(&self, space_id: &str, fields: SpaceFields) -> Result<bool, StoreError>;

    /// Lists the ids of a user's learning spaces.
    async fn list_space_ids(&self, user_id: &str) -> Result<Vec<String>, StoreError>;
}

/// Keeps only allow-listed columns, warning about the rest.
#[must_use]
pub fn sanitize_fields(space_id: &str, fields: SpaceFields) -> SpaceFields {
    fields
        .into_iter()
        .filter(|(column, _)| {
            let known = VALID_COLUMNS.contains(&column.as_str());
            if !known {
                warn!(space_id, column = %column, "Skipping unknown column for learning_space update");
            }
            known
        })
        .collect()
}

/// Builds a single-column update.
#[must_use]
pub fn single_field(column: &str, value: serde_json::Value) -> SpaceFields {
    let mut fields = SpaceFields::new();
    fields.insert(column.to_string(), value);
    fields
}

/// Builds a status update.
#[must_use]
pub fn status_fields(status: SpaceStatus) -> SpaceFields {
    single_field("status", serde_json::Value::String(status.as_str().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sanitize_drops_unknown_columns() {
        let mut fields = SpaceFields::new();
        fields.insert("quiz".to_string(), json!({"questions": []}));
        fields.insert("podcast_script".to_string(), json!("text"));

        let clean = sanitize_fields("s1", fields);

        assert_eq!(clean.len(), 1);
        assert!(clean.contains_key("quiz"));
    }

    #[test]
    fn test_status_fields() {
        let fields = status_fields(SpaceStatus::Generating);
        assert_eq!(fields.get("status"), Some(&json!("generating")));
    }
}
