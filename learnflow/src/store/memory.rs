//! In-process record store, optionally backed by a JSON file.

use super::{sanitize_fields, RecordStore, SpaceFields};
use crate::core::{LearningSpace, StudentProfile};
use crate::errors::StoreError;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// On-disk layout of a [`MemoryStore`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// Learning space rows.
    #[serde(default)]
    pub learning_space: Vec<LearningSpace>,
    /// Student profile rows.
    #[serde(default)]
    pub student_profile: Vec<StudentProfile>,
}

/// A thread-safe in-memory record store.
///
/// Spaces are kept ordered by id so listings are deterministic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    spaces: RwLock<BTreeMap<String, LearningSpace>>,
    profiles: RwLock<BTreeMap<String, StudentProfile>>,
    writes: RwLock<Vec<(String, Vec<String>)>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store from a snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let store = Self::new();
        for space in snapshot.learning_space {
            store.insert_space(space);
        }
        for profile in snapshot.student_profile {
            store.insert_profile(profile);
        }
        store
    }

    /// Loads a store from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let snapshot: StoreSnapshot = serde_json::from_str(&raw)?;
        info!(
            path = %path.display(),
            spaces = snapshot.learning_space.len(),
            profiles = snapshot.student_profile.len(),
            "Loaded record store"
        );
        Ok(Self::from_snapshot(snapshot))
    }

    /// Writes the store to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let raw = serde_json::to_string_pretty(&self.snapshot())?;
        std::fs::write(path, raw)?;
        Ok(())
    }

    /// Returns a copy of every row.
    #[must_use]
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            learning_space: self.spaces.read().values().cloned().collect(),
            student_profile: self.profiles.read().values().cloned().collect(),
        }
    }

    /// Inserts or replaces a space.
    pub fn insert_space(&self, space: LearningSpace) {
        self.spaces.write().insert(space.id.clone(), space);
    }

    /// Inserts or replaces a profile.
    pub fn insert_profile(&self, profile: StudentProfile) {
        self.profiles.write().insert(profile.user_id.clone(), profile);
    }

    /// Returns a copy of a space without going through the async trait.
    #[must_use]
    pub fn space(&self, space_id: &str) -> Option<LearningSpace> {
        self.spaces.read().get(space_id).cloned()
    }

    /// Returns every successful write as `(space_id, columns)`, in order.
    #[must_use]
    pub fn writes(&self) -> Vec<(String, Vec<String>)> {
        self.writes.read().clone()
    }

    /// Returns the columns written for one space, in order.
    #[must_use]
    pub fn columns_written(&self, space_id: &str) -> Vec<String> {
        self.writes
            .read()
            .iter()
            .filter(|(id, _)| id == space_id)
            .flat_map(|(_, columns)| columns.iter().cloned())
            .collect()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get_space(&self, space_id: &str) -> Result<Option<LearningSpace>, StoreError> {
        Ok(self.space(space_id))
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<StudentProfile>, StoreError> {
        Ok(self.profiles.read().get(user_id).cloned())
    }

    async fn update_space(&self, space_id: &str, fields: SpaceFields) -> Result<bool, StoreError> {
        let fields = sanitize_fields(space_id, fields);
        if fields.is_empty() {
            warn!(space_id, "No valid columns to update");
            return Ok(false);
        }

        let mut spaces = self.spaces.write();
        let Some(space) = spaces.get_mut(space_id) else {
            warn!(space_id, "Update for unknown learning space");
            return Ok(false);
        };

        let mut row = serde_json::to_value(&*space)?;
        if let Some(object) = row.as_object_mut() {
            for (column, value) in &fields {
                object.insert(column.clone(), value.clone());
            }
        }
        *space = serde_json::from_value(row)?;
        drop(spaces);

        let columns: Vec<String> = fields.keys().cloned().collect();
        debug!(space_id, columns = ?columns, "Updated learning space");
        self.writes.write().push((space_id.to_string(), columns));
        Ok(true)
    }

    async fn list_space_ids(&self, user_id: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .spaces
            .read()
            .values()
            .filter(|space| space.user_id == user_id)
            .map(|space| space.id.clone())
            .collect())
    }
}
