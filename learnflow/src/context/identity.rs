//! Run identity for tracking pipeline executions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies one pipeline run for one learning space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunIdentity {
    /// The unique ID for this run.
    pub run_id: Uuid,
    /// The learning space being generated.
    pub space_id: String,
    /// The requesting user, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    /// When the run was created.
    pub started_at: DateTime<Utc>,
}

impl RunIdentity {
    /// Creates a new run identity with a generated run ID.
    #[must_use]
    pub fn new(space_id: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            space_id: space_id.into(),
            owner_id: None,
            started_at: Utc::now(),
        }
    }

    /// Sets the requesting user.
    #[must_use]
    pub fn with_owner(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_ids_are_unique() {
        let a = RunIdentity::new("s1");
        let b = RunIdentity::new("s1");
        assert_ne!(a.run_id, b.run_id);
        assert_eq!(a.space_id, "s1");
    }

    #[test]
    fn test_with_owner() {
        let id = RunIdentity::new("s1").with_owner("u1");
        assert_eq!(id.owner_id.as_deref(), Some("u1"));
    }
}
