//! Per-stage outcomes and the run's failure summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a stage finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageOutcome {
    /// The stage contributed its artifact.
    Completed,
    /// The stage failed and contributed nothing.
    Absorbed,
}

impl fmt::Display for StageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Absorbed => write!(f, "absorbed"),
        }
    }
}

/// Record of one stage execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRecord {
    /// Stage name.
    pub name: String,
    /// How the stage finished.
    pub outcome: StageOutcome,
    /// When the stage started.
    pub started_at: DateTime<Utc>,
    /// When the stage ended.
    pub ended_at: DateTime<Utc>,
}

impl StageRecord {
    /// Creates a record ending now.
    #[must_use]
    pub fn finished(name: impl Into<String>, outcome: StageOutcome, started_at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            outcome,
            started_at,
            ended_at: Utc::now(),
        }
    }

    /// Returns the duration in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> i64 {
        (self.ended_at - self.started_at).num_milliseconds()
    }

    /// Returns true if the stage contributed its artifact.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.outcome == StageOutcome::Completed
    }
}

/// Counts of completed and absorbed stages in one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureSummary {
    /// Total number of stages.
    pub total_stages: usize,
    /// Number of completed stages.
    pub completed_stages: usize,
    /// Names of the absorbed stages, in run order.
    pub absorbed: Vec<String>,
}

impl FailureSummary {
    /// Builds a summary from stage records.
    #[must_use]
    pub fn from_records(records: &[StageRecord]) -> Self {
        Self {
            total_stages: records.len(),
            completed_stages: records.iter().filter(|r| r.is_completed()).count(),
            absorbed: records
                .iter()
                .filter(|r| !r.is_completed())
                .map(|r| r.name.clone())
                .collect(),
        }
    }

    /// Returns the success rate.
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        if self.total_stages == 0 {
            return 0.0;
        }
        self.completed_stages as f64 / self.total_stages as f64
    }

    /// Returns true if any stage was absorbed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.absorbed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_from_records() {
        let now = Utc::now();
        let records = vec![
            StageRecord::finished("summary", StageOutcome::Completed, now),
            StageRecord::finished("quiz", StageOutcome::Absorbed, now),
            StageRecord::finished("flashcards", StageOutcome::Completed, now),
        ];

        let summary = FailureSummary::from_records(&records);

        assert_eq!(summary.total_stages, 3);
        assert_eq!(summary.completed_stages, 2);
        assert_eq!(summary.absorbed, vec!["quiz".to_string()]);
        assert!(summary.has_failures());
        assert!((summary.success_rate() - 2.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_summary() {
        let summary = FailureSummary::from_records(&[]);
        assert!(!summary.has_failures());
        assert!(summary.success_rate().abs() < f64::EPSILON);
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(StageOutcome::Absorbed.to_string(), "absorbed");
    }
}
