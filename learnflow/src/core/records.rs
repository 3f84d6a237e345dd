//! Persisted records read by the pipeline.

use super::SpaceStatus;
use serde::{Deserialize, Deserializer, Serialize};

fn default_topic() -> String {
    "Untitled".to_string()
}

fn default_grade_level() -> String {
    "general".to_string()
}

// Hosted rows carry explicit nulls for columns nobody has set yet.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_default_topic<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_topic))
}

fn null_as_default_grade_level<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_grade_level))
}

/// A learning space: the target a pipeline run generates artifacts for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningSpace {
    /// Opaque space id.
    pub id: String,
    /// Owning user.
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_id: String,
    /// Topic text entered by the user.
    #[serde(default = "default_topic", deserialize_with = "null_as_default_topic")]
    pub topic: String,
    /// Optional source file URL.
    #[serde(default)]
    pub pdf_source: Option<String>,
    /// Language stored on the space.
    #[serde(default)]
    pub language: Option<String>,
    /// Generation status.
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: SpaceStatus,
    /// Summary notes (structured note, JSON string or plain text).
    #[serde(default)]
    pub summary_notes: Option<serde_json::Value>,
    /// Quiz artifact.
    #[serde(default)]
    pub quiz: Option<serde_json::Value>,
    /// Flashcard artifact.
    #[serde(default)]
    pub flashcards: Option<serde_json::Value>,
    /// Recommendation artifact.
    #[serde(default)]
    pub recommendations: Option<serde_json::Value>,
    /// Audio narration script.
    #[serde(default)]
    pub audio_script: Option<String>,
    /// Public URL of the rendered audio.
    #[serde(default)]
    pub audio_overview: Option<String>,
}

impl LearningSpace {
    /// Creates a space with a topic and nothing generated yet.
    #[must_use]
    pub fn new(id: impl Into<String>, user_id: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            topic: topic.into(),
            pdf_source: None,
            language: None,
            status: SpaceStatus::Normal,
            summary_notes: None,
            quiz: None,
            flashcards: None,
            recommendations: None,
            audio_script: None,
            audio_overview: None,
        }
    }

    /// Sets the source file URL.
    #[must_use]
    pub fn with_pdf_source(mut self, url: impl Into<String>) -> Self {
        self.pdf_source = Some(url.into());
        self
    }

    /// Sets the stored language.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Sets the status.
    #[must_use]
    pub fn with_status(mut self, status: SpaceStatus) -> Self {
        self.status = status;
        self
    }

    /// Returns true if stored summary notes are present and non-empty.
    #[must_use]
    pub fn has_summary(&self) -> bool {
        match &self.summary_notes {
            None | Some(serde_json::Value::Null) => false,
            Some(serde_json::Value::String(s)) => !s.trim().is_empty(),
            Some(_) => true,
        }
    }
}

/// Per-user preferences that shape every prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentProfile {
    /// Owning user.
    pub user_id: String,
    /// Preferred language.
    #[serde(default)]
    pub language: Option<String>,
    /// Class or grade level.
    #[serde(
        default = "default_grade_level",
        deserialize_with = "null_as_default_grade_level"
    )]
    pub grade_level: String,
    /// Gender / pronoun preference.
    #[serde(default, deserialize_with = "null_as_default")]
    pub gender: String,
}

impl StudentProfile {
    /// Creates a profile with default preferences.
    #[must_use]
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            language: None,
            grade_level: default_grade_level(),
            gender: String::new(),
        }
    }

    /// Sets the preferred language.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Sets the grade level.
    #[must_use]
    pub fn with_grade_level(mut self, grade_level: impl Into<String>) -> Self {
        self.grade_level = grade_level.into();
        self
    }

    /// Sets the gender preference.
    #[must_use]
    pub fn with_gender(mut self, gender: impl Into<String>) -> Self {
        self.gender = gender.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_space_defaults_from_sparse_row() {
        let space: LearningSpace = serde_json::from_value(json!({"id": "s1"})).unwrap();
        assert_eq!(space.topic, "Untitled");
        assert_eq!(space.status, SpaceStatus::Normal);
        assert!(space.quiz.is_none());
    }

    #[test]
    fn test_space_has_summary() {
        let mut space = LearningSpace::new("s1", "u1", "Cells");
        assert!(!space.has_summary());

        space.summary_notes = Some(json!(""));
        assert!(!space.has_summary());

        space.summary_notes = Some(json!({"title": "T", "summary": "S"}));
        assert!(space.has_summary());
    }

    #[test]
    fn test_profile_defaults() {
        let profile: StudentProfile = serde_json::from_value(json!({"user_id": "u1"})).unwrap();
        assert_eq!(profile.grade_level, "general");
        assert_eq!(profile.gender, "");
        assert!(profile.language.is_none());
    }

    #[test]
    fn test_null_columns_decode_as_defaults() {
        let space: LearningSpace = serde_json::from_value(json!({
            "id": "s1",
            "user_id": null,
            "topic": null,
            "status": null,
            "language": null,
        }))
        .unwrap();
        assert_eq!(space.topic, "Untitled");
        assert_eq!(space.status, SpaceStatus::Normal);
        assert_eq!(space.user_id, "");
        assert!(space.language.is_none());

        let profile: StudentProfile = serde_json::from_value(json!({
            "user_id": "u1",
            "grade_level": null,
            "gender": null,
        }))
        .unwrap();
        assert_eq!(profile.grade_level, "general");
        assert_eq!(profile.gender, "");
    }

    #[test]
    fn test_explicit_status_still_decodes() {
        let space: LearningSpace =
            serde_json::from_value(json!({"id": "s1", "topic": "Cells", "status": "generating"}))
                .unwrap();
        assert_eq!(space.topic, "Cells");
        assert_eq!(space.status, SpaceStatus::Generating);
    }
}
