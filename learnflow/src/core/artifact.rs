//! Typed artifacts produced by the generation stages.
//!
//! Every structured stage deserializes the generator's JSON into one of
//! these types before it is persisted, so a malformed answer fails the
//! stage instead of landing in the store.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Summary notes for a topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryNote {
    /// Title of the note.
    #[serde(default)]
    pub title: String,
    /// Markdown summary body.
    pub summary: String,
}

/// The four options of a multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOptions {
    /// Option A.
    #[serde(rename = "A")]
    pub a: String,
    /// Option B.
    #[serde(rename = "B")]
    pub b: String,
    /// Option C.
    #[serde(rename = "C")]
    pub c: String,
    /// Option D.
    #[serde(rename = "D")]
    pub d: String,
}

/// One quiz question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Question text.
    pub question: String,
    /// Answer options.
    pub options: QuestionOptions,
    /// One of `A`, `B`, `C` or `D`.
    #[serde(rename = "correctAnswer")]
    pub correct_answer: String,
    /// Hint shown before answering.
    #[serde(default)]
    pub hint: String,
    /// Why the correct answer is correct.
    #[serde(default)]
    pub explanation: String,
}

/// A multiple-choice quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    /// Quiz title.
    #[serde(default)]
    pub title: String,
    /// Questions in order.
    pub questions: Vec<Question>,
}

/// A single learning resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Resource title.
    pub title: String,
    /// Why the resource is useful.
    #[serde(default)]
    pub description: String,
    /// Source URL, or `NULL` when the model has none.
    #[serde(default)]
    pub url: String,
}

/// Recommended resources for a topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationList {
    /// Recommended resources.
    pub recommendations: Vec<Recommendation>,
}

/// One flashcard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    /// Prompt side.
    pub front: String,
    /// Answer side.
    pub back: String,
}

/// A flashcard deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashcardList {
    /// Cards in the deck.
    pub flashcards: Vec<Flashcard>,
}

/// Audio overview script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodcastContent {
    /// Topic narrated.
    #[serde(default)]
    pub topic: String,
    /// Narration text.
    pub script: String,
}

/// Reference to the summary a downstream stage works from.
///
/// Stored summaries arrive as structured JSON, as a JSON string, or as
/// plain prose. Resolving them once into this enum keeps every stage
/// free of shape probing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SummaryRef {
    /// No usable summary.
    #[default]
    Missing,
    /// Plain summary text.
    Raw(String),
    /// A structured summary note.
    Structured(SummaryNote),
}

impl SummaryRef {
    /// Resolves a stored or in-flight summary value.
    ///
    /// JSON-looking strings that cannot be decoded into a note resolve to
    /// [`SummaryRef::Missing`] so callers fall back to the topic.
    #[must_use]
    pub fn from_value(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Missing,
            serde_json::Value::String(text) => Self::from_text(text),
            serde_json::Value::Object(_) => Self::from_object(value),
            other => Self::Raw(other.to_string()),
        }
    }

    /// Resolves summary text that may itself be encoded JSON.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Self::Missing;
        }
        if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
            return Self::Raw(text.to_string());
        }
        match serde_json::from_str::<serde_json::Value>(trimmed) {
            Ok(parsed @ serde_json::Value::Object(_)) => Self::from_object(&parsed),
            Ok(_) => {
                warn!("Stored summary is a JSON array, ignoring it");
                Self::Missing
            }
            Err(e) => {
                warn!(error = %e, "Stored summary is unparsable JSON, ignoring it");
                Self::Missing
            }
        }
    }

    fn from_object(value: &serde_json::Value) -> Self {
        match serde_json::from_value::<SummaryNote>(value.clone()) {
            Ok(note) if !note.summary.trim().is_empty() => Self::Structured(note),
            Ok(_) => Self::Missing,
            Err(e) => {
                warn!(error = %e, "Stored summary object has no summary field");
                Self::Missing
            }
        }
    }

    /// Returns true if no usable summary is present.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Returns the text a downstream stage should work from.
    ///
    /// Never fails: anything unusable degrades to `topic`.
    #[must_use]
    pub fn working_text(&self, topic: &str) -> String {
        match self {
            Self::Structured(note) => note.summary.clone(),
            Self::Raw(text) => text.clone(),
            Self::Missing => topic.to_string(),
        }
    }

    /// Converts back into a storable value.
    #[must_use]
    pub fn to_value(&self) -> serde_json::Value {
        match self {
            Self::Missing => serde_json::Value::Null,
            Self::Raw(text) => serde_json::Value::String(text.clone()),
            Self::Structured(note) => serde_json::to_value(note).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_quiz_deserializes_camel_case_answer() {
        let quiz: Quiz = serde_json::from_value(json!({
            "title": "Cells",
            "questions": [{
                "question": "Powerhouse of the cell?",
                "options": {"A": "Nucleus", "B": "Mitochondria", "C": "Ribosome", "D": "Wall"},
                "correctAnswer": "B",
                "hint": "Energy",
                "explanation": "ATP is produced there."
            }]
        }))
        .unwrap();

        assert_eq!(quiz.questions[0].correct_answer, "B");
        assert_eq!(quiz.questions[0].options.b, "Mitochondria");
    }

    #[test]
    fn test_summary_ref_structured_object() {
        let r = SummaryRef::from_value(&json!({"title": "T", "summary": "Body"}));
        assert_eq!(r.working_text("topic"), "Body");
    }

    #[test]
    fn test_summary_ref_json_string() {
        let r = SummaryRef::from_value(&json!(r#"{"title": "T", "summary": "Encoded"}"#));
        assert!(matches!(r, SummaryRef::Structured(_)));
        assert_eq!(r.working_text("topic"), "Encoded");
    }

    #[test]
    fn test_summary_ref_plain_text() {
        let r = SummaryRef::from_value(&json!("Photosynthesis turns light into sugar."));
        assert_eq!(
            r.working_text("topic"),
            "Photosynthesis turns light into sugar."
        );
    }

    #[test]
    fn test_summary_ref_unparsable_falls_back_to_topic() {
        let r = SummaryRef::from_value(&json!(r#"{"summary": "unterminated"#));
        assert!(r.is_missing());
        assert_eq!(r.working_text("Photosynthesis"), "Photosynthesis");
    }

    #[test]
    fn test_summary_ref_missing_variants() {
        assert!(SummaryRef::from_value(&json!(null)).is_missing());
        assert!(SummaryRef::from_value(&json!("   ")).is_missing());
        assert!(SummaryRef::from_value(&json!({"title": "no body"})).is_missing());
        assert!(SummaryRef::from_value(&json!("[1, 2]")).is_missing());
    }

    #[test]
    fn test_summary_ref_to_value() {
        let note = SummaryNote {
            title: "T".to_string(),
            summary: "S".to_string(),
        };
        let value = SummaryRef::Structured(note.clone()).to_value();
        assert_eq!(SummaryRef::from_value(&value), SummaryRef::Structured(note));
        assert_eq!(SummaryRef::Missing.to_value(), json!(null));
    }
}
