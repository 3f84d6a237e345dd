//! Shared pipeline state and the partial updates stages contribute to it.

use crate::core::{ArtifactKind, LearningSpace, SummaryRef};
use serde::{Deserialize, Serialize};

/// Resolved learner preferences carried through one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnerProfile {
    /// Class or grade level.
    pub grade_level: String,
    /// Resolved output language.
    pub language: String,
    /// Gender / pronoun preference.
    pub gender: String,
}

impl Default for LearnerProfile {
    fn default() -> Self {
        Self {
            grade_level: "general".to_string(),
            language: "English".to_string(),
            gender: String::new(),
        }
    }
}

/// What the user asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPrompt {
    /// Topic text.
    pub topic: String,
    /// Optional source file URL.
    #[serde(default)]
    pub file_url: Option<String>,
}

impl UserPrompt {
    /// Returns the file URL if it is present and not blank.
    #[must_use]
    pub fn file_url(&self) -> Option<&str> {
        self.file_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

/// The state bag threaded through the stages of one run.
///
/// Owned by a single run and never shared across threads; stages read it
/// by reference and return a [`StateUpdate`] that the pipeline folds in.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineState {
    /// Target learning space.
    pub space_id: String,
    /// Learner preferences.
    pub profile: LearnerProfile,
    /// User input.
    pub prompt: UserPrompt,
    /// Summary notes.
    pub summary: SummaryRef,
    /// Quiz artifact.
    pub quiz: Option<serde_json::Value>,
    /// Recommendation artifact.
    pub recommendations: Option<serde_json::Value>,
    /// Flashcard artifact.
    pub flashcards: Option<serde_json::Value>,
    /// Audio narration script.
    pub podcast_script: Option<String>,
}

impl PipelineState {
    /// Creates a blank state for a topic.
    #[must_use]
    pub fn new(space_id: impl Into<String>, profile: LearnerProfile, prompt: UserPrompt) -> Self {
        Self {
            space_id: space_id.into(),
            profile,
            prompt,
            summary: SummaryRef::Missing,
            quiz: None,
            recommendations: None,
            flashcards: None,
            podcast_script: None,
        }
    }

    /// Creates a state seeded with whatever the space already stores.
    #[must_use]
    pub fn seeded_from(space: &LearningSpace, profile: LearnerProfile) -> Self {
        let prompt = UserPrompt {
            topic: space.topic.clone(),
            file_url: space.pdf_source.clone(),
        };
        let mut state = Self::new(space.id.clone(), profile, prompt);
        state.summary = space
            .summary_notes
            .as_ref()
            .map_or(SummaryRef::Missing, SummaryRef::from_value);
        state.quiz = non_null(space.quiz.clone());
        state.recommendations = non_null(space.recommendations.clone());
        state.flashcards = non_null(space.flashcards.clone());
        state.podcast_script = space
            .audio_script
            .clone()
            .filter(|script| !script.trim().is_empty());
        state
    }

    /// Folds a stage update into the state. Absent slots are left untouched.
    pub fn apply(&mut self, update: StateUpdate) {
        if let Some(summary) = update.summary {
            self.summary = summary;
        }
        if update.quiz.is_some() {
            self.quiz = update.quiz;
        }
        if update.recommendations.is_some() {
            self.recommendations = update.recommendations;
        }
        if update.flashcards.is_some() {
            self.flashcards = update.flashcards;
        }
        if update.podcast_script.is_some() {
            self.podcast_script = update.podcast_script;
        }
    }

    /// Returns true if the artifact of `kind` is present.
    #[must_use]
    pub fn has(&self, kind: ArtifactKind) -> bool {
        match kind {
            ArtifactKind::Summary => !self.summary.is_missing(),
            ArtifactKind::Quiz => self.quiz.is_some(),
            ArtifactKind::Recommendations => self.recommendations.is_some(),
            ArtifactKind::Flashcards => self.flashcards.is_some(),
            ArtifactKind::AudioScript => self.podcast_script.is_some(),
        }
    }

    /// Returns true if any of summary, quiz or flashcards is present.
    #[must_use]
    pub fn has_content(&self) -> bool {
        self.has(ArtifactKind::Summary)
            || self.has(ArtifactKind::Quiz)
            || self.has(ArtifactKind::Flashcards)
    }

    /// Text downstream stages generate from.
    #[must_use]
    pub fn working_text(&self) -> String {
        self.summary.working_text(&self.prompt.topic)
    }
}

fn non_null(value: Option<serde_json::Value>) -> Option<serde_json::Value> {
    value.filter(|v| !v.is_null())
}

/// A stage's contribution to the shared state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateUpdate {
    /// New summary notes.
    pub summary: Option<SummaryRef>,
    /// New quiz.
    pub quiz: Option<serde_json::Value>,
    /// New recommendations.
    pub recommendations: Option<serde_json::Value>,
    /// New flashcards.
    pub flashcards: Option<serde_json::Value>,
    /// New audio script.
    pub podcast_script: Option<String>,
}

impl StateUpdate {
    /// An update that contributes nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// An update carrying one artifact.
    #[must_use]
    pub fn artifact(kind: ArtifactKind, value: serde_json::Value) -> Self {
        let mut update = Self::default();
        match kind {
            ArtifactKind::Summary => update.summary = Some(SummaryRef::from_value(&value)),
            ArtifactKind::Quiz => update.quiz = Some(value),
            ArtifactKind::Recommendations => update.recommendations = Some(value),
            ArtifactKind::Flashcards => update.flashcards = Some(value),
            ArtifactKind::AudioScript => {
                update.podcast_script = value.as_str().map(str::to_string);
            }
        }
        update
    }

    /// Returns true if the update contributes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.summary.is_none()
            && self.quiz.is_none()
            && self.recommendations.is_none()
            && self.flashcards.is_none()
            && self.podcast_script.is_none()
    }

    /// Returns the kinds this update carries.
    #[must_use]
    pub fn kinds(&self) -> Vec<ArtifactKind> {
        let mut kinds = Vec::new();
        if self.summary.is_some() {
            kinds.push(ArtifactKind::Summary);
        }
        if self.quiz.is_some() {
            kinds.push(ArtifactKind::Quiz);
        }
        if self.recommendations.is_some() {
            kinds.push(ArtifactKind::Recommendations);
        }
        if self.flashcards.is_some() {
            kinds.push(ArtifactKind::Flashcards);
        }
        if self.podcast_script.is_some() {
            kinds.push(ArtifactKind::AudioScript);
        }
        kinds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SummaryNote;
    use serde_json::json;

    fn blank_state() -> PipelineState {
        PipelineState::new(
            "s1",
            LearnerProfile::default(),
            UserPrompt {
                topic: "Photosynthesis".to_string(),
                file_url: Some("  ".to_string()),
            },
        )
    }

    #[test]
    fn test_blank_file_url_is_none() {
        assert!(blank_state().prompt.file_url().is_none());
    }

    #[test]
    fn test_apply_only_touches_present_slots() {
        let mut state = blank_state();
        state.flashcards = Some(json!({"flashcards": []}));

        state.apply(StateUpdate::artifact(ArtifactKind::Quiz, json!({"questions": []})));

        assert!(state.quiz.is_some());
        assert_eq!(state.flashcards, Some(json!({"flashcards": []})));
    }

    #[test]
    fn test_apply_empty_is_noop() {
        let mut state = blank_state();
        let before = state.clone();
        state.apply(StateUpdate::empty());
        assert_eq!(state, before);
    }

    #[test]
    fn test_summary_update_resolves_ref() {
        let update =
            StateUpdate::artifact(ArtifactKind::Summary, json!({"title": "T", "summary": "Body"}));
        assert_eq!(update.kinds(), vec![ArtifactKind::Summary]);

        let mut state = blank_state();
        state.apply(update);
        assert_eq!(state.working_text(), "Body");
    }

    #[test]
    fn test_has_content() {
        let mut state = blank_state();
        assert!(!state.has_content());

        state.podcast_script = Some("script".to_string());
        assert!(!state.has_content());

        state.summary = SummaryRef::Structured(SummaryNote {
            title: String::new(),
            summary: "S".to_string(),
        });
        assert!(state.has_content());
    }

    #[test]
    fn test_seeded_from_space() {
        let mut space = LearningSpace::new("s1", "u1", "Cells");
        space.summary_notes = Some(json!("Cells are small."));
        space.quiz = Some(json!(null));
        space.audio_script = Some(String::new());

        let state = PipelineState::seeded_from(&space, LearnerProfile::default());

        assert_eq!(state.working_text(), "Cells are small.");
        assert!(state.quiz.is_none());
        assert!(state.podcast_script.is_none());
    }
}
