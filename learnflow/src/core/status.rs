//! Space status and artifact kind enums.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Generation status stored on a learning space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpaceStatus {
    /// No run in progress.
    #[default]
    Normal,
    /// A pipeline run owns the space.
    Generating,
    /// The last run produced nothing usable.
    Failed,
}

impl SpaceStatus {
    /// Returns the stored column value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Generating => "generating",
            Self::Failed => "failed",
        }
    }

    /// Returns true if a new run may start from this status.
    #[must_use]
    pub fn accepts_run(&self) -> bool {
        !matches!(self, Self::Generating)
    }
}

impl fmt::Display for SpaceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of artifact a stage produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Summary notes.
    Summary,
    /// Multiple-choice quiz.
    Quiz,
    /// Learning resource recommendations.
    Recommendations,
    /// Flashcard deck.
    Flashcards,
    /// Narration script for the audio overview.
    AudioScript,
}

impl ArtifactKind {
    /// All kinds in pipeline order.
    pub const PIPELINE_ORDER: [Self; 5] = [
        Self::Summary,
        Self::Quiz,
        Self::Recommendations,
        Self::Flashcards,
        Self::AudioScript,
    ];

    /// Column the artifact is persisted under.
    #[must_use]
    pub fn column(&self) -> &'static str {
        match self {
            Self::Summary => "summary_notes",
            Self::Quiz => "quiz",
            Self::Recommendations => "recommendations",
            Self::Flashcards => "flashcards",
            Self::AudioScript => "audio_script",
        }
    }

    /// Key the artifact occupies in the shared pipeline state.
    #[must_use]
    pub fn state_key(&self) -> &'static str {
        match self {
            Self::AudioScript => "podcast_script",
            other => other.column(),
        }
    }

    /// Whether the generator must answer with structured JSON.
    #[must_use]
    pub fn is_structured(&self) -> bool {
        !matches!(self, Self::AudioScript)
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Summary => write!(f, "summary"),
            Self::Quiz => write!(f, "quiz"),
            Self::Recommendations => write!(f, "recommendations"),
            Self::Flashcards => write!(f, "flashcards"),
            Self::AudioScript => write!(f, "audio_script"),
        }
    }
}

impl FromStr for ArtifactKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "summary" | "summary_notes" => Ok(Self::Summary),
            "quiz" => Ok(Self::Quiz),
            "recommendations" | "recommendation" => Ok(Self::Recommendations),
            "flashcards" => Ok(Self::Flashcards),
            "audio_script" | "audio-script" | "podcast_script" => Ok(Self::AudioScript),
            other => Err(format!("unknown artifact kind: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_space_status_display() {
        assert_eq!(SpaceStatus::Normal.to_string(), "normal");
        assert_eq!(SpaceStatus::Generating.to_string(), "generating");
        assert_eq!(SpaceStatus::Failed.to_string(), "failed");
    }

    #[test]
    fn test_space_status_accepts_run() {
        assert!(SpaceStatus::Normal.accepts_run());
        assert!(SpaceStatus::Failed.accepts_run());
        assert!(!SpaceStatus::Generating.accepts_run());
    }

    #[test]
    fn test_space_status_serialize() {
        let json = serde_json::to_string(&SpaceStatus::Generating).unwrap();
        assert_eq!(json, r#""generating""#);

        let parsed: SpaceStatus = serde_json::from_str(r#""failed""#).unwrap();
        assert_eq!(parsed, SpaceStatus::Failed);
    }

    #[test]
    fn test_artifact_columns_and_keys() {
        assert_eq!(ArtifactKind::Summary.column(), "summary_notes");
        assert_eq!(ArtifactKind::AudioScript.column(), "audio_script");
        assert_eq!(ArtifactKind::AudioScript.state_key(), "podcast_script");
        assert_eq!(ArtifactKind::Quiz.state_key(), "quiz");
    }

    #[test]
    fn test_artifact_kind_from_str() {
        assert_eq!("Quiz".parse::<ArtifactKind>(), Ok(ArtifactKind::Quiz));
        assert_eq!(
            "recommendation".parse::<ArtifactKind>(),
            Ok(ArtifactKind::Recommendations)
        );
        assert!("mindmap".parse::<ArtifactKind>().is_err());
    }

    #[test]
    fn test_only_audio_script_is_unstructured() {
        let unstructured: Vec<_> = ArtifactKind::PIPELINE_ORDER
            .iter()
            .filter(|k| !k.is_structured())
            .collect();
        assert_eq!(unstructured, vec![&ArtifactKind::AudioScript]);
    }
}
