//! Audio overview rendering.
//!
//! Turns a space's narration script into a speech file through a
//! [`SpeechRenderer`], generating the script first when the space has none.

use crate::coordinator::{first_language, RunCoordinator, SingleStageOutcome};
use crate::core::ArtifactKind;
use crate::errors::GenerationError;
use crate::store::single_field;
use async_trait::async_trait;
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Longest script, in characters, handed to the renderer.
pub const MAX_TTS_CHARS: usize = 5000;

const FALLBACK_CODES: [&str; 2] = ["hi", "en"];

/// Speech synthesis and upload.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechRenderer: Send + Sync {
    /// Renders `text` in `lang_code` and returns the public URL of the audio.
    async fn render(&self, text: &str, lang_code: &str) -> Result<String, GenerationError>;
}

/// Shared handle to a speech renderer.
pub type SharedRenderer = Arc<dyn SpeechRenderer>;

/// Maps a language name or locale to a speech code. Unknown values map to `en`.
#[must_use]
pub fn tts_code(language: &str) -> &'static str {
    match language.trim().to_lowercase().as_str() {
        "en" | "en-in" | "english" => "en",
        "hi" | "hi-in" | "hindi" => "hi",
        "tamil" => "ta",
        "telugu" => "te",
        "marathi" => "mr",
        "bengali" => "bn",
        "kannada" => "kn",
        "gujarati" => "gu",
        "malayalam" => "ml",
        "punjabi" => "pa",
        "odia" => "or",
        "assamese" => "as",
        "urdu" => "ur",
        _ => "en",
    }
}

/// Codes to try in order: the requested one, then Hindi, then English.
fn fallback_chain(code: &'static str) -> Vec<&'static str> {
    let mut chain = vec![code];
    for fallback in FALLBACK_CODES {
        if !chain.contains(&fallback) {
            chain.push(fallback);
        }
    }
    chain
}

fn truncate(text: &str) -> &str {
    match text.char_indices().nth(MAX_TTS_CHARS) {
        Some((idx, _)) => {
            warn!(max_chars = MAX_TTS_CHARS, "Script too long, truncating");
            &text[..idx]
        }
        None => text,
    }
}

/// Result of an audio overview request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioOutcome {
    /// Audio was rendered and its URL stored on the space.
    Rendered {
        /// Public URL of the audio.
        url: String,
        /// Speech code actually used.
        lang: String,
    },
    /// The learning space does not exist.
    SpaceNotFound,
    /// No script exists and there are no summary notes to write one from.
    SummaryMissing,
    /// The record store could not be read.
    StoreUnavailable(String),
    /// The script could not be generated.
    ScriptFailed,
    /// Every speech code in the fallback chain failed.
    RenderFailed(String),
}

impl AudioOutcome {
    /// The audio URL, if one was rendered.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Rendered { url, .. } => Some(url),
            _ => None,
        }
    }
}

impl fmt::Display for AudioOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rendered { url, lang } => write!(f, "audio rendered in {lang}: {url}"),
            Self::SpaceNotFound => write!(f, "learning space not found"),
            Self::SummaryMissing => write!(
                f,
                "no audio script or summary notes found; generate the learning content first"
            ),
            Self::StoreUnavailable(e) => write!(f, "record store unavailable: {e}"),
            Self::ScriptFailed => write!(f, "failed to generate the audio script"),
            Self::RenderFailed(e) => write!(f, "speech rendering failed: {e}"),
        }
    }
}

/// Renders audio overviews for spaces.
pub struct AudioService {
    coordinator: Arc<RunCoordinator>,
    renderer: SharedRenderer,
}

impl fmt::Debug for AudioService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioService").finish_non_exhaustive()
    }
}

impl AudioService {
    /// Creates a service that generates scripts through `coordinator`.
    #[must_use]
    pub fn new(coordinator: Arc<RunCoordinator>, renderer: SharedRenderer) -> Self {
        Self {
            coordinator,
            renderer,
        }
    }

    /// Renders the space's script and stores the audio URL in `audio_overview`.
    ///
    /// Speech language comes from the override, then the space, then the
    /// owner's profile, then English.
    pub async fn render_overview(
        &self,
        space_id: &str,
        owner_id: &str,
        language: Option<&str>,
    ) -> AudioOutcome {
        let store = self.coordinator.store();
        let space = match store.get_space(space_id).await {
            Ok(Some(space)) => space,
            Ok(None) => return AudioOutcome::SpaceNotFound,
            Err(e) => return AudioOutcome::StoreUnavailable(e.to_string()),
        };

        let script = match space.audio_script.as_deref().map(str::trim) {
            Some(script) if !script.is_empty() => script.to_string(),
            _ => {
                info!(space_id, "No audio script found, generating one");
                match self
                    .coordinator
                    .run_single_stage(space_id, owner_id, ArtifactKind::AudioScript, language)
                    .await
                {
                    SingleStageOutcome::Generated { artifact, .. } => {
                        artifact.as_str().map(str::to_string).unwrap_or_default()
                    }
                    SingleStageOutcome::SummaryMissing => return AudioOutcome::SummaryMissing,
                    SingleStageOutcome::SpaceNotFound => return AudioOutcome::SpaceNotFound,
                    SingleStageOutcome::StoreUnavailable(e) => {
                        return AudioOutcome::StoreUnavailable(e)
                    }
                    SingleStageOutcome::Unsupported(_) | SingleStageOutcome::GenerationFailed(_) => {
                        return AudioOutcome::ScriptFailed
                    }
                }
            }
        };
        if script.is_empty() {
            return AudioOutcome::ScriptFailed;
        }

        let profile_language = match store.get_profile(owner_id).await {
            Ok(profile) => profile.and_then(|p| p.language),
            Err(e) => {
                warn!(owner_id, error = %e, "Profile unavailable for speech language");
                None
            }
        };
        let language = first_language(&[
            language,
            space.language.as_deref(),
            profile_language.as_deref(),
        ]);

        let (url, lang) = match self.render(truncate(&script), &language).await {
            Ok(rendered) => rendered,
            Err(e) => return AudioOutcome::RenderFailed(e.to_string()),
        };

        if let Err(e) = store
            .update_space(space_id, single_field("audio_overview", json!(url)))
            .await
        {
            warn!(space_id, error = %e, "Failed to persist audio overview");
        }
        AudioOutcome::Rendered { url, lang }
    }

    /// Tries each speech code of the fallback chain until one renders.
    async fn render(&self, text: &str, language: &str) -> Result<(String, String), GenerationError> {
        let requested = tts_code(language);
        let mut last_error = GenerationError::new("no speech code attempted");
        for code in fallback_chain(requested) {
            info!(lang = code, requested = %language, "Rendering speech");
            match self.renderer.render(text, code).await {
                Ok(url) => {
                    if code != requested {
                        info!(used = code, requested, "Used fallback speech language");
                    }
                    return Ok((url, code.to_string()));
                }
                Err(e) => {
                    warn!(lang = code, error = %e, "Speech rendering failed");
                    last_error = e;
                }
            }
        }
        error!(requested = %language, "All speech fallbacks failed");
        Err(last_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LearningSpace, StudentProfile};
    use crate::stages::StageDeps;
    use crate::store::MemoryStore;
    use crate::testing::{fast_retry, scripted_happy_path, ScriptedGenerator};
    use mockall::predicate::eq;
    use pretty_assertions::assert_eq;

    fn service(
        generator: Arc<ScriptedGenerator>,
        store: Arc<MemoryStore>,
        renderer: MockSpeechRenderer,
    ) -> AudioService {
        let deps = StageDeps::new(generator, store).with_retry(fast_retry());
        AudioService::new(Arc::new(RunCoordinator::new(deps)), Arc::new(renderer))
    }

    fn store_with(space: LearningSpace) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.insert_space(space);
        store.insert_profile(StudentProfile::new("u1").with_language("Hindi"));
        store
    }

    #[test]
    fn test_tts_code() {
        assert_eq!(tts_code("Tamil"), "ta");
        assert_eq!(tts_code("en-IN"), "en");
        assert_eq!(tts_code("hi"), "hi");
        assert_eq!(tts_code("klingon"), "en");
    }

    #[test]
    fn test_fallback_chain_skips_duplicates() {
        assert_eq!(fallback_chain("ta"), vec!["ta", "hi", "en"]);
        assert_eq!(fallback_chain("hi"), vec!["hi", "en"]);
        assert_eq!(fallback_chain("en"), vec!["en", "hi"]);
    }

    #[test]
    fn test_truncate_counts_chars() {
        let long = "é".repeat(MAX_TTS_CHARS + 10);
        assert_eq!(truncate(&long).chars().count(), MAX_TTS_CHARS);
        assert_eq!(truncate("short"), "short");
    }

    #[tokio::test]
    async fn test_renders_existing_script() {
        let mut space = LearningSpace::new("s1", "u1", "Cells").with_language("Tamil");
        space.audio_script = Some("Welcome to cells.".to_string());
        let store = store_with(space);

        let mut renderer = MockSpeechRenderer::new();
        renderer
            .expect_render()
            .with(eq("Welcome to cells."), eq("ta"))
            .times(1)
            .returning(|_, _| Ok("https://cdn.example.com/a.mp3".to_string()));

        let generator = Arc::new(ScriptedGenerator::new());
        let outcome = service(generator.clone(), store.clone(), renderer)
            .render_overview("s1", "u1", None)
            .await;

        assert_eq!(outcome.url(), Some("https://cdn.example.com/a.mp3"));
        assert_eq!(generator.total_calls(), 0);
        assert_eq!(
            store.space("s1").unwrap().audio_overview.as_deref(),
            Some("https://cdn.example.com/a.mp3")
        );
    }

    #[tokio::test]
    async fn test_generates_script_when_missing() {
        let mut space = LearningSpace::new("s1", "u1", "Cells");
        space.summary_notes = Some(json!("Cells divide."));
        let store = store_with(space);

        let mut renderer = MockSpeechRenderer::new();
        renderer
            .expect_render()
            .returning(|_, code| Ok(format!("https://cdn.example.com/{code}.mp3")));

        let outcome = service(Arc::new(scripted_happy_path()), store.clone(), renderer)
            .render_overview("s1", "u1", None)
            .await;

        assert_eq!(
            outcome,
            AudioOutcome::Rendered {
                url: "https://cdn.example.com/hi.mp3".to_string(),
                lang: "hi".to_string(),
            }
        );
        assert!(store.space("s1").unwrap().audio_script.is_some());
    }

    #[tokio::test]
    async fn test_missing_script_and_summary() {
        let store = store_with(LearningSpace::new("s1", "u1", "Cells"));
        let outcome = service(Arc::new(scripted_happy_path()), store, MockSpeechRenderer::new())
            .render_overview("s1", "u1", None)
            .await;
        assert_eq!(outcome, AudioOutcome::SummaryMissing);
    }

    #[tokio::test]
    async fn test_falls_back_through_chain() {
        let mut space = LearningSpace::new("s1", "u1", "Cells");
        space.audio_script = Some("Script".to_string());
        let store = store_with(space);

        let mut renderer = MockSpeechRenderer::new();
        renderer
            .expect_render()
            .with(eq("Script"), eq("ta"))
            .returning(|_, _| Err(GenerationError::new("unsupported language")));
        renderer
            .expect_render()
            .with(eq("Script"), eq("hi"))
            .returning(|_, _| Err(GenerationError::new("unsupported language")));
        renderer
            .expect_render()
            .with(eq("Script"), eq("en"))
            .returning(|_, _| Ok("https://cdn.example.com/en.mp3".to_string()));

        let outcome = service(Arc::new(ScriptedGenerator::new()), store, renderer)
            .render_overview("s1", "u1", Some("tamil"))
            .await;

        assert_eq!(
            outcome,
            AudioOutcome::Rendered {
                url: "https://cdn.example.com/en.mp3".to_string(),
                lang: "en".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_all_fallbacks_fail() {
        let mut space = LearningSpace::new("s1", "u1", "Cells");
        space.audio_script = Some("Script".to_string());
        let store = store_with(space);

        let mut renderer = MockSpeechRenderer::new();
        renderer
            .expect_render()
            .times(2)
            .returning(|_, _| Err(GenerationError::new("service down")));

        let outcome = service(Arc::new(ScriptedGenerator::new()), store.clone(), renderer)
            .render_overview("s1", "u1", None)
            .await;

        assert!(matches!(outcome, AudioOutcome::RenderFailed(ref e) if e.contains("service down")));
        assert!(store.space("s1").unwrap().audio_overview.is_none());
    }
}
