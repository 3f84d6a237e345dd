//! Single-target run coordination.

use super::claim::InFlight;
use super::language::{first_language, resolve_language};
use crate::context::{LearnerProfile, PipelineState, RunIdentity, UserPrompt};
use crate::core::{ArtifactKind, LearningSpace, SpaceStatus, SummaryRef};
use crate::errors::LearnflowError;
use crate::events::SharedEventSink;
use crate::pipeline::{LearningPipeline, PipelineRun};
use crate::stages::{stage_for, StageDeps};
use crate::store::{single_field, status_fields, SharedStore};
use serde_json::{json, Value};
use std::fmt;
use tracing::{error, info, info_span, warn, Instrument};

/// Why a single-stage request did or did not produce an artifact.
#[derive(Debug, Clone, PartialEq)]
pub enum SingleStageOutcome {
    /// The stage produced and persisted its artifact.
    Generated {
        /// Artifact kind.
        kind: ArtifactKind,
        /// The artifact as stored.
        artifact: Value,
    },
    /// The learning space does not exist.
    SpaceNotFound,
    /// The space has no summary notes to work from yet.
    SummaryMissing,
    /// The kind cannot be generated on its own.
    Unsupported(ArtifactKind),
    /// The record store could not be read.
    StoreUnavailable(String),
    /// The stage ran but contributed nothing.
    GenerationFailed(ArtifactKind),
}

impl SingleStageOutcome {
    /// Returns the artifact, if one was generated.
    #[must_use]
    pub fn artifact(&self) -> Option<&Value> {
        match self {
            Self::Generated { artifact, .. } => Some(artifact),
            _ => None,
        }
    }

    /// Returns true if an artifact was generated.
    #[must_use]
    pub fn is_generated(&self) -> bool {
        matches!(self, Self::Generated { .. })
    }
}

impl fmt::Display for SingleStageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generated { kind, .. } => write!(f, "{kind} generated"),
            Self::SpaceNotFound => write!(f, "learning space not found"),
            Self::SummaryMissing => write!(
                f,
                "no summary notes available yet; wait for the summary to be generated first"
            ),
            Self::Unsupported(kind) => write!(f, "{kind} cannot be generated on its own"),
            Self::StoreUnavailable(e) => write!(f, "record store unavailable: {e}"),
            Self::GenerationFailed(kind) => write!(
                f,
                "{kind} generation failed, possibly due to rate limits; try again in a minute"
            ),
        }
    }
}

/// Starts pipeline runs for single targets and owns their status transitions.
///
/// Status moves `normal|failed → generating → normal|failed`. A target that
/// is already `generating` is refused. The persisted check and set are not
/// atomic across processes; within one process an in-flight claim refuses
/// overlapping runs of the same target outright.
pub struct RunCoordinator {
    deps: StageDeps,
    pipeline: LearningPipeline,
    in_flight: InFlight,
}

impl fmt::Debug for RunCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunCoordinator")
            .field("pipeline", &self.pipeline)
            .field("in_flight", &self.in_flight)
            .finish_non_exhaustive()
    }
}

impl RunCoordinator {
    /// Creates a coordinator running the standard pipeline.
    #[must_use]
    pub fn new(deps: StageDeps) -> Self {
        let pipeline = LearningPipeline::standard(deps.clone());
        Self::with_pipeline(deps, pipeline)
    }

    /// Creates a coordinator running a custom pipeline.
    #[must_use]
    pub fn with_pipeline(deps: StageDeps, pipeline: LearningPipeline) -> Self {
        Self {
            deps,
            pipeline,
            in_flight: InFlight::default(),
        }
    }

    /// The record store runs read from and write to.
    #[must_use]
    pub fn store(&self) -> &SharedStore {
        &self.deps.store
    }

    /// The stage dependencies this coordinator was built with.
    #[must_use]
    pub fn deps(&self) -> &StageDeps {
        &self.deps
    }

    fn events(&self) -> &SharedEventSink {
        &self.deps.events
    }

    /// Returns true if a run for `space_id` is in flight in this process.
    #[must_use]
    pub fn is_running(&self, space_id: &str) -> bool {
        self.in_flight.is_claimed(space_id)
    }

    /// Runs the full pipeline once for a target.
    ///
    /// Returns `None` when the run was refused or could not start, and the
    /// final state otherwise. A final state without summary, quiz or
    /// flashcards leaves the target `failed`.
    pub async fn run_once(
        &self,
        space_id: &str,
        owner_id: &str,
        language: Option<&str>,
    ) -> Option<PipelineState> {
        let identity = RunIdentity::new(space_id).with_owner(owner_id);
        let span = info_span!(
            "pipeline_run",
            run_id = %identity.run_id,
            space_id,
            owner_id
        );
        self.run_claimed(identity, language).instrument(span).await
    }

    async fn run_claimed(
        &self,
        identity: RunIdentity,
        language: Option<&str>,
    ) -> Option<PipelineState> {
        let space_id = identity.space_id.clone();
        let Some(_claim) = self.in_flight.claim(&space_id, identity.run_id) else {
            warn!("Run already in flight in this process, skipping");
            self.skipped(&space_id, "in_flight");
            return None;
        };

        info!(language_override = ?language, "Starting pipeline run");
        let space = match self.deps.store.get_space(&space_id).await {
            Ok(Some(space)) => space,
            // The current status is unknown here, so nothing is written.
            Ok(None) => {
                error!("Learning space not found");
                self.skipped(&space_id, "not_found");
                return None;
            }
            Err(e) => {
                error!(error = %e, "Failed to load learning space");
                self.skipped(&space_id, "load_failed");
                return None;
            }
        };

        if !space.status.accepts_run() {
            warn!("Workflow already in progress for this space, skipping to avoid collision");
            self.skipped(&space_id, "generating");
            return None;
        }
        self.set_status(&space_id, SpaceStatus::Generating).await;

        match self.execute(&identity, space, language).await {
            Ok(run) => {
                if run.has_content() {
                    self.set_status(&space_id, SpaceStatus::Normal).await;
                    info!("Pipeline run completed");
                } else {
                    warn!("Pipeline completed but generated no content");
                    self.set_status(&space_id, SpaceStatus::Failed).await;
                }
                Some(run.into_state())
            }
            Err(e) => {
                error!(error = %e, "Pipeline run failed");
                self.set_status(&space_id, SpaceStatus::Failed).await;
                None
            }
        }
    }

    async fn execute(
        &self,
        identity: &RunIdentity,
        space: LearningSpace,
        language: Option<&str>,
    ) -> Result<PipelineRun, LearnflowError> {
        let owner_id = identity.owner_id.clone().unwrap_or_default();
        let profile = self
            .deps
            .store
            .get_profile(&owner_id)
            .await?
            .ok_or_else(|| LearnflowError::ProfileNotFound(owner_id.clone()))?;

        let resolved = resolve_language(
            language,
            space.language.as_deref(),
            profile.language.as_deref(),
        );
        info!(language = %resolved, "Syncing target language");
        if let Err(e) = self
            .deps
            .store
            .update_space(&space.id, single_field("language", json!(resolved)))
            .await
        {
            warn!(error = %e, "Failed to persist resolved language");
        }

        let learner = LearnerProfile {
            grade_level: profile.grade_level,
            language: resolved,
            gender: profile.gender,
        };
        let state = PipelineState::seeded_from(&space, learner);
        Ok(self.pipeline.run_as(identity, state).await)
    }

    /// Runs exactly one stage against a space's stored summary.
    ///
    /// Status is left untouched. Language comes from the override, then the
    /// owner's profile, then English.
    pub async fn run_single_stage(
        &self,
        space_id: &str,
        owner_id: &str,
        kind: ArtifactKind,
        language: Option<&str>,
    ) -> SingleStageOutcome {
        if kind == ArtifactKind::Summary {
            return SingleStageOutcome::Unsupported(kind);
        }

        let space = match self.deps.store.get_space(space_id).await {
            Ok(Some(space)) => space,
            Ok(None) => return SingleStageOutcome::SpaceNotFound,
            Err(e) => return SingleStageOutcome::StoreUnavailable(e.to_string()),
        };
        if !space.has_summary() {
            return SingleStageOutcome::SummaryMissing;
        }

        let profile = match self.deps.store.get_profile(owner_id).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!(space_id, owner_id, error = %e, "Profile unavailable, using defaults");
                None
            }
        };
        let defaults = LearnerProfile::default();
        let learner = LearnerProfile {
            language: first_language(&[
                language,
                profile.as_ref().and_then(|p| p.language.as_deref()),
            ]),
            grade_level: profile
                .as_ref()
                .map_or(defaults.grade_level, |p| p.grade_level.clone()),
            gender: profile.map_or(defaults.gender, |p| p.gender),
        };

        let mut state = PipelineState::new(
            space.id.clone(),
            learner,
            UserPrompt {
                topic: space.topic.clone(),
                file_url: space.pdf_source.clone(),
            },
        );
        state.summary = space
            .summary_notes
            .as_ref()
            .map_or(SummaryRef::Missing, SummaryRef::from_value);

        info!(space_id, owner_id, kind = %kind, "Running single stage");
        let update = stage_for(kind, self.deps.clone()).run(&state).await;
        let artifact = match kind {
            ArtifactKind::Quiz => update.quiz,
            ArtifactKind::Recommendations => update.recommendations,
            ArtifactKind::Flashcards => update.flashcards,
            ArtifactKind::AudioScript => update.podcast_script.map(Value::String),
            ArtifactKind::Summary => None,
        };
        match artifact {
            Some(artifact) => SingleStageOutcome::Generated { kind, artifact },
            None => SingleStageOutcome::GenerationFailed(kind),
        }
    }

    /// Best-effort status write.
    async fn set_status(&self, space_id: &str, status: SpaceStatus) {
        match self.deps.store.update_space(space_id, status_fields(status)).await {
            Ok(true) => {
                self.events().try_emit(
                    "space.status",
                    Some(json!({ "space_id": space_id, "status": status })),
                );
            }
            Ok(false) => {
                warn!(space_id, status = %status, "Space status was not written");
            }
            Err(e) => {
                warn!(space_id, status = %status, error = %e, "Failed to update space status");
            }
        }
    }

    fn skipped(&self, space_id: &str, reason: &str) {
        self.events().try_emit(
            "pipeline.skipped",
            Some(json!({ "space_id": space_id, "reason": reason })),
        );
    }
}
