//! Trigger surface for runs, bulk regeneration and on-demand artifacts.
//!
//! Every trigger first cancels the owner's in-flight bulk runs, so an
//! explicit request never waits behind a background sweep.

use super::{BulkConfig, BulkRegenerator, BulkReport, JobRegistry, TargetRunner};
use crate::audio::{AudioOutcome, AudioService, SharedRenderer};
use crate::context::PipelineState;
use crate::coordinator::{RunCoordinator, SingleStageOutcome};
use crate::core::ArtifactKind;
use crate::errors::LearnflowError;
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// A bulk run started by [`Dispatcher::regenerate_all`].
#[derive(Debug)]
pub struct BulkJob {
    /// Number of targets scheduled.
    pub total: usize,
    handle: Option<JoinHandle<BulkReport>>,
}

impl BulkJob {
    /// Returns true if a background run was spawned.
    #[must_use]
    pub fn is_spawned(&self) -> bool {
        self.handle.is_some()
    }

    /// Waits for the bulk run to finish.
    ///
    /// Returns `None` if nothing was spawned or the task panicked.
    pub async fn join(self) -> Option<BulkReport> {
        match self.handle?.await {
            Ok(report) => Some(report),
            Err(e) => {
                warn!(error = %e, "Bulk task did not complete");
                None
            }
        }
    }
}

/// Entry point used by the CLI and any request-handling layer.
#[derive(Clone)]
pub struct Dispatcher {
    coordinator: Arc<RunCoordinator>,
    registry: Arc<JobRegistry>,
    bulk: BulkConfig,
    audio: Option<Arc<AudioService>>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("bulk", &self.bulk)
            .field("audio", &self.audio.is_some())
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Creates a dispatcher with its own job registry.
    #[must_use]
    pub fn new(coordinator: Arc<RunCoordinator>, bulk: BulkConfig) -> Self {
        Self {
            coordinator,
            registry: Arc::new(JobRegistry::new()),
            bulk,
            audio: None,
        }
    }

    /// Shares an existing job registry.
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<JobRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Enables audio overviews through `renderer`.
    #[must_use]
    pub fn with_renderer(mut self, renderer: SharedRenderer) -> Self {
        self.audio = Some(Arc::new(AudioService::new(self.coordinator.clone(), renderer)));
        self
    }

    /// The job registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    /// The coordinator runs are delegated to.
    #[must_use]
    pub fn coordinator(&self) -> &Arc<RunCoordinator> {
        &self.coordinator
    }

    /// Starts a full pipeline run for one space in the background.
    pub fn invoke(
        &self,
        space_id: &str,
        owner_id: &str,
        language: Option<&str>,
    ) -> JoinHandle<Option<PipelineState>> {
        self.registry.cancel_all(owner_id);
        info!(space_id, owner_id, "Workflow invoked");

        let coordinator = self.coordinator.clone();
        let space_id = space_id.to_string();
        let owner_id = owner_id.to_string();
        let language = language.map(str::to_string);
        tokio::spawn(async move {
            coordinator
                .run_once(&space_id, &owner_id, language.as_deref())
                .await
        })
    }

    /// Starts regenerating every space of the owner in the background.
    ///
    /// Nothing is spawned when the owner has no spaces.
    pub async fn regenerate_all(
        &self,
        owner_id: &str,
        language: Option<&str>,
    ) -> Result<BulkJob, LearnflowError> {
        self.registry.cancel_all(owner_id);
        let token = self.registry.register(owner_id);

        let targets = match self.coordinator.store().list_space_ids(owner_id).await {
            Ok(targets) => targets,
            Err(e) => {
                self.registry.release(owner_id, &token);
                return Err(e.into());
            }
        };
        if targets.is_empty() {
            info!(owner_id, "No learning spaces to regenerate");
            self.registry.release(owner_id, &token);
            return Ok(BulkJob {
                total: 0,
                handle: None,
            });
        }

        let total = targets.len();
        info!(owner_id, total, "Scheduling bulk regeneration");
        let runner: Arc<dyn TargetRunner> = self.coordinator.clone();
        let bulk = BulkRegenerator::new(runner, token.clone(), self.bulk.clone())
            .with_events(self.coordinator.deps().events.clone());
        let registry = self.registry.clone();
        let owner_id = owner_id.to_string();
        let language = language.map(str::to_string);

        let handle = tokio::spawn(async move {
            let report = bulk.run(&owner_id, language.as_deref(), &targets).await;
            registry.release(&owner_id, &token);
            report
        });
        Ok(BulkJob {
            total,
            handle: Some(handle),
        })
    }

    /// Generates one artifact for a space that already has summary notes.
    pub async fn generate_artifact(
        &self,
        space_id: &str,
        owner_id: &str,
        kind: ArtifactKind,
        language: Option<&str>,
    ) -> SingleStageOutcome {
        self.registry.cancel_all(owner_id);
        self.coordinator
            .run_single_stage(space_id, owner_id, kind, language)
            .await
    }

    /// Renders the audio overview of a space.
    pub async fn audio_overview(
        &self,
        space_id: &str,
        owner_id: &str,
        language: Option<&str>,
    ) -> Result<AudioOutcome, LearnflowError> {
        self.registry.cancel_all(owner_id);
        let audio = self
            .audio
            .as_ref()
            .ok_or_else(|| LearnflowError::InvalidConfig("no speech renderer configured".into()))?;
        Ok(audio.render_overview(space_id, owner_id, language).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LearningSpace, SpaceStatus, StudentProfile};
    use crate::stages::StageDeps;
    use crate::store::MemoryStore;
    use crate::testing::{fast_retry, scripted_happy_path};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn store(spaces: usize) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        for i in 1..=spaces {
            store.insert_space(LearningSpace::new(format!("s{i}"), "u1", "Cells"));
        }
        store.insert_profile(StudentProfile::new("u1"));
        store
    }

    fn dispatcher(store: Arc<MemoryStore>) -> Dispatcher {
        let deps = StageDeps::new(Arc::new(scripted_happy_path()), store).with_retry(fast_retry());
        Dispatcher::new(
            Arc::new(RunCoordinator::new(deps)),
            BulkConfig::default().with_inter_target_delay(Duration::from_millis(10)),
        )
    }

    #[tokio::test]
    async fn test_invoke_cancels_bulk_jobs() {
        let dispatcher = dispatcher(store(1));
        let token = dispatcher.registry().register("u1");

        let state = dispatcher.invoke("s1", "u1", None).await.unwrap();

        assert!(token.is_cancelled());
        assert!(state.unwrap().has_content());
        assert_eq!(dispatcher.registry().active_count("u1"), 0);
    }

    #[tokio::test]
    async fn test_regenerate_all_with_no_spaces_spawns_nothing() {
        let dispatcher = dispatcher(store(0));

        let job = dispatcher.regenerate_all("u1", None).await.unwrap();

        assert_eq!(job.total, 0);
        assert!(!job.is_spawned());
        assert_eq!(dispatcher.registry().active_count("u1"), 0);
    }

    #[tokio::test]
    async fn test_regenerate_all_runs_every_space_and_releases() {
        let store = store(3);
        let dispatcher = dispatcher(store.clone());

        let job = dispatcher.regenerate_all("u1", Some("hindi")).await.unwrap();
        assert_eq!(job.total, 3);
        let report = job.join().await.unwrap();

        assert_eq!(report.processed, vec!["s1", "s2", "s3"]);
        assert_eq!(report.succeeded, 3);
        assert_eq!(dispatcher.registry().active_count("u1"), 0);
        for id in ["s1", "s2", "s3"] {
            let space = store.space(id).unwrap();
            assert_eq!(space.status, SpaceStatus::Normal);
            assert_eq!(space.language.as_deref(), Some("Hindi"));
        }
    }

    #[tokio::test]
    async fn test_new_request_supersedes_bulk_run() {
        let dispatcher = dispatcher(store(3));

        let bulk = dispatcher.regenerate_all("u1", None).await.unwrap();
        let single = dispatcher.invoke("s2", "u1", None);

        let report = bulk.join().await.unwrap();
        assert_eq!(report.cancelled_at, Some(0));
        assert!(report.processed.is_empty());
        assert!(single.await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_second_bulk_request_cancels_first() {
        let dispatcher = dispatcher(store(2));

        let first = dispatcher.regenerate_all("u1", None).await.unwrap();
        let second = dispatcher.regenerate_all("u1", None).await.unwrap();

        assert!(first.join().await.unwrap().was_cancelled());
        let report = second.join().await.unwrap();
        assert_eq!(report.processed.len(), 2);
    }

    #[tokio::test]
    async fn test_audio_requires_renderer() {
        let dispatcher = dispatcher(store(1));
        let result = dispatcher.audio_overview("s1", "u1", None).await;
        assert!(matches!(result, Err(LearnflowError::InvalidConfig(_))));
    }
}
