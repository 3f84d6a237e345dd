//! Learnflow CLI Binary
//!
//! Triggers pipeline runs, bulk regeneration and single-artifact
//! generation against a JSON record store or the configured remote store.

mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use learnflow::config::AppConfig;
use learnflow::context::PipelineState;
use learnflow::coordinator::{RunCoordinator, SingleStageOutcome};
use learnflow::core::ArtifactKind;
use learnflow::events::LoggingEventSink;
use learnflow::generator::GeminiGenerator;
use learnflow::jobs::Dispatcher;
use learnflow::observability::init_logging;
use learnflow::stages::StageDeps;
use learnflow::store::{MemoryStore, RestStore, RestStoreConfig, SharedStore};
use serde_json::json;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing::{error, info};

/// Where records come from and, for a file store, where they go back to.
enum StoreHandle {
    File(Arc<MemoryStore>, PathBuf),
    Remote(Arc<RestStore>),
}

impl StoreHandle {
    fn open(cli: &Cli, config: &AppConfig) -> Result<Self> {
        if let Some(path) = &cli.store {
            let store = MemoryStore::load(path)
                .with_context(|| format!("failed to load store file {}", path.display()))?;
            return Ok(Self::File(Arc::new(store), path.clone()));
        }
        let settings = RestStoreConfig::from_settings(&config.store)
            .context("no --store file given and no remote store configured")?;
        Ok(Self::Remote(Arc::new(RestStore::new(settings))))
    }

    fn shared(&self) -> SharedStore {
        match self {
            Self::File(store, _) => store.clone(),
            Self::Remote(store) => store.clone(),
        }
    }

    fn save(&self) -> Result<()> {
        if let Self::File(store, path) = self {
            store
                .save(path)
                .with_context(|| format!("failed to save store file {}", path.display()))?;
        }
        Ok(())
    }
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = AppConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.logging.format = format.clone();
    }
    Ok(config)
}

fn describe(space_id: &str, state: &PipelineState) -> serde_json::Value {
    let present: Vec<String> = ArtifactKind::PIPELINE_ORDER
        .into_iter()
        .filter(|kind| state.has(*kind))
        .map(|kind| kind.to_string())
        .collect();
    json!({
        "space_id": space_id,
        "language": state.profile.language,
        "has_content": state.has_content(),
        "artifacts": present,
    })
}

async fn execute(cli: &Cli, config: AppConfig) -> Result<String> {
    if matches!(cli.command, Commands::ShowConfig) {
        return Ok(config.to_toml()?);
    }

    let store = StoreHandle::open(cli, &config)?;
    let generator = GeminiGenerator::from_env(config.generator.clone())?;
    let deps = StageDeps::new(Arc::new(generator), store.shared())
        .with_retry(config.retry.clone())
        .with_generator_config(&config.generator)
        .with_events(Arc::new(LoggingEventSink::info()));
    let dispatcher = Dispatcher::new(Arc::new(RunCoordinator::new(deps)), config.bulk.clone());

    let output = dispatch(&cli.command, &dispatcher, &config).await;
    store.save()?;
    output
}

async fn dispatch(command: &Commands, dispatcher: &Dispatcher, config: &AppConfig) -> Result<String> {
    let output = match command {
        Commands::Run {
            space,
            owner,
            language,
        } => {
            let state = dispatcher
                .invoke(space, owner, language.as_deref())
                .await
                .context("pipeline task did not complete")?;
            match state {
                Some(state) => serde_json::to_string_pretty(&describe(space, &state))?,
                None => bail!("run for {space} was skipped or could not start"),
            }
        }
        Commands::RegenerateAll { owner, language } => {
            let job = dispatcher.regenerate_all(owner, language.as_deref()).await?;
            if !job.is_spawned() {
                format!("No learning spaces found for {owner}")
            } else {
                info!(owner = %owner, total = job.total, "Waiting for bulk regeneration");
                match job.join().await {
                    Some(report) => serde_json::to_string_pretty(&report)?,
                    None => bail!("bulk regeneration did not complete"),
                }
            }
        }
        Commands::Generate {
            space,
            owner,
            kind,
            language,
        } => match dispatcher
            .generate_artifact(space, owner, (*kind).into(), language.as_deref())
            .await
        {
            SingleStageOutcome::Generated { artifact, .. } => serde_json::to_string_pretty(&artifact)?,
            outcome => bail!("{outcome}"),
        },
        Commands::ShowConfig => config.to_toml()?,
    };

    Ok(output)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e:#}");
            process::exit(1);
        }
    };

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        process::exit(1);
    }

    match execute(&cli, config).await {
        Ok(output) => println!("{output}"),
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("{e:#}");
            process::exit(1);
        }
    }
}
