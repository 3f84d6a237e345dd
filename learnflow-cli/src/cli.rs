//! Clap types for the learnflow CLI.

use clap::{Parser, Subcommand, ValueEnum};
use learnflow::core::ArtifactKind;
use std::path::PathBuf;

/// Learnflow CLI - generate learning artifacts for learning spaces
#[derive(Parser)]
#[command(name = "learnflow")]
#[command(about = "Run the learning-artifact pipeline against a record store")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// JSON record store file (uses the configured remote store when omitted)
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full pipeline for one learning space
    Run {
        /// Learning space id
        #[arg(long)]
        space: String,
        /// Owner user id
        #[arg(long)]
        owner: String,
        /// Language override
        #[arg(long)]
        language: Option<String>,
    },
    /// Regenerate every learning space of an owner, one after another
    RegenerateAll {
        /// Owner user id
        #[arg(long)]
        owner: String,
        /// Language override
        #[arg(long)]
        language: Option<String>,
    },
    /// Generate a single artifact from the stored summary notes
    Generate {
        /// Learning space id
        #[arg(long)]
        space: String,
        /// Owner user id
        #[arg(long)]
        owner: String,
        /// Artifact to generate
        #[arg(long, value_enum)]
        kind: KindArg,
        /// Language override
        #[arg(long)]
        language: Option<String>,
    },
    /// Print the effective configuration as TOML
    ShowConfig,
}

/// Artifacts that can be generated on their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Quiz,
    Flashcards,
    Recommendations,
}

impl From<KindArg> for ArtifactKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Quiz => ArtifactKind::Quiz,
            KindArg::Flashcards => ArtifactKind::Flashcards,
            KindArg::Recommendations => ArtifactKind::Recommendations,
        }
    }
}
