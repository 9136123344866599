//! # Thumb Studio
//!
//! Application layer of the thumbnail studio: the contracts for the AI
//! service and the project store, the credit-gated [`Studio`]
//! orchestrator and the `thumb-studio` command-line tool.
//!
//! ## Usage
//!
//! ```bash
//! thumb-studio export layout.json --out thumb.png
//! thumb-studio credits --add 20
//! thumb-studio progress
//! thumb-studio layers layout.json
//! ```
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `StudioConfig` - Canvas size, data directory, credits, export and retry settings
//! - `Studio` - Owns the editor, ledger and progress engine and drives the backend
//! - `GenerationBackend` / `ProjectRepository` - External collaborators

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod error;
pub mod projects;
pub mod retry;
pub mod studio;
pub mod validation;

pub use backend::{
    AnalysisResult, AspectRatio, GeneratedImage, GenerationBackend, ImageSource, TextTemplate,
    ThumbnailRequest, ThumbnailStyle,
};
pub use error::{AppError, AppResult};
pub use projects::{MemoryProjectRepository, Project, ProjectRepository};
pub use retry::{with_retry, RetryConfig};
pub use studio::Studio;
pub use validation::ValidationError;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use studio_core::credits::STARTING_CREDITS;
use studio_core::scene::{DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH};
use studio_renderer::EXPORT_4K_WIDTH;

/// Command-line arguments for thumb-studio.
#[derive(Debug, Clone, Parser)]
#[command(name = "thumb-studio")]
#[command(about = "Layer-based thumbnail studio")]
#[command(version)]
pub struct CliArgs {
    /// Directory holding credits, progress and other local state
    #[arg(long, env = "THUMB_STUDIO_DATA_DIR", default_value = ".thumb-studio")]
    pub data_dir: PathBuf,

    /// Credits granted on first use
    #[arg(long, env = "THUMB_STUDIO_STARTING_CREDITS", default_value_t = STARTING_CREDITS)]
    pub starting_credits: u64,

    /// Retries for rate-limited service calls
    #[arg(long, env = "THUMB_STUDIO_MAX_RETRIES", default_value_t = 2)]
    pub max_retries: u32,

    /// First retry delay in milliseconds
    #[arg(long, env = "THUMB_STUDIO_RETRY_DELAY_MS", default_value_t = 1500)]
    pub retry_delay_ms: u64,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands of thumb-studio.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Render a saved layout to PNG, JPEG or SVG (format from the extension)
    Export {
        /// Layout JSON file
        layout: PathBuf,
        /// Output file
        #[arg(long, short)]
        out: PathBuf,
        /// Output width in pixels
        #[arg(long, default_value_t = EXPORT_4K_WIDTH)]
        width: u32,
    },
    /// Show the credit balance, optionally topping it up
    Credits {
        /// Credits to add
        #[arg(long)]
        add: Option<u64>,
    },
    /// Show level, points, achievements and today's challenges
    Progress,
    /// List the layers of a saved layout, topmost first
    Layers {
        /// Layout JSON file
        layout: PathBuf,
    },
}

/// Studio configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct StudioConfig {
    /// Canvas width for new designs.
    pub canvas_width: f32,
    /// Canvas height for new designs.
    pub canvas_height: f32,
    /// Directory for the file-backed store.
    pub data_dir: PathBuf,
    /// Credits granted on first use.
    pub starting_credits: u64,
    /// Width of full-size exports.
    pub export_width: u32,
    /// Whether exports may use system fonts.
    pub load_system_fonts: bool,
    /// Retry policy for service calls.
    pub retry: RetryConfig,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl StudioConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            canvas_width: DEFAULT_CANVAS_WIDTH,
            canvas_height: DEFAULT_CANVAS_HEIGHT,
            data_dir: PathBuf::from(".thumb-studio"),
            starting_credits: STARTING_CREDITS,
            export_width: EXPORT_4K_WIDTH,
            load_system_fonts: true,
            retry: RetryConfig::default(),
        }
    }
}

impl From<CliArgs> for StudioConfig {
    fn from(args: CliArgs) -> Self {
        let export_width = match args.command {
            Command::Export { width, .. } => width,
            _ => EXPORT_4K_WIDTH,
        };
        Self {
            data_dir: args.data_dir,
            starting_credits: args.starting_credits,
            export_width,
            retry: RetryConfig {
                max_retries: args.max_retries,
                initial_delay_ms: args.retry_delay_ms,
                ..RetryConfig::default()
            },
            ..Self::new()
        }
    }
}
