//! Command-line interface for agentbox.
//!
//! Each command lives in its own module with its clap argument struct and
//! an `execute` method. Commands talk to the agent subsystem through a
//! [`common::CommandContext`], which owns the cache paths, the progress
//! setting and the cancellation token.
//!
//! # Available Commands
//!
//! - `init` - Write the container skeleton and download agents on first use
//! - `agents` - Show, update, list and switch agent versions
//! - `clean` - Remove the skeleton files from the working directory
//!
//! # Global Options
//!
//! - `--verbose` - Enable debug logging
//! - `--quiet` - Only log errors
//! - `--no-progress` - Disable progress bars (also `AGENTBOX_NO_PROGRESS`)
//!
//! # Example
//!
//! ```bash
//! agentbox init
//! agentbox agents
//! agentbox agents update codex gemini
//! agentbox agents use claude 2.0.75
//! ```

mod agents;
mod clean;
pub mod common;
mod init;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use crate::constants::NO_PROGRESS_ENV;
use common::CommandContext;

/// Runtime configuration derived from the global flags.
///
/// Kept separate from [`Cli`] so `main` can set up logging before any
/// command runs, and so tests can build one without parsing arguments.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: Option<String>,

    /// Whether progress bars are hidden
    pub no_progress: bool,
}

impl CliConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default log filter.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    /// Hide progress bars.
    #[must_use]
    pub const fn with_no_progress(mut self, no_progress: bool) -> Self {
        self.no_progress = no_progress;
        self
    }
}

/// Main CLI structure for agentbox.
#[derive(Parser)]
#[command(
    name = "agentbox",
    about = "Sandboxed container workspace for AI coding agents",
    version,
    author,
    long_about = "agentbox prepares a container recipe for the current project and keeps a per-user cache \
                  of AI coding agent binaries (claude, copilot, codex, gemini) that the container mounts."
)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Disable progress bars
    #[arg(long, global = true, env = NO_PROGRESS_ENV)]
    no_progress: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the container skeleton into the current directory
    Init(init::InitCommand),

    /// Manage agent versions in the cache
    Agents(agents::AgentsCommand),

    /// Remove skeleton files from the current directory
    Clean(clean::CleanCommand),
}

impl Cli {
    /// Derive the runtime configuration from the global flags.
    ///
    /// `--verbose` selects `debug`, `--quiet` selects `error`, and the default
    /// is `warn`.
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "warn"
        };

        CliConfig::new().with_log_level(log_level).with_no_progress(self.no_progress)
    }

    /// Execute the command with an explicit configuration.
    ///
    /// # Errors
    /// Returns any error from the command
    pub async fn execute_with_config(self, config: CliConfig, cancel: CancellationToken) -> Result<()> {
        match self.command {
            Commands::Init(cmd) => {
                let ctx = CommandContext::from_home(&config, cancel)?;
                cmd.execute(&ctx).await
            }
            Commands::Agents(cmd) => {
                let ctx = CommandContext::from_home(&config, cancel)?;
                cmd.execute(&ctx).await
            }
            Commands::Clean(cmd) => cmd.execute(),
        }
    }
}
