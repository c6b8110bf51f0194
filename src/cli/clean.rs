//! Remove the agentbox skeleton from a project directory.
//!
//! The agent cache in `$HOME/.agentbox` is left untouched.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use crate::skeleton;

/// Command to delete the skeleton files.
#[derive(Args)]
pub struct CleanCommand {
    /// Project directory (defaults to the current directory)
    #[arg(short, long)]
    path: Option<PathBuf>,
}

impl CleanCommand {
    /// Execute the clean command.
    ///
    /// # Errors
    /// Returns an error if an existing skeleton file cannot be removed
    pub fn execute(self) -> Result<()> {
        let target_dir = self.path.unwrap_or_else(|| PathBuf::from("."));

        println!("Cleaning agentbox files...");
        let removed = skeleton::remove_from(&target_dir).context("Failed to remove skeleton files")?;

        for name in &removed {
            println!("Removed: {name}");
        }
        if removed.is_empty() {
            println!("No files to remove");
        } else {
            println!("Cleaned {} file(s)", removed.len());
        }
        Ok(())
    }
}
