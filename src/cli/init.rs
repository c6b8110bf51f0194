//! Prepare the current project for agentbox.
//!
//! `init` writes the container skeleton, makes sure the per-agent config
//! locations that the compose file mounts exist in `$HOME`, and on first
//! use downloads every agent into the shared cache.
//!
//! ```bash
//! agentbox init
//! agentbox init --path ./my-project
//! ```

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

use super::common::{CommandContext, print_results};
use crate::skeleton;

/// Config directories mounted into the container, relative to `$HOME`.
const AGENT_CONFIG_DIRS: [&str; 4] = [".claude", ".copilot", ".codex", ".gemini"];

/// Command to write the skeleton into a project directory.
#[derive(Args)]
pub struct InitCommand {
    /// Project directory (defaults to the current directory)
    #[arg(short, long)]
    path: Option<PathBuf>,
}

impl InitCommand {
    /// Execute the init command.
    ///
    /// # Errors
    /// Returns an error if the skeleton cannot be written, the agent cache
    /// cannot be prepared, or the state cannot be saved. Individual agent
    /// download failures are reported as warnings.
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let target_dir = self.path.unwrap_or_else(|| PathBuf::from("."));

        println!("{}", "Initializing agentbox...".cyan());
        write_skeleton(&target_dir)?;

        let mut manager = ctx.manager()?;
        if !manager.has_installed_agents() {
            println!("\nNo agents installed. Downloading all agents...");

            let results = ctx.update_agents(&mut manager, &[]).await;

            println!();
            let failed = print_results(&results, "installed");
            if failed > 0 {
                eprintln!("\n{} {} agent(s) failed to download", "Warning:".yellow(), failed);
            }

            manager.save_state().context("Failed to save agent state")?;
        }

        let home = dirs::home_dir().context("Could not determine home directory")?;
        ensure_agent_configs(&home)?;

        println!("\n{}", "Sandbox initialized successfully!".green());
        Ok(())
    }
}

fn write_skeleton(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    skeleton::copy_to(dir).context("Failed to write skeleton files")?;
    for name in skeleton::overwrite_files() {
        println!("  Created: {name}");
    }

    let created = skeleton::copy_user_files_if_missing(dir).context("Failed to write user files")?;
    for name in created {
        println!("  Created: {name}");
    }
    Ok(())
}

/// Creates the config directories and `.claude.json` the compose file
/// bind-mounts. A missing bind source would be created by the container
/// runtime as a root-owned directory.
fn ensure_agent_configs(home: &Path) -> Result<()> {
    let claude_json = home.join(".claude.json");
    if !claude_json.exists() {
        fs::write(&claude_json, "{}").with_context(|| format!("Failed to write {}", claude_json.display()))?;
    }

    for dir in AGENT_CONFIG_DIRS {
        let path = home.join(dir);
        fs::create_dir_all(&path).with_context(|| format!("Failed to create {}", path.display()))?;
    }
    Ok(())
}
