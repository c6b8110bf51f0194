//! Show, update, list and switch agent versions.
//!
//! ```bash
//! agentbox agents                      # status table
//! agentbox agents update               # update every agent
//! agentbox agents update codex gemini  # update some agents
//! agentbox agents list claude          # installed versions
//! agentbox agents use claude 2.0.75    # switch the current version
//! ```

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use tracing::debug;

use super::common::{CommandContext, print_results};
use crate::agents::{AgentName, AgentStatus, Manager};

/// Command to inspect and manage cached agents.
#[derive(Args)]
pub struct AgentsCommand {
    #[command(subcommand)]
    command: Option<AgentsSubcommand>,
}

#[derive(Subcommand)]
enum AgentsSubcommand {
    /// Download the latest version of agents
    Update {
        /// Agents to update (all when omitted)
        agents: Vec<String>,

        /// Update every agent
        #[arg(short = 'a', long)]
        all: bool,
    },

    /// Make an installed version current
    Use {
        /// Agent name
        agent: String,

        /// Installed version to switch to
        version: String,
    },

    /// List installed versions of an agent
    List {
        /// Agent name
        agent: String,
    },
}

impl AgentsCommand {
    /// Execute the agents command.
    ///
    /// # Errors
    /// Returns an error if the manager cannot be built, the state cannot be
    /// saved, or a `use`/`list` target is invalid
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let mut manager = ctx.manager()?;

        match self.command {
            None => show_status(&manager, ctx).await,
            Some(AgentsSubcommand::Update {
                agents,
                all,
            }) => {
                let names = if all {
                    Vec::new()
                } else {
                    agents
                };
                update(&mut manager, ctx, &names).await
            }
            Some(AgentsSubcommand::Use {
                agent,
                version,
            }) => {
                manager
                    .switch_version(&agent, &version)
                    .with_context(|| format!("Failed to switch {agent} to {version}"))?;
                println!("{} switched to {}", agent.bold(), version.green());
                Ok(())
            }
            Some(AgentsSubcommand::List {
                agent,
            }) => list(&manager, &agent),
        }
    }

    /// Names passed to `update`, empty for every agent. `None` for other
    /// subcommands.
    #[cfg(test)]
    pub(crate) fn update_targets(&self) -> Option<Vec<String>> {
        match &self.command {
            Some(AgentsSubcommand::Update {
                agents,
                all,
            }) => Some(if *all {
                Vec::new()
            } else {
                agents.clone()
            }),
            _ => None,
        }
    }
}

async fn show_status(manager: &Manager, ctx: &CommandContext) -> Result<()> {
    println!("{}", "Fetching agent versions...".cyan());
    let statuses = manager.status(&ctx.cancel).await;

    println!(
        "\n{:<12} {:<14} {:<14} {}",
        "Agent".bold(),
        "Installed".bold(),
        "Latest".bold(),
        "Status".bold()
    );
    println!("{}", "─".repeat(58));

    for status in &statuses {
        let installed = status.installed.as_deref().unwrap_or("-");
        let latest = match (&status.error, &status.latest) {
            (Some(_), _) | (None, None) => "error",
            (None, Some(latest)) => latest.as_str(),
        };

        println!(
            "{:<12} {:<14} {:<14} {}",
            status.name.as_str(),
            installed,
            latest,
            status_label(status)
        );
        if let Some(e) = &status.error {
            debug!("Failed to resolve {}: {}", status.name, e);
        }
    }

    println!();
    Ok(())
}

fn status_label(status: &AgentStatus) -> colored::ColoredString {
    if status.error.is_some() {
        "error fetching".red()
    } else if status.installed.is_none() {
        "not installed".bright_black()
    } else if status.up_to_date {
        "up to date".green()
    } else {
        "update available".yellow()
    }
}

async fn update(manager: &mut Manager, ctx: &CommandContext, names: &[String]) -> Result<()> {
    println!("{}", "Updating agents...".cyan());

    let results = ctx.update_agents(manager, names).await;

    println!();
    let failed = print_results(&results, "updated to");
    if failed > 0 {
        eprintln!("\n{} {} agent(s) failed to update", "Warning:".yellow(), failed);
    }

    manager.save_state().context("Failed to save agent state")?;

    let removed = manager.cleanup_all();
    if removed > 0 {
        println!("\nCleanup: removed {removed} old version(s)");
    }

    Ok(())
}

fn list(manager: &Manager, agent: &str) -> Result<()> {
    let (versions, current) = manager
        .list_versions(agent)
        .with_context(|| format!("Failed to list versions of {agent}"))?;

    if versions.is_empty() {
        println!("No versions of {agent} installed");
        return Ok(());
    }

    let header = match agent.parse::<AgentName>() {
        Ok(name) => format!("Installed versions of {agent} ({}):", name.description()),
        Err(_) => format!("Installed versions of {agent}:"),
    };
    println!("{}", header.bold());
    for version in &versions {
        if current.as_deref() == Some(version.as_str()) {
            println!("  {} {}", version.green(), "(current)".bright_black());
        } else {
            println!("  {version}");
        }
    }
    Ok(())
}
