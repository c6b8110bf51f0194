//! Common utilities shared by CLI commands

use anyhow::{Context, Result};
use colored::Colorize;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

use super::CliConfig;
use crate::agents::http::HttpPolicy;
use crate::agents::{AgentName, AgentRegistry, Arch, DownloadResult, InstallationStore, Manager, ReleaseHosts};
use crate::config::{Paths, StateHandle};
use crate::utils::progress::{MultiProgress, ProgressBar, ProgressFn};

/// Everything a command needs to reach the agent cache.
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Cache layout under `$HOME/.agentbox`
    pub paths: Paths,
    /// Whether progress bars are drawn
    pub show_progress: bool,
    /// Cancelled on Ctrl-C
    pub cancel: CancellationToken,
}

impl CommandContext {
    /// Context rooted at the user's home directory.
    ///
    /// # Errors
    /// Returns an error if the home directory cannot be determined
    pub fn from_home(config: &CliConfig, cancel: CancellationToken) -> Result<Self> {
        let paths = Paths::from_home().context("Failed to locate the agentbox cache")?;
        Ok(Self::new(paths, config, cancel))
    }

    /// Context over an explicit cache layout.
    pub fn new(paths: Paths, config: &CliConfig, cancel: CancellationToken) -> Self {
        Self {
            paths,
            show_progress: !config.no_progress,
            cancel,
        }
    }

    /// Builds a manager for the host architecture with the state file
    /// attached.
    ///
    /// # Errors
    /// Returns an error if the architecture is unsupported, the cache
    /// directories cannot be created, or the state file is corrupt
    pub fn manager(&self) -> Result<Manager> {
        let arch = Arch::detect()?;
        self.paths.ensure_dirs().context("Failed to create the agentbox cache")?;

        let http = HttpPolicy::new()?;
        let registry = AgentRegistry::builtin(arch, &ReleaseHosts::default(), &http);
        let state = StateHandle::open(self.paths.state_file(), arch.as_str())
            .context("Failed to load agent state")?;

        Ok(Manager::new(registry, InstallationStore::new(self.paths.bin_dir())).with_state(state))
    }

    /// Runs `update` for `names` with one progress bar per download.
    pub async fn update_agents(&self, manager: &mut Manager, names: &[String]) -> Vec<DownloadResult> {
        let bars = DownloadBars::new(self.show_progress);
        let start = |agent: AgentName, version: &str| bars.start(agent, version);
        let results = manager.update(names, &start, &self.cancel).await;
        bars.finish(&results);
        results
    }
}

/// Download bars created on demand while an update runs.
pub struct DownloadBars {
    multi: MultiProgress,
    bars: Mutex<HashMap<AgentName, ProgressBar>>,
}

impl DownloadBars {
    /// Empty set; bars stay hidden unless `enabled`.
    pub fn new(enabled: bool) -> Self {
        Self {
            multi: MultiProgress::new(enabled),
            bars: Mutex::new(HashMap::new()),
        }
    }

    /// Adds a bar for `agent` and returns its byte callback.
    pub fn start(&self, agent: AgentName, version: &str) -> ProgressFn {
        let bar = self.multi.add_download(format!("{agent} {version}"));
        let callback = bar.callback();
        if let Ok(mut bars) = self.bars.lock() {
            bars.insert(agent, bar);
        }
        callback
    }

    /// Finishes bars of successful downloads and abandons the rest.
    pub fn finish(&self, results: &[DownloadResult]) {
        let Ok(bars) = self.bars.lock() else {
            return;
        };
        for (agent, bar) in bars.iter() {
            let ok = results
                .iter()
                .any(|r| r.agent == agent.as_str() && r.is_success());
            if ok {
                bar.finish();
            } else {
                bar.abandon();
            }
        }
    }
}

/// Prints one line per result and returns how many failed.
///
/// `verb` completes "agent: <verb> <version>" for successes.
pub fn print_results(results: &[DownloadResult], verb: &str) -> usize {
    let mut failed = 0;
    for result in results {
        match (&result.error, &result.version) {
            (Some(e), _) => {
                eprintln!("  {}: {} - {}", result.agent.bold(), "error".red(), e);
                failed += 1;
            }
            (None, Some(version)) => {
                println!("  {}: {} {}", result.agent.bold(), verb, version.green());
            }
            (None, None) => {}
        }
    }
    failed
}
