//! Orchestration of resolvers, fetchers and the installation store.
//!
//! The manager owns the agent registry, the installation store and an
//! optional state handle. Acquisitions for different agents run
//! concurrently; side effects on the `current` files and the state record
//! are applied only after every acquisition has finished, in input order,
//! so the outcome is deterministic for a given input list.
//!
//! # Examples
//!
//! ```rust,no_run
//! use agentbox::agents::{AgentRegistry, Arch, InstallationStore, Manager, ReleaseHosts};
//! use agentbox::agents::http::HttpPolicy;
//! use agentbox::utils::progress;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> agentbox::core::Result<()> {
//! let http = HttpPolicy::new()?;
//! let registry = AgentRegistry::builtin(Arch::detect()?, &ReleaseHosts::default(), &http);
//! let mut manager = Manager::new(registry, InstallationStore::new("/tmp/agentbox/bin"));
//!
//! let cancel = CancellationToken::new();
//! let results = manager.update(&[], &|_, _| progress::silent(), &cancel).await;
//! for result in &results {
//!     println!("{}: {:?}", result.agent, result.version);
//! }
//! # Ok(())
//! # }
//! ```

use super::registry::{AgentDescriptor, AgentRegistry};
use super::store::InstallationStore;
use super::{AgentName, ProgressFn};
use crate::config::StateHandle;
use crate::constants::MAX_VERSIONS_TO_KEEP;
use crate::core::{AgentboxError, Result};
use crate::utils::fs::remove_dir_best_effort;
use futures::future::join_all;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Status of one agent as shown by `agentbox agents`.
#[derive(Debug)]
pub struct AgentStatus {
    /// Agent identifier
    pub name: AgentName,
    /// Installed current version
    pub installed: Option<String>,
    /// Latest upstream version, if it could be resolved
    pub latest: Option<String>,
    /// Installed and equal to the latest version
    pub up_to_date: bool,
    /// Why the latest version could not be resolved
    pub error: Option<AgentboxError>,
}

/// Outcome of one agent in an [`update`](Manager::update).
#[derive(Debug)]
pub struct DownloadResult {
    /// Agent name as requested
    pub agent: String,
    /// Version acquired, once resolution succeeded
    pub version: Option<String>,
    /// Variant tag of the agent, when it is registered
    pub variant: Option<&'static str>,
    /// Failure, if any
    pub error: Option<AgentboxError>,
}

impl DownloadResult {
    /// Whether the agent ended up installed and current.
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.version.is_some()
    }

    fn failed(agent: &str, variant: Option<&'static str>, error: AgentboxError) -> Self {
        Self {
            agent: agent.to_string(),
            version: None,
            variant,
            error: Some(error),
        }
    }
}

/// Agent version manager.
pub struct Manager {
    registry: AgentRegistry,
    store: InstallationStore,
    state: Option<StateHandle>,
    locks: HashMap<AgentName, Mutex<()>>,
}

impl Manager {
    /// Manager over `registry` and `store`, without a state record.
    pub fn new(registry: AgentRegistry, store: InstallationStore) -> Self {
        let locks = registry.names().into_iter().map(|name| (name, Mutex::new(()))).collect();
        Self {
            registry,
            store,
            state: None,
            locks,
        }
    }

    /// Records installs and switches in `state`.
    #[must_use]
    pub fn with_state(mut self, state: StateHandle) -> Self {
        self.state = Some(state);
        self
    }

    /// The installation store.
    pub fn store(&self) -> &InstallationStore {
        &self.store
    }

    /// Persists the state record, if any.
    pub fn save_state(&self) -> Result<()> {
        self.state.as_ref().map_or(Ok(()), StateHandle::save)
    }

    /// Installed and latest versions of every registered agent.
    ///
    /// The installed version comes from the `current` file, falling back to
    /// the state record. Latest versions are resolved concurrently.
    pub async fn status(&self, cancel: &CancellationToken) -> Vec<AgentStatus> {
        let tasks = self.registry.iter().map(|agent| async move {
            let installed = self.installed_version(agent.name);
            let (latest, error) = match agent.resolver.latest_version(cancel).await {
                Ok(latest) => (Some(latest), None),
                Err(e) => {
                    debug!("Failed to resolve latest {}: {}", agent.name, e);
                    (None, Some(e))
                }
            };
            let up_to_date = installed.is_some() && installed == latest;

            AgentStatus {
                name: agent.name,
                installed,
                latest,
                up_to_date,
                error,
            }
        });

        join_all(tasks).await
    }

    fn installed_version(&self, agent: AgentName) -> Option<String> {
        self.store.read_current(agent).or_else(|| {
            self.state
                .as_ref()
                .and_then(|s| s.state().agent_version(agent.as_str()))
                .map(str::to_string)
        })
    }

    /// Installs the latest version of one agent and makes it current.
    ///
    /// Returns the installed version.
    pub async fn install(&mut self, name: &str, progress: ProgressFn, cancel: &CancellationToken) -> Result<String> {
        let agent = self.registry.lookup(name)?;
        let lock = self.lock_for(agent.name);
        let version = acquire(&self.store, agent, lock, |_| progress, cancel).await?;

        let (agent_name, variant) = (agent.name, agent.variant);
        self.apply(agent_name, &version, variant)?;
        Ok(version)
    }

    /// Updates several agents concurrently.
    ///
    /// An empty `names` means every registered agent. `progress` is asked for
    /// a callback only when an agent actually needs a download. The result
    /// list matches `names` in order; one agent's failure never affects the
    /// others.
    pub async fn update<P>(&mut self, names: &[String], progress: &P, cancel: &CancellationToken) -> Vec<DownloadResult>
    where
        P: Fn(AgentName, &str) -> ProgressFn + Sync,
    {
        let names: Vec<String> = if names.is_empty() {
            self.registry.names().iter().map(|n| n.as_str().to_string()).collect()
        } else {
            names.to_vec()
        };

        let mut results = {
            let store = &self.store;
            let registry = &self.registry;
            let locks = &self.locks;

            let tasks = names.iter().map(|name| async move {
                let agent = match registry.lookup(name) {
                    Ok(agent) => agent,
                    Err(e) => return DownloadResult::failed(name, None, e),
                };
                let lock = locks.get(&agent.name);
                match acquire(store, agent, lock, |version| progress(agent.name, version), cancel).await {
                    Ok(version) => DownloadResult {
                        agent: name.clone(),
                        version: Some(version),
                        variant: Some(agent.variant),
                        error: None,
                    },
                    Err(e) => {
                        warn!("Failed to update {}: {}", name, e);
                        DownloadResult::failed(name, Some(agent.variant), e)
                    }
                }
            });

            join_all(tasks).await
        };

        for result in &mut results {
            if result.error.is_some() {
                continue;
            }
            let (Some(version), Some(variant)) = (result.version.as_deref(), result.variant) else {
                continue;
            };
            let Ok(agent) = result.agent.parse::<AgentName>() else {
                continue;
            };
            if let Err(e) = self.apply(agent, version, variant) {
                result.error = Some(e);
            }
        }

        results
    }

    /// Makes an installed version current.
    pub fn switch_version(&mut self, name: &str, version: &str) -> Result<()> {
        let agent = self.registry.lookup(name)?;
        if !self.store.is_installed(agent.name, version) {
            return Err(AgentboxError::VersionNotInstalled {
                agent: name.to_string(),
                version: version.to_string(),
            });
        }

        let (agent_name, variant) = (agent.name, agent.variant);
        self.apply(agent_name, version, variant)
    }

    /// Installed versions of one agent, newest first, and the current one.
    pub fn list_versions(&self, name: &str) -> Result<(Vec<String>, Option<String>)> {
        let agent = self.registry.lookup(name)?;
        self.store.list_versions(agent.name)
    }

    /// Prunes one agent down to the retention limit.
    pub fn cleanup(&self, name: &str) -> Result<usize> {
        let agent = self.registry.lookup(name)?;
        let removed = self.store.prune(agent.name, MAX_VERSIONS_TO_KEEP)?;
        if removed > 0 {
            info!("Removed {} old {} versions", removed, agent.name);
        }
        Ok(removed)
    }

    /// Prunes every registered agent. Agents whose directory cannot be read
    /// are skipped.
    pub fn cleanup_all(&self) -> usize {
        self.registry
            .iter()
            .map(|agent| match self.cleanup(agent.name.as_str()) {
                Ok(removed) => removed,
                Err(e) => {
                    warn!("Failed to clean up {}: {}", agent.name, e);
                    0
                }
            })
            .sum()
    }

    /// Whether any agent has a current version, on disk or in the state
    /// record.
    pub fn has_installed_agents(&self) -> bool {
        self.registry.iter().any(|agent| self.installed_version(agent.name).is_some())
    }

    fn lock_for(&self, agent: AgentName) -> Option<&Mutex<()>> {
        self.locks.get(&agent)
    }

    fn apply(&mut self, agent: AgentName, version: &str, variant: &str) -> Result<()> {
        self.store.set_current(agent, version)?;
        if let Some(state) = self.state.as_mut() {
            state.record(agent.as_str(), version, variant)?;
        }
        Ok(())
    }
}

/// Resolves the latest version of `agent` and downloads it unless already
/// installed. A failed download's version directory is removed.
async fn acquire<F>(
    store: &InstallationStore,
    agent: &AgentDescriptor,
    lock: Option<&Mutex<()>>,
    progress: F,
    cancel: &CancellationToken,
) -> Result<String>
where
    F: FnOnce(&str) -> ProgressFn,
{
    let version = agent.resolver.latest_version(cancel).await?;

    // Same-agent acquisitions serialise on the existence check
    let _guard = match lock {
        Some(lock) => Some(lock.lock().await),
        None => None,
    };

    if store.is_installed(agent.name, &version) {
        info!("{} {} already installed", agent.name, version);
        return Ok(version);
    }

    let dest_dir = store.version_dir(agent.name, &version);
    info!("Installing {} {}", agent.name, version);
    match agent.fetcher.download(&version, &dest_dir, progress(&version), cancel).await {
        Ok(()) => Ok(version),
        Err(e) => {
            remove_dir_best_effort(&dest_dir);
            Err(e)
        }
    }
}
