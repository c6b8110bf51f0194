//! Agent descriptors and the built-in agent table.

use super::AgentName;
use super::fetcher::{ArchiveFetcher, Fetcher, ManifestFetcher, ScriptFetcher};
use super::http::HttpPolicy;
use super::platform::Arch;
use super::resolver::{BucketResolver, GitHubReleaseResolver, ReleaseResolver};
use crate::constants::{CLAUDE_BUCKET_URL, GITHUB_URL};
use crate::core::{AgentboxError, Result};
use std::fmt;
use std::sync::Arc;

/// Base URLs of the upstream release hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseHosts {
    /// Release bucket for claude
    pub bucket_url: String,
    /// Hosted-git base for release redirects and asset downloads
    pub github_url: String,
}

impl Default for ReleaseHosts {
    fn default() -> Self {
        Self {
            bucket_url: CLAUDE_BUCKET_URL.to_string(),
            github_url: GITHUB_URL.to_string(),
        }
    }
}

/// Immutable description of one agent and its release channel.
#[derive(Clone)]
pub struct AgentDescriptor {
    /// Agent identifier
    pub name: AgentName,
    /// Binary ABI class (`glibc`, or `js` for script agents)
    pub variant: &'static str,
    /// Filename of the binary inside a version directory
    pub binary: &'static str,
    /// Latest-version strategy
    pub resolver: Arc<dyn ReleaseResolver>,
    /// Download strategy
    pub fetcher: Arc<dyn Fetcher>,
}

impl fmt::Debug for AgentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentDescriptor")
            .field("name", &self.name)
            .field("variant", &self.variant)
            .field("binary", &self.binary)
            .finish_non_exhaustive()
    }
}

/// The set of agents a [`Manager`](super::Manager) operates on.
#[derive(Debug, Clone)]
pub struct AgentRegistry {
    agents: Vec<AgentDescriptor>,
}

impl AgentRegistry {
    /// Registry over explicit descriptors, kept in the given order.
    pub fn new(agents: Vec<AgentDescriptor>) -> Self {
        Self { agents }
    }

    /// The four built-in agents for `arch`, talking to `hosts`.
    pub fn builtin(arch: Arch, hosts: &ReleaseHosts, http: &HttpPolicy) -> Self {
        let github = hosts.github_url.as_str();
        let codex_entry = format!("codex-{}-unknown-linux-gnu", arch.rust_arch());

        let agents = vec![
            AgentDescriptor {
                name: AgentName::Claude,
                variant: "glibc",
                binary: "claude",
                resolver: Arc::new(BucketResolver::new(http.clone(), hosts.bucket_url.clone())),
                fetcher: Arc::new(ManifestFetcher::new(http.clone(), hosts.bucket_url.clone(), arch, "claude")),
            },
            AgentDescriptor {
                name: AgentName::Copilot,
                variant: "glibc",
                binary: "copilot",
                resolver: Arc::new(GitHubReleaseResolver::new(http.clone(), github, "github/copilot-cli", "v")),
                fetcher: Arc::new(ArchiveFetcher::new(
                    http.clone(),
                    github,
                    "github/copilot-cli",
                    "v",
                    format!("copilot-linux-{arch}.tar.gz"),
                    "copilot",
                    "copilot",
                )),
            },
            AgentDescriptor {
                name: AgentName::Codex,
                variant: "glibc",
                binary: "codex",
                resolver: Arc::new(GitHubReleaseResolver::new(http.clone(), github, "openai/codex", "rust-v")),
                fetcher: Arc::new(ArchiveFetcher::new(
                    http.clone(),
                    github,
                    "openai/codex",
                    "rust-v",
                    format!("{codex_entry}.tar.gz"),
                    codex_entry,
                    "codex",
                )),
            },
            AgentDescriptor {
                name: AgentName::Gemini,
                variant: "js",
                binary: "gemini.js",
                resolver: Arc::new(GitHubReleaseResolver::new(
                    http.clone(),
                    github,
                    "google-gemini/gemini-cli",
                    "v",
                )),
                fetcher: Arc::new(ScriptFetcher::new(
                    http.clone(),
                    github,
                    "google-gemini/gemini-cli",
                    "v",
                    "gemini.js",
                )),
            },
        ];

        Self::new(agents)
    }

    /// Descriptor for `name`, if registered.
    pub fn get(&self, name: &str) -> Option<&AgentDescriptor> {
        self.agents.iter().find(|a| a.name.as_str() == name)
    }

    /// Descriptor for `name`, or [`AgentboxError::UnknownAgent`].
    pub fn lookup(&self, name: &str) -> Result<&AgentDescriptor> {
        self.get(name).ok_or_else(|| AgentboxError::UnknownAgent {
            name: name.to_string(),
        })
    }

    /// Descriptors in registry order.
    pub fn iter(&self) -> impl Iterator<Item = &AgentDescriptor> {
        self.agents.iter()
    }

    /// Registered agent names in registry order.
    pub fn names(&self) -> Vec<AgentName> {
        self.agents.iter().map(|a| a.name).collect()
    }
}
