//! Agent acquisition and version management
//!
//! This module turns four unrelated upstream release channels into one
//! on-disk installation store with a "current" version per agent.
//!
//! # Architecture
//!
//! ```text
//! Manager ──► ReleaseResolver (per agent, concurrently)
//!    │             │ latest version
//!    │             ▼
//!    ├──► InstallationStore::is_installed ── yes ──► skip download
//!    │             │ no
//!    │             ▼
//!    ├──► Fetcher::download (streams bytes, reports progress)
//!    │             │
//!    ▼             ▼
//! InstallationStore::set_current + StateHandle::record (after all joins)
//! ```
//!
//! Each agent is an [`AgentDescriptor`]: an identifier, a variant tag, the
//! binary filename, and a resolver/fetcher pair. The [`AgentRegistry`]
//! holds the four built-in descriptors; dispatch is by descriptor, never by
//! string comparison inside the subsystem.
//!
//! # Modules
//!
//! - [`platform`] - host architecture probe
//! - [`http`] - shared HTTP policy and cancellable body streaming
//! - [`resolver`] - latest-version strategies
//! - [`fetcher`] - download strategies (manifest, archive, script)
//! - [`registry`] - descriptors and the built-in agent table
//! - [`store`] - the on-disk installation store
//! - [`manager`] - orchestration: status, install, update, switch, cleanup

pub mod fetcher;
pub mod http;
pub mod manager;
pub mod platform;
pub mod registry;
pub mod resolver;
pub mod store;

pub use fetcher::Fetcher;
pub use manager::{AgentStatus, DownloadResult, Manager};
pub use platform::Arch;
pub use registry::{AgentDescriptor, AgentRegistry, ReleaseHosts};
pub use resolver::ReleaseResolver;
pub use store::InstallationStore;

pub use crate::utils::progress::ProgressFn;

use crate::core::AgentboxError;
use std::fmt;
use std::str::FromStr;

/// The closed set of supported agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AgentName {
    /// Claude Code, published to a release bucket with a checksummed manifest
    Claude,
    /// GitHub Copilot CLI, published as a tar.gz release asset
    Copilot,
    /// OpenAI Codex CLI, published as a tar.gz release asset
    Codex,
    /// Google Gemini CLI, published as a single JavaScript bundle
    Gemini,
}

impl AgentName {
    /// Every agent, in registry order.
    pub const ALL: [Self; 4] = [Self::Claude, Self::Copilot, Self::Codex, Self::Gemini];

    /// Stable identifier used on disk and on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::Copilot => "copilot",
            Self::Codex => "codex",
            Self::Gemini => "gemini",
        }
    }

    /// One-line human description.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Claude => "Claude Code by Anthropic",
            Self::Copilot => "GitHub Copilot",
            Self::Codex => "OpenAI Codex",
            Self::Gemini => "Google Gemini",
        }
    }
}

impl fmt::Display for AgentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentName {
    type Err = AgentboxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|a| a.as_str() == s).ok_or_else(|| AgentboxError::UnknownAgent {
            name: s.to_string(),
        })
    }
}
