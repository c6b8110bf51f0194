//! Advisory state record persisted as `state.json`.
//!
//! The record is a cache for fast status rendering. The installation store
//! layout stays authoritative: a missing or stale record never changes what
//! is installed or current.
//!
//! # Format
//!
//! ```json
//! {
//!   "arch": "x64",
//!   "agents": {
//!     "claude": {
//!       "version": "2.0.76",
//!       "variant": "glibc",
//!       "installed_at": "2025-01-01T00:00:00Z"
//!     }
//!   }
//! }
//! ```
//!
//! An absent file and an absent or `null` `agents` map both load as empty.

use crate::core::{AgentboxError, Result};
use crate::utils::fs::atomic_write;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Installed version record for one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentState {
    /// Version selected as current
    pub version: String,
    /// Binary ABI class of the install
    pub variant: String,
    /// When the version was installed or switched to
    pub installed_at: DateTime<Utc>,
}

/// The whole state file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    /// Host architecture token the cache was populated for
    #[serde(default)]
    pub arch: String,
    /// Per-agent records, keyed by agent name
    #[serde(default, deserialize_with = "null_as_empty")]
    pub agents: BTreeMap<String, AgentState>,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<String, AgentState>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<BTreeMap<String, AgentState>>::deserialize(deserializer)?.unwrap_or_default())
}

impl State {
    /// Loads the record from `path`. A missing file yields an empty record.
    ///
    /// # Errors
    ///
    /// - [`AgentboxError::FileSystem`] if the file exists but cannot be read
    /// - [`AgentboxError::StateParse`] if the content is not a valid record
    pub fn load(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No state file at {}, starting empty", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(AgentboxError::fs("read", path, e)),
        };

        serde_json::from_str(&content).map_err(|source| AgentboxError::StateParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Writes the record to `path` as pretty JSON, atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut json = serde_json::to_vec_pretty(self).map_err(|source| AgentboxError::StateParse {
            path: path.to_path_buf(),
            source,
        })?;
        json.push(b'\n');
        atomic_write(path, &json)
    }

    /// Records `version` as the current version of `agent`, stamped now.
    pub fn set_agent(&mut self, agent: &str, version: &str, variant: &str) {
        self.agents.insert(
            agent.to_string(),
            AgentState {
                version: version.to_string(),
                variant: variant.to_string(),
                installed_at: Utc::now(),
            },
        );
    }

    /// Recorded version for `agent`, if any.
    pub fn agent_version(&self, agent: &str) -> Option<&str> {
        self.agents.get(agent).map(|a| a.version.as_str())
    }
}

/// A [`State`] bound to its file. Every [`record`](Self::record) is saved
/// immediately.
#[derive(Debug)]
pub struct StateHandle {
    path: PathBuf,
    state: State,
}

impl StateHandle {
    /// Loads the record at `path` and stamps it with `arch`.
    pub fn open(path: impl Into<PathBuf>, arch: &str) -> Result<Self> {
        let path = path.into();
        let mut state = State::load(&path)?;
        state.arch = arch.to_string();
        Ok(Self { path, state })
    }

    /// Current in-memory record.
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Updates one agent's entry and persists the record.
    pub fn record(&mut self, agent: &str, version: &str, variant: &str) -> Result<()> {
        self.state.set_agent(agent, version, variant);
        self.save()
    }

    /// Persists the record as it is.
    pub fn save(&self) -> Result<()> {
        self.state.save(&self.path)
    }
}
