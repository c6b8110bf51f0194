//! On-disk installation store.
//!
//! ```text
//! <bin>/
//! └── <agent>/
//!     ├── <version>/<binary>   one directory per installed version
//!     └── current              "<version>\n"
//! ```
//!
//! `current` is a regular file rather than a symlink: container runtimes
//! backed by a VM filesystem cache have been seen serving stale symlink
//! targets, while a rewritten file is read fresh.
//!
//! `set_current` is not atomic. Readers treat an empty or malformed
//! `current` as "no current version".

use super::AgentName;
use crate::constants::CURRENT_FILE_NAME;
use crate::core::{AgentboxError, Result};
use crate::utils::fs::{ensure_dir, remove_dir_best_effort, remove_file_if_exists};
use crate::version::VersionComparator;
use std::path::PathBuf;
use tracing::{debug, info};

/// Installed agent versions under one `bin` directory.
#[derive(Debug, Clone)]
pub struct InstallationStore {
    bin_dir: PathBuf,
}

impl InstallationStore {
    /// Store rooted at `bin_dir` (normally `~/.agentbox/bin`).
    pub fn new(bin_dir: impl Into<PathBuf>) -> Self {
        Self {
            bin_dir: bin_dir.into(),
        }
    }

    /// Directory holding every version of `agent`.
    pub fn agent_dir(&self, agent: AgentName) -> PathBuf {
        self.bin_dir.join(agent.as_str())
    }

    /// Directory of one installed version.
    pub fn version_dir(&self, agent: AgentName, version: &str) -> PathBuf {
        self.agent_dir(agent).join(version)
    }

    /// Location of the current-version file.
    pub fn current_file(&self, agent: AgentName) -> PathBuf {
        self.agent_dir(agent).join(CURRENT_FILE_NAME)
    }

    /// Whether `version` has a directory in the store.
    pub fn is_installed(&self, agent: AgentName, version: &str) -> bool {
        is_version_name(version) && self.version_dir(agent, version).is_dir()
    }

    /// Makes `version` current by rewriting the `current` file.
    ///
    /// # Errors
    ///
    /// [`AgentboxError::VersionNotInstalled`] when `version` cannot name a
    /// version directory; the existing pointer is left untouched.
    pub fn set_current(&self, agent: AgentName, version: &str) -> Result<()> {
        if !is_version_name(version) {
            return Err(AgentboxError::VersionNotInstalled {
                agent: agent.to_string(),
                version: version.to_string(),
            });
        }
        let path = self.current_file(agent);
        ensure_dir(&self.agent_dir(agent))?;
        remove_file_if_exists(&path)?;
        std::fs::write(&path, format!("{version}\n")).map_err(|e| AgentboxError::fs("write", &path, e))?;
        info!("Set current {} version to {}", agent, version);
        Ok(())
    }

    /// Version named by the `current` file.
    ///
    /// `None` when the file is missing, unreadable, empty, or holds
    /// something that cannot be a version directory name.
    pub fn read_current(&self, agent: AgentName) -> Option<String> {
        let content = std::fs::read_to_string(self.current_file(agent)).ok()?;
        let version = content.trim();
        is_version_name(version).then(|| version.to_string())
    }

    /// Installed versions newest first, plus the current version.
    pub fn list_versions(&self, agent: AgentName) -> Result<(Vec<String>, Option<String>)> {
        let agent_dir = self.agent_dir(agent);
        let entries = match std::fs::read_dir(&agent_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok((Vec::new(), None)),
            Err(e) => return Err(AgentboxError::fs("read directory", &agent_dir, e)),
        };

        let mut versions = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| AgentboxError::fs("read directory", &agent_dir, e))?;
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if name == CURRENT_FILE_NAME || !entry.path().is_dir() {
                continue;
            }
            versions.push(name);
        }

        VersionComparator::sort_newest_first(&mut versions);
        Ok((versions, self.read_current(agent)))
    }

    /// Removes all but the `keep` newest versions. Returns how many were
    /// removed; directories that cannot be removed are skipped.
    pub fn prune(&self, agent: AgentName, keep: usize) -> Result<usize> {
        let (versions, _) = self.list_versions(agent)?;
        if versions.len() <= keep {
            return Ok(0);
        }

        let mut removed = 0;
        for version in &versions[keep..] {
            if remove_dir_best_effort(&self.version_dir(agent, version)) {
                debug!("Pruned {} {}", agent, version);
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// Whether `version` is usable as a single directory name under an agent
/// directory.
///
/// Rejects empty strings, `.` and `..`, the pointer file's own name, path
/// separators and whitespace.
///
/// ```rust
/// use agentbox::agents::store::is_version_name;
///
/// assert!(is_version_name("2.0.76"));
/// assert!(!is_version_name(".."));
/// assert!(!is_version_name("../x"));
/// ```
pub fn is_version_name(version: &str) -> bool {
    !version.is_empty()
        && version != "."
        && version != ".."
        && version != CURRENT_FILE_NAME
        && !version.contains(&['/', '\\'][..])
        && !version.chars().any(char::is_whitespace)
}
