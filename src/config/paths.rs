//! Per-user cache locations.

use crate::core::{AgentboxError, Result};
use crate::utils::fs::ensure_dir;
use std::path::{Path, PathBuf};

/// Name of the cache directory under the home directory.
pub const CACHE_DIR_NAME: &str = ".agentbox";

/// Resolved locations of the agentbox cache.
///
/// ```text
/// <root>/
/// ├── state.json
/// └── bin/
///     └── <agent>/...
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    root: PathBuf,
}

impl Paths {
    /// Paths rooted at an explicit directory. Used by tests.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Paths rooted at `$HOME/.agentbox`.
    ///
    /// # Errors
    ///
    /// Fails when the home directory cannot be determined.
    pub fn from_home() -> Result<Self> {
        let home = dirs::home_dir().ok_or_else(|| {
            AgentboxError::fs(
                "resolve home directory",
                "~",
                std::io::Error::new(std::io::ErrorKind::NotFound, "home directory not set"),
            )
        })?;
        Ok(Self::new(home.join(CACHE_DIR_NAME)))
    }

    /// Cache root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Root of the installation store.
    pub fn bin_dir(&self) -> PathBuf {
        self.root.join("bin")
    }

    /// Location of the advisory state record.
    pub fn state_file(&self) -> PathBuf {
        self.root.join("state.json")
    }

    /// Creates the cache root and the installation store root.
    pub fn ensure_dirs(&self) -> Result<()> {
        ensure_dir(&self.bin_dir())
    }
}
