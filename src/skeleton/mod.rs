//! Project skeleton written into the working directory by `agentbox init`.
//!
//! The recipe files are compiled into the binary. Two of them belong to
//! agentbox and are rewritten on every init; the local compose override
//! belongs to the user and is only created when absent.

use crate::core::{AgentboxError, Result};
use std::path::Path;
use tracing::debug;

/// An embedded skeleton file.
#[derive(Debug, Clone, Copy)]
pub struct SkeletonFile {
    /// File name relative to the project directory
    pub name: &'static str,
    /// Verbatim file content
    pub content: &'static str,
}

const OVERWRITE_FILES: [SkeletonFile; 2] = [
    SkeletonFile {
        name: "Dockerfile.agentbox",
        content: include_str!("files/Dockerfile.agentbox"),
    },
    SkeletonFile {
        name: "docker-compose.agentbox.yml",
        content: include_str!("files/docker-compose.agentbox.yml"),
    },
];

const USER_FILES: [SkeletonFile; 1] = [SkeletonFile {
    name: "docker-compose.agentbox.local.yml",
    content: include_str!("files/docker-compose.agentbox.local.yml"),
}];

/// Names of the files `init` always overwrites.
pub fn overwrite_files() -> Vec<&'static str> {
    OVERWRITE_FILES.iter().map(|f| f.name).collect()
}

/// Names of every skeleton file, overwritten ones first.
pub fn files() -> Vec<&'static str> {
    OVERWRITE_FILES.iter().chain(USER_FILES.iter()).map(|f| f.name).collect()
}

/// Writes the agentbox-owned files into `dir`, replacing existing copies.
pub fn copy_to(dir: &Path) -> Result<()> {
    for file in &OVERWRITE_FILES {
        let path = dir.join(file.name);
        std::fs::write(&path, file.content).map_err(|e| AgentboxError::fs("write", &path, e))?;
        debug!("Wrote {}", path.display());
    }
    Ok(())
}

/// Creates the user-owned files that do not exist yet in `dir`.
///
/// Returns the names of the files it created.
pub fn copy_user_files_if_missing(dir: &Path) -> Result<Vec<&'static str>> {
    let mut created = Vec::new();
    for file in &USER_FILES {
        let path = dir.join(file.name);
        if path.exists() {
            continue;
        }
        std::fs::write(&path, file.content).map_err(|e| AgentboxError::fs("write", &path, e))?;
        created.push(file.name);
    }
    Ok(created)
}

/// Removes every skeleton file present in `dir`.
///
/// Returns the names that were removed. Missing files are skipped.
pub fn remove_from(dir: &Path) -> Result<Vec<&'static str>> {
    let mut removed = Vec::new();
    for name in files() {
        let path = dir.join(name);
        match std::fs::remove_file(&path) {
            Ok(()) => removed.push(name),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(AgentboxError::fs("remove", &path, e)),
        }
    }
    Ok(removed)
}
