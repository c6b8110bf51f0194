//! File system helpers used by the installation store and the fetchers.
//!
//! All helpers return [`AgentboxError::FileSystem`] so callers can tell local
//! storage failures from upstream failures.
//!
//! # Key Features
//!
//! - **Atomic writes**: temp-and-rename so readers never see partial content
//! - **Staging paths**: `<file>.tmp` siblings for downloads published by rename
//! - **Best-effort removal**: for cleanup paths that must never escalate

use crate::constants::STAGING_SUFFIX;
use crate::core::{AgentboxError, Result};
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Ensures a directory exists, creating it and all parent directories if necessary.
///
/// # Errors
///
/// Fails if the path exists but is not a directory, or creation fails.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(|e| AgentboxError::fs("create directory", path, e))?;
    } else if !path.is_dir() {
        return Err(AgentboxError::fs(
            "use as directory",
            path,
            std::io::Error::new(std::io::ErrorKind::AlreadyExists, "path exists but is not a directory"),
        ));
    }
    Ok(())
}

/// Returns the staging sibling of `path`: the same name with `.tmp` appended.
///
/// ```rust
/// use agentbox::utils::fs::staging_path;
/// use std::path::Path;
///
/// assert_eq!(staging_path(Path::new("/cache/claude")), Path::new("/cache/claude.tmp"));
/// ```
#[must_use]
pub fn staging_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(STAGING_SUFFIX);
    path.with_file_name(name)
}

/// Atomically writes bytes to a file using a write-then-rename strategy.
///
/// 1. Write content to the staging sibling (see [`staging_path`])
/// 2. Sync it to disk
/// 3. Rename it over the target
///
/// Parent directories are created if missing. On failure the staging file is
/// removed.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }

    let temp_path = staging_path(path);
    let written = (|| -> Result<()> {
        let mut file = fs::File::create(&temp_path)
            .map_err(|e| AgentboxError::fs("create temp file", &temp_path, e))?;
        file.write_all(content)
            .map_err(|e| AgentboxError::fs("write temp file", &temp_path, e))?;
        file.sync_all().map_err(|e| AgentboxError::fs("sync temp file", &temp_path, e))?;
        fs::rename(&temp_path, path).map_err(|e| AgentboxError::fs("rename temp file to", path, e))
    })();

    if written.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    written
}

/// Sets `rwxr-xr-x` on a file. No-op on non-Unix platforms.
pub fn set_executable(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))
            .map_err(|e| AgentboxError::fs("set permissions on", path, e))?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

/// Removes a file, treating "not found" as success.
pub fn remove_file_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(AgentboxError::fs("remove", path, e)),
    }
}

/// Recursively removes a directory, logging instead of failing.
///
/// Returns `true` if the directory is gone afterwards (including when it never
/// existed).
pub fn remove_dir_best_effort(path: &Path) -> bool {
    match fs::remove_dir_all(path) {
        Ok(()) => true,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
        Err(e) => {
            warn!("Failed to remove {}: {}", path.display(), e);
            false
        }
    }
}
