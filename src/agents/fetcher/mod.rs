//! Download strategies.
//!
//! A [`Fetcher`] downloads one version of one agent into a destination
//! directory. Three shapes exist:
//!
//! | Shape      | Agents          | Publish                         | Integrity  |
//! |------------|-----------------|---------------------------------|------------|
//! | [`manifest`] | claude        | staged `.tmp`, chmod, rename    | SHA-256    |
//! | [`archive`]  | copilot, codex | written in place from tar.gz    | none       |
//! | [`script`]   | gemini        | staged `.tmp`, rename           | none       |
//!
//! Every shape removes its own partial artifact on failure. Removing the
//! version directory of a failed attempt is the manager's job.

pub mod archive;
pub mod manifest;
pub mod script;

pub use archive::ArchiveFetcher;
pub use manifest::ManifestFetcher;
pub use script::ScriptFetcher;

use super::http::BodyStream;
use crate::core::{AgentboxError, Result};
use crate::utils::fs::{remove_file_if_exists, set_executable};
use crate::utils::progress::ProgressFn;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

/// Downloads one agent version.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Downloads `version` into `dest_dir`, creating it if needed.
    ///
    /// On success `dest_dir` holds the agent's binary. `progress` is called
    /// for every body chunk.
    async fn download(
        &self,
        version: &str,
        dest_dir: &Path,
        progress: ProgressFn,
        cancel: &CancellationToken,
    ) -> Result<()>;
}

/// Hosted-git release asset URL.
pub(crate) fn release_asset_url(
    github_url: &str,
    repo: &str,
    tag_prefix: &str,
    version: &str,
    asset: &str,
) -> String {
    format!("{github_url}/{repo}/releases/download/{tag_prefix}{version}/{asset}")
}

/// Streams `body` into a new file at `path`, feeding `hasher` when given.
///
/// The file is removed if anything fails.
pub(crate) async fn stream_to_file(
    body: &mut BodyStream,
    path: &Path,
    hasher: Option<&mut Sha256>,
    cancel: &CancellationToken,
) -> Result<()> {
    let written = write_body(body, path, hasher, cancel).await;
    if written.is_err() {
        let _ = remove_file_if_exists(path);
    }
    written
}

async fn write_body(
    body: &mut BodyStream,
    path: &Path,
    mut hasher: Option<&mut Sha256>,
    cancel: &CancellationToken,
) -> Result<()> {
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(|e| AgentboxError::fs("create", path, e))?;

    while let Some(chunk) = body.next_chunk(cancel).await? {
        if let Some(hasher) = hasher.as_deref_mut() {
            hasher.update(&chunk);
        }
        file.write_all(&chunk).await.map_err(|e| AgentboxError::fs("write", path, e))?;
    }

    file.flush().await.map_err(|e| AgentboxError::fs("flush", path, e))?;
    file.sync_all().await.map_err(|e| AgentboxError::fs("sync", path, e))?;
    Ok(())
}

/// Moves a staged file to its final name, optionally marking it executable
/// first. The staged file is removed on failure.
pub(crate) fn publish(staging: &Path, target: &Path, executable: bool) -> Result<()> {
    let published = (|| {
        if executable {
            set_executable(staging)?;
        }
        std::fs::rename(staging, target).map_err(|e| AgentboxError::fs("rename", staging, e))
    })();

    if published.is_err() {
        let _ = remove_file_if_exists(staging);
    }
    published
}
