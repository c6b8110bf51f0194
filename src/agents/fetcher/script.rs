//! Raw script asset download.
//!
//! The asset is streamed to `<binary>.tmp` and renamed into place. No
//! permission change: the file is run by an interpreter.

use super::{Fetcher, publish, release_asset_url, stream_to_file};
use crate::agents::http::{BodyStream, HttpPolicy};
use crate::core::Result;
use crate::utils::fs::{ensure_dir, staging_path};
use crate::utils::progress::ProgressFn;
use async_trait::async_trait;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Fetcher for a single-file release asset.
pub struct ScriptFetcher {
    http: HttpPolicy,
    github_url: String,
    repo: &'static str,
    tag_prefix: &'static str,
    asset: &'static str,
}

impl ScriptFetcher {
    /// Fetcher for `asset` in `repo`'s releases. The asset is stored under
    /// its own name.
    pub fn new(
        http: HttpPolicy,
        github_url: impl Into<String>,
        repo: &'static str,
        tag_prefix: &'static str,
        asset: &'static str,
    ) -> Self {
        Self {
            http,
            github_url: github_url.into(),
            repo,
            tag_prefix,
            asset,
        }
    }
}

#[async_trait]
impl Fetcher for ScriptFetcher {
    async fn download(
        &self,
        version: &str,
        dest_dir: &Path,
        progress: ProgressFn,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let url = release_asset_url(&self.github_url, self.repo, self.tag_prefix, version, self.asset);
        let response = self.http.get(&url, cancel).await?;

        ensure_dir(dest_dir)?;
        let target = dest_dir.join(self.asset);
        let staging = staging_path(&target);

        info!("Downloading {}", url);
        let mut body = BodyStream::new(&url, response, None, progress);
        stream_to_file(&mut body, &staging, None, cancel).await?;

        publish(&staging, &target, false)
    }
}
