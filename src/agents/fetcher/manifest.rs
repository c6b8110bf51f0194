//! Manifest + raw binary download with SHA-256 verification.
//!
//! ```text
//! GET <bucket>/<version>/manifest.json
//!     { "version", "buildDate", "platforms": { "linux-x64": { "checksum", "size" } } }
//! GET <bucket>/<version>/linux-<arch>/<binary>
//! ```
//!
//! The binary is streamed into `<binary>.tmp` while being hashed, checked
//! against the manifest, marked executable and renamed into place.

use super::{Fetcher, publish, stream_to_file};
use crate::agents::http::{BodyStream, HttpPolicy};
use crate::agents::platform::Arch;
use crate::core::{AgentboxError, Result};
use crate::utils::fs::{ensure_dir, remove_file_if_exists, staging_path};
use crate::utils::progress::ProgressFn;
use async_trait::async_trait;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Release manifest published next to every bucket version.
#[derive(Debug, Deserialize)]
pub struct ReleaseManifest {
    /// Version the manifest describes
    #[serde(default)]
    pub version: String,
    /// Build timestamp as published
    #[serde(rename = "buildDate", default)]
    pub build_date: String,
    /// Per-platform binaries keyed by `linux-<arch>`
    pub platforms: HashMap<String, PlatformEntry>,
}

/// One platform's binary in a [`ReleaseManifest`].
#[derive(Debug, Deserialize)]
pub struct PlatformEntry {
    /// Hex-encoded SHA-256 of the binary
    pub checksum: String,
    /// Binary size in bytes
    #[serde(default)]
    pub size: u64,
}

/// Fetcher for a bucket that publishes manifests and raw binaries.
pub struct ManifestFetcher {
    http: HttpPolicy,
    bucket_url: String,
    arch: Arch,
    binary: &'static str,
}

impl ManifestFetcher {
    /// Fetcher for `binary` under `bucket_url`, for the `arch` platform.
    pub fn new(http: HttpPolicy, bucket_url: impl Into<String>, arch: Arch, binary: &'static str) -> Self {
        Self {
            http,
            bucket_url: bucket_url.into(),
            arch,
            binary,
        }
    }

    fn platform(&self) -> String {
        format!("linux-{}", self.arch)
    }

    async fn fetch_manifest(&self, version: &str, cancel: &CancellationToken) -> Result<ReleaseManifest> {
        let url = format!("{}/{}/manifest.json", self.bucket_url, version);
        let body = self.http.get_text(&url, cancel).await?;
        serde_json::from_str(&body).map_err(|e| AgentboxError::ProtocolShape {
            url,
            reason: format!("malformed manifest: {e}"),
        })
    }
}

#[async_trait]
impl Fetcher for ManifestFetcher {
    async fn download(
        &self,
        version: &str,
        dest_dir: &Path,
        progress: ProgressFn,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let manifest = self.fetch_manifest(version, cancel).await?;
        let platform = self.platform();
        let entry = manifest.platforms.get(&platform).ok_or_else(|| AgentboxError::ProtocolShape {
            url: format!("{}/{}/manifest.json", self.bucket_url, version),
            reason: format!("platform {platform} not found in manifest"),
        })?;
        if !manifest.version.is_empty() && manifest.version != version {
            warn!("Manifest for {} describes version {}", version, manifest.version);
        }

        let url = format!("{}/{}/{}/{}", self.bucket_url, version, platform, self.binary);
        let response = self.http.get(&url, cancel).await?;

        ensure_dir(dest_dir)?;
        let target = dest_dir.join(self.binary);
        let staging = staging_path(&target);
        let size_hint = (entry.size > 0).then_some(entry.size);
        let mut body = BodyStream::new(&url, response, size_hint, progress);

        info!("Downloading {} ({} bytes expected)", url, entry.size);
        let mut hasher = Sha256::new();
        stream_to_file(&mut body, &staging, Some(&mut hasher), cancel).await?;

        let actual = hex::encode(hasher.finalize());
        if !actual.eq_ignore_ascii_case(&entry.checksum) {
            let _ = remove_file_if_exists(&staging);
            return Err(AgentboxError::ChecksumMismatch {
                expected: entry.checksum.clone(),
                actual,
            });
        }
        debug!("Checksum verified for {}", url);

        publish(&staging, &target, true)
    }
}
