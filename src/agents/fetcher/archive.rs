//! Tar-gzip release asset holding a single binary entry.
//!
//! The HTTP body is pumped chunk by chunk into a bounded channel. A blocking
//! task reads the channel through `flate2` and `tar`, so decompression is
//! streaming and never buffers the whole asset. Progress counts raw body
//! bytes, before decompression.
//!
//! The binary is written under its final name; the fetcher removes it on
//! failure and the manager removes the version directory.

use super::{Fetcher, release_asset_url};
use crate::agents::http::{BodyStream, HttpPolicy};
use crate::constants::ARCHIVE_CHANNEL_CAPACITY;
use crate::core::{AgentboxError, Result};
use crate::utils::fs::{ensure_dir, remove_file_if_exists, set_executable};
use crate::utils::progress::ProgressFn;
use async_trait::async_trait;
use bytes::{Buf, Bytes};
use flate2::read::GzDecoder;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Fetcher for a `.tar.gz` asset containing the agent binary.
pub struct ArchiveFetcher {
    http: HttpPolicy,
    github_url: String,
    repo: &'static str,
    tag_prefix: &'static str,
    asset: String,
    entry: String,
    binary: &'static str,
}

impl ArchiveFetcher {
    /// Fetcher for `asset` in `repo`'s releases. The archive entry whose
    /// basename is `entry` is stored as `binary`.
    pub fn new(
        http: HttpPolicy,
        github_url: impl Into<String>,
        repo: &'static str,
        tag_prefix: &'static str,
        asset: impl Into<String>,
        entry: impl Into<String>,
        binary: &'static str,
    ) -> Self {
        Self {
            http,
            github_url: github_url.into(),
            repo,
            tag_prefix,
            asset: asset.into(),
            entry: entry.into(),
            binary,
        }
    }
}

#[async_trait]
impl Fetcher for ArchiveFetcher {
    async fn download(
        &self,
        version: &str,
        dest_dir: &Path,
        progress: ProgressFn,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let url = release_asset_url(&self.github_url, self.repo, self.tag_prefix, version, &self.asset);
        let response = self.http.get(&url, cancel).await?;

        ensure_dir(dest_dir)?;
        let target = dest_dir.join(self.binary);

        info!("Downloading {}", url);
        let body = BodyStream::new(&url, response, None, progress);
        let extracted = stream_extract(body, url, self.entry.clone(), target.clone(), cancel).await;

        if extracted.is_err() {
            let _ = remove_file_if_exists(&target);
        }
        extracted
    }
}

/// Pumps `body` into a blocking extractor and waits for both.
///
/// A transport failure wins over the extractor's error, since a truncated
/// stream makes the extractor fail too.
async fn stream_extract(
    mut body: BodyStream,
    url: String,
    entry: String,
    target: PathBuf,
    cancel: &CancellationToken,
) -> Result<()> {
    let (tx, rx) = mpsc::channel::<Bytes>(ARCHIVE_CHANNEL_CAPACITY);

    let extractor_target = target.clone();
    let extractor_url = url.clone();
    let extractor = tokio::task::spawn_blocking(move || {
        extract_entry(ChannelReader::new(rx), &extractor_url, &entry, &extractor_target)
    });

    let mut transport_error = None;
    loop {
        match body.next_chunk(cancel).await {
            Ok(Some(chunk)) => {
                // A closed channel means the extractor is done
                if tx.send(chunk).await.is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                transport_error = Some(e);
                break;
            }
        }
    }
    drop(tx);

    let extracted = extractor.await.map_err(|e| {
        AgentboxError::fs("extract archive into", &target, std::io::Error::other(e.to_string()))
    })?;

    match transport_error {
        Some(e) => Err(e),
        None => {
            debug!("Extracted {} bytes of {} from {}", body.downloaded(), target.display(), url);
            extracted
        }
    }
}

/// Scans the archive for a regular file whose basename is `entry` and copies
/// it to `target` with mode `0o755`.
fn extract_entry(reader: impl Read, url: &str, entry: &str, target: &Path) -> Result<()> {
    let invalid = |e: std::io::Error| AgentboxError::ProtocolShape {
        url: url.to_string(),
        reason: format!("invalid archive: {e}"),
    };

    let mut archive = tar::Archive::new(GzDecoder::new(reader));
    for item in archive.entries().map_err(invalid)? {
        let mut item = item.map_err(invalid)?;
        if !item.header().entry_type().is_file() {
            continue;
        }

        let path = item.path().map_err(invalid)?;
        if path.file_name().is_none_or(|name| name != entry) {
            continue;
        }

        let mut out = std::fs::File::create(target).map_err(|e| AgentboxError::fs("create", target, e))?;
        let mut buf = vec![0u8; 64 * 1024];
        loop {
            let n = item.read(&mut buf).map_err(invalid)?;
            if n == 0 {
                break;
            }
            out.write_all(&buf[..n]).map_err(|e| AgentboxError::fs("write", target, e))?;
        }
        out.sync_all().map_err(|e| AgentboxError::fs("sync", target, e))?;
        drop(out);

        set_executable(target)?;
        return Ok(());
    }

    Err(AgentboxError::ArchiveContent {
        binary: entry.to_string(),
    })
}

/// Blocking [`Read`] over a channel of body chunks.
struct ChannelReader {
    rx: mpsc::Receiver<Bytes>,
    current: Bytes,
}

impl ChannelReader {
    fn new(rx: mpsc::Receiver<Bytes>) -> Self {
        Self {
            rx,
            current: Bytes::new(),
        }
    }
}

impl Read for ChannelReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while !self.current.has_remaining() {
            match self.rx.blocking_recv() {
                Some(chunk) => self.current = chunk,
                None => return Ok(0),
            }
        }
        let n = buf.len().min(self.current.remaining());
        self.current.copy_to_slice(&mut buf[..n]);
        Ok(n)
    }
}
