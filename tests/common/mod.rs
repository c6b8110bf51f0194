//! Common test utilities for agentbox integration tests
//!
//! A [`MockUpstream`] stands in for both release hosts: the claude bucket is
//! served under `/bucket` and the hosted-git release pages at the root.

// Not every test module uses every helper
#![allow(dead_code)]

use agentbox::agents::http::HttpPolicy;
use agentbox::agents::{AgentRegistry, Arch, InstallationStore, Manager, ProgressFn, ReleaseHosts};
use agentbox::config::StateHandle;
use agentbox::test_utils::sha256_hex;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mock release hosts backed by one wiremock server.
pub struct MockUpstream {
    pub server: MockServer,
}

impl MockUpstream {
    pub async fn start() -> Self {
        agentbox::test_utils::init_test_logging(None);
        Self {
            server: MockServer::start().await,
        }
    }

    /// Host configuration pointing every agent at this server.
    pub fn hosts(&self) -> ReleaseHosts {
        ReleaseHosts {
            bucket_url: format!("{}/bucket", self.server.uri()),
            github_url: self.server.uri(),
        }
    }

    /// Built-in agent table for x64 talking to this server.
    pub fn registry(&self) -> AgentRegistry {
        AgentRegistry::builtin(Arch::X64, &self.hosts(), &HttpPolicy::new().unwrap())
    }

    /// Mounts `/bucket/latest` answering `version`.
    pub async fn mount_bucket_latest(&self, version: &str) {
        Mock::given(method("GET"))
            .and(path("/bucket/latest"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!("{version}\n")))
            .mount(&self.server)
            .await;
    }

    /// Mounts a bucket release whose manifest publishes `checksum` for
    /// linux-x64 and whose binary download returns `binary`.
    pub async fn mount_bucket_release(&self, version: &str, checksum: &str, binary: &[u8]) {
        let manifest = serde_json::json!({
            "version": version,
            "buildDate": "2025-12-01T00:00:00Z",
            "platforms": {
                "linux-x64": { "checksum": checksum, "size": binary.len() },
                "linux-arm64": { "checksum": "0000", "size": 1 }
            }
        });

        Mock::given(method("GET"))
            .and(path(format!("/bucket/{version}/manifest.json")))
            .respond_with(ResponseTemplate::new(200).set_body_json(manifest))
            .mount(&self.server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/bucket/{version}/linux-x64/claude")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(binary.to_vec()))
            .mount(&self.server)
            .await;
    }

    /// Latest version plus a correctly checksummed binary.
    pub async fn mount_claude(&self, version: &str, binary: &[u8]) {
        self.mount_bucket_latest(version).await;
        self.mount_bucket_release(version, &sha256_hex(binary), binary).await;
    }

    /// Mounts the `releases/latest` redirect of `repo` to `tag`.
    pub async fn mount_latest_tag(&self, repo: &str, tag: &str) {
        Mock::given(method("HEAD"))
            .and(path(format!("/{repo}/releases/latest")))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("Location", format!("{}/{repo}/releases/tag/{tag}", self.server.uri())),
            )
            .mount(&self.server)
            .await;
    }

    /// Mounts a release asset download.
    pub async fn mount_asset(&self, repo: &str, tag: &str, asset: &str, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(format!("/{repo}/releases/download/{tag}/{asset}")))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }
}

/// Manager over `registry` with its cache and state under `temp`.
pub fn manager_in(temp: &TempDir, registry: AgentRegistry) -> Manager {
    let state = StateHandle::open(temp.path().join("state.json"), "x64").unwrap();
    Manager::new(registry, InstallationStore::new(temp.path().join("bin"))).with_state(state)
}

/// Permission bits of `path`.
#[cfg(unix)]
pub fn mode(path: &Path) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path).unwrap().permissions().mode() & 0o777
}

/// Names of the entries directly under `dir`, sorted.
pub fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Progress callback that cancels `cancel` once the first body chunk has
/// arrived, so the next read observes the cancellation mid-stream.
pub fn cancel_after_first_chunk(cancel: &CancellationToken) -> ProgressFn {
    let cancel = cancel.clone();
    Arc::new(move |done, _| {
        if done > 0 {
            cancel.cancel();
        }
    })
}
