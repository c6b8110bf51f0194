//! Download shapes: checksummed binary, tar-gzip archive, raw script.

use crate::common::{MockUpstream, cancel_after_first_chunk, dir_entries};
use agentbox::agents::ProgressFn;
use agentbox::core::AgentboxError;
use agentbox::test_utils::{sha256_hex, tar_gz};
use agentbox::utils::progress;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

fn recording() -> (ProgressFn, Arc<Mutex<Vec<(u64, Option<u64>)>>>) {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let sink = calls.clone();
    let callback: ProgressFn = Arc::new(move |done, total| sink.lock().unwrap().push((done, total)));
    (callback, calls)
}

#[tokio::test]
async fn test_manifest_download_verifies_checksum() {
    let upstream = MockUpstream::start().await;
    let binary = b"\x7fELF claude build".to_vec();
    upstream.mount_bucket_release("1.2.3", &sha256_hex(&binary), &binary).await;

    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("claude/1.2.3");
    let (callback, calls) = recording();

    let registry = upstream.registry();
    let agent = registry.lookup("claude").unwrap();
    agent.fetcher.download("1.2.3", &dest, callback, &CancellationToken::new()).await.unwrap();

    assert_eq!(std::fs::read(dest.join("claude")).unwrap(), binary);
    assert_eq!(dir_entries(&dest), ["claude"]);
    #[cfg(unix)]
    assert_eq!(crate::common::mode(&dest.join("claude")), 0o755);

    let calls = calls.lock().unwrap();
    let (done, _) = calls.last().copied().unwrap();
    assert_eq!(done, binary.len() as u64);
}

#[tokio::test]
async fn test_manifest_download_checksum_mismatch() {
    let upstream = MockUpstream::start().await;
    upstream.mount_bucket_release("1.2.3", &sha256_hex(b"expected bytes"), b"tampered bytes").await;

    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("claude/1.2.3");

    let registry = upstream.registry();
    let err = registry
        .lookup("claude")
        .unwrap()
        .fetcher
        .download("1.2.3", &dest, progress::silent(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, AgentboxError::ChecksumMismatch { .. }));
    assert!(!dest.join("claude").exists());
    assert!(!dest.join("claude.tmp").exists());
}

#[tokio::test]
async fn test_manifest_without_platform() {
    let upstream = MockUpstream::start().await;
    let manifest = serde_json::json!({
        "version": "1.2.3",
        "platforms": { "darwin-arm64": { "checksum": "abc", "size": 3 } }
    });
    Mock::given(method("GET"))
        .and(path("/bucket/1.2.3/manifest.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(manifest))
        .mount(&upstream.server)
        .await;

    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("claude/1.2.3");

    let registry = upstream.registry();
    let err = registry
        .lookup("claude")
        .unwrap()
        .fetcher
        .download("1.2.3", &dest, progress::silent(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(
        matches!(err, AgentboxError::ProtocolShape { ref reason, .. } if reason.contains("linux-x64")),
        "unexpected error: {err}"
    );
    assert!(!dest.exists());
}

#[tokio::test]
async fn test_malformed_manifest() {
    let upstream = MockUpstream::start().await;
    Mock::given(method("GET"))
        .and(path("/bucket/1.2.3/manifest.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&upstream.server)
        .await;

    let temp = TempDir::new().unwrap();
    let registry = upstream.registry();
    let err = registry
        .lookup("claude")
        .unwrap()
        .fetcher
        .download("1.2.3", &temp.path().join("dest"), progress::silent(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, AgentboxError::ProtocolShape { .. }));
}

#[tokio::test]
async fn test_archive_download_extracts_binary() {
    let upstream = MockUpstream::start().await;
    let payload = b"#!/bin/sh\necho copilot\n";
    let archive = tar_gz(&[("README.md", b"docs".as_slice()), ("copilot", payload.as_slice())]);
    upstream
        .mount_asset(
            "github/copilot-cli",
            "v0.4.0",
            "copilot-linux-x64.tar.gz",
            ResponseTemplate::new(200).set_body_bytes(archive.clone()),
        )
        .await;

    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("copilot/0.4.0");
    let (callback, calls) = recording();

    let registry = upstream.registry();
    registry
        .lookup("copilot")
        .unwrap()
        .fetcher
        .download("0.4.0", &dest, callback, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(std::fs::read(dest.join("copilot")).unwrap(), payload);
    assert_eq!(dir_entries(&dest), ["copilot"]);
    #[cfg(unix)]
    assert_eq!(crate::common::mode(&dest.join("copilot")), 0o755);

    // Progress counts compressed body bytes
    let (done, _) = calls.lock().unwrap().last().copied().unwrap();
    assert_eq!(done, archive.len() as u64);
}

#[tokio::test]
async fn test_archive_download_renames_codex_entry() {
    let upstream = MockUpstream::start().await;
    let archive = tar_gz(&[("codex-x86_64-unknown-linux-gnu", b"codex-bin".as_slice())]);
    upstream
        .mount_asset(
            "openai/codex",
            "rust-v0.77.0",
            "codex-x86_64-unknown-linux-gnu.tar.gz",
            ResponseTemplate::new(200).set_body_bytes(archive),
        )
        .await;

    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("codex/0.77.0");

    let registry = upstream.registry();
    registry
        .lookup("codex")
        .unwrap()
        .fetcher
        .download("0.77.0", &dest, progress::silent(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(std::fs::read(dest.join("codex")).unwrap(), b"codex-bin");
}

#[tokio::test]
async fn test_archive_without_binary() {
    let upstream = MockUpstream::start().await;
    let archive = tar_gz(&[("docs/copilot.md", b"not a binary".as_slice())]);
    upstream
        .mount_asset(
            "github/copilot-cli",
            "v0.4.0",
            "copilot-linux-x64.tar.gz",
            ResponseTemplate::new(200).set_body_bytes(archive),
        )
        .await;

    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("copilot/0.4.0");

    let registry = upstream.registry();
    let err = registry
        .lookup("copilot")
        .unwrap()
        .fetcher
        .download("0.4.0", &dest, progress::silent(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, AgentboxError::ArchiveContent { ref binary } if binary == "copilot"));
    assert!(!dest.join("copilot").exists());
}

#[tokio::test]
async fn test_script_download() {
    let upstream = MockUpstream::start().await;
    let script = b"#!/usr/bin/env node\nconsole.log('gemini')\n";
    upstream
        .mount_asset(
            "google-gemini/gemini-cli",
            "v0.21.0",
            "gemini.js",
            ResponseTemplate::new(200).set_body_bytes(script.to_vec()),
        )
        .await;

    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("gemini/0.21.0");

    let registry = upstream.registry();
    registry
        .lookup("gemini")
        .unwrap()
        .fetcher
        .download("0.21.0", &dest, progress::silent(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(std::fs::read(dest.join("gemini.js")).unwrap(), script);
    assert_eq!(dir_entries(&dest), ["gemini.js"]);
}

#[tokio::test]
async fn test_http_error_leaves_destination_untouched() {
    let upstream = MockUpstream::start().await;
    upstream
        .mount_asset("google-gemini/gemini-cli", "v0.21.0", "gemini.js", ResponseTemplate::new(404))
        .await;

    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("gemini/0.21.0");

    let registry = upstream.registry();
    let err = registry
        .lookup("gemini")
        .unwrap()
        .fetcher
        .download("0.21.0", &dest, progress::silent(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, AgentboxError::UpstreamStatus { .. }));
    assert!(!dest.exists());
}

#[tokio::test]
async fn test_script_download_cancelled_mid_stream() {
    let upstream = MockUpstream::start().await;
    upstream
        .mount_asset(
            "google-gemini/gemini-cli",
            "v0.21.0",
            "gemini.js",
            ResponseTemplate::new(200).set_body_bytes(vec![b'x'; 64 * 1024]),
        )
        .await;

    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("gemini/0.21.0");
    let cancel = CancellationToken::new();

    let registry = upstream.registry();
    let err = registry
        .lookup("gemini")
        .unwrap()
        .fetcher
        .download("0.21.0", &dest, cancel_after_first_chunk(&cancel), &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, AgentboxError::Network { ref reason, .. } if reason == "cancelled"));
    assert!(!dest.join("gemini.js").exists());
    assert!(!dest.join("gemini.js.tmp").exists());
}

#[tokio::test]
async fn test_archive_download_cancelled_mid_stream() {
    let upstream = MockUpstream::start().await;
    let archive = tar_gz(&[("copilot", vec![7u8; 256 * 1024].as_slice())]);
    upstream
        .mount_asset(
            "github/copilot-cli",
            "v0.4.0",
            "copilot-linux-x64.tar.gz",
            ResponseTemplate::new(200).set_body_bytes(archive),
        )
        .await;

    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("copilot/0.4.0");
    let cancel = CancellationToken::new();

    let registry = upstream.registry();
    let download = registry
        .lookup("copilot")
        .unwrap()
        .fetcher
        .download("0.4.0", &dest, cancel_after_first_chunk(&cancel), &cancel);
    // Both the body pump and the blocking extractor must unwind
    let err = tokio::time::timeout(std::time::Duration::from_secs(10), download)
        .await
        .expect("archive download did not unwind after cancellation")
        .unwrap_err();

    assert!(matches!(err, AgentboxError::Network { ref reason, .. } if reason == "cancelled"));
    assert!(!dest.join("copilot").exists());
}
