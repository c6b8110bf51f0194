//! Manager flows over the built-in agent table and mock release hosts.

use crate::common::{MockUpstream, cancel_after_first_chunk, dir_entries, manager_in};
use agentbox::agents::AgentName;
use agentbox::config::State;
use agentbox::core::AgentboxError;
use agentbox::test_utils::{seed_versions, sha256_hex, tar_gz};
use agentbox::utils::progress;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::ResponseTemplate;

async fn mount_copilot(upstream: &MockUpstream, version: &str, payload: &[u8]) {
    let tag = format!("v{version}");
    upstream.mount_latest_tag("github/copilot-cli", &tag).await;
    upstream
        .mount_asset(
            "github/copilot-cli",
            &tag,
            "copilot-linux-x64.tar.gz",
            ResponseTemplate::new(200).set_body_bytes(tar_gz(&[("copilot", payload)])),
        )
        .await;
}

async fn mount_gemini(upstream: &MockUpstream, version: &str) {
    let tag = format!("v{version}");
    upstream.mount_latest_tag("google-gemini/gemini-cli", &tag).await;
    upstream
        .mount_asset(
            "google-gemini/gemini-cli",
            &tag,
            "gemini.js",
            ResponseTemplate::new(200).set_body_string("console.log('gemini')\n"),
        )
        .await;
}

#[tokio::test]
async fn test_fresh_install_of_bucket_agent() {
    let upstream = MockUpstream::start().await;
    upstream.mount_claude("1.2.3", b"claude binary").await;

    let temp = TempDir::new().unwrap();
    let mut manager = manager_in(&temp, upstream.registry());

    let version = manager.install("claude", progress::silent(), &CancellationToken::new()).await.unwrap();

    assert_eq!(version, "1.2.3");
    let store = manager.store();
    let binary = store.version_dir(AgentName::Claude, "1.2.3").join("claude");
    assert_eq!(std::fs::read(&binary).unwrap(), b"claude binary");
    #[cfg(unix)]
    assert_eq!(crate::common::mode(&binary), 0o755);
    assert_eq!(std::fs::read_to_string(store.current_file(AgentName::Claude)).unwrap(), "1.2.3\n");
    assert_eq!(dir_entries(&store.version_dir(AgentName::Claude, "1.2.3")), ["claude"]);

    let state = State::load(&temp.path().join("state.json")).unwrap();
    assert_eq!(state.arch, "x64");
    assert_eq!(state.agents["claude"].version, "1.2.3");
    assert_eq!(state.agents["claude"].variant, "glibc");
}

#[tokio::test]
async fn test_checksum_mismatch_keeps_previous_current() {
    let upstream = MockUpstream::start().await;
    upstream.mount_bucket_latest("1.2.3").await;
    upstream.mount_bucket_release("1.2.3", &sha256_hex(b"published"), b"served").await;

    let temp = TempDir::new().unwrap();
    let mut manager = manager_in(&temp, upstream.registry());
    seed_versions(manager.store(), AgentName::Claude, "claude", &["1.2.2"]);
    manager.switch_version("claude", "1.2.2").unwrap();

    let err = manager.install("claude", progress::silent(), &CancellationToken::new()).await.unwrap_err();

    assert!(matches!(err, AgentboxError::ChecksumMismatch { .. }));
    let store = manager.store();
    assert!(!store.version_dir(AgentName::Claude, "1.2.3").exists());
    assert_eq!(store.read_current(AgentName::Claude).as_deref(), Some("1.2.2"));
}

#[tokio::test]
async fn test_tar_archive_install() {
    let upstream = MockUpstream::start().await;
    mount_copilot(&upstream, "0.4.0", b"copilot bytes").await;

    let temp = TempDir::new().unwrap();
    let mut manager = manager_in(&temp, upstream.registry());

    let version = manager.install("copilot", progress::silent(), &CancellationToken::new()).await.unwrap();

    assert_eq!(version, "0.4.0");
    let binary = manager.store().version_dir(AgentName::Copilot, "0.4.0").join("copilot");
    assert_eq!(std::fs::read(&binary).unwrap(), b"copilot bytes");
    #[cfg(unix)]
    assert_eq!(crate::common::mode(&binary), 0o755);
}

#[tokio::test]
async fn test_parallel_update_with_one_failure() {
    let upstream = MockUpstream::start().await;
    upstream.mount_claude("2.0.76", b"claude").await;
    mount_copilot(&upstream, "0.0.372", b"copilot").await;
    mount_gemini(&upstream, "0.21.0").await;
    upstream.mount_latest_tag("openai/codex", "rust-v0.77.0").await;
    upstream
        .mount_asset(
            "openai/codex",
            "rust-v0.77.0",
            "codex-x86_64-unknown-linux-gnu.tar.gz",
            ResponseTemplate::new(500),
        )
        .await;

    let temp = TempDir::new().unwrap();
    let mut manager = manager_in(&temp, upstream.registry());
    seed_versions(manager.store(), AgentName::Codex, "codex", &["0.76.0"]);
    manager.switch_version("codex", "0.76.0").unwrap();

    let names: Vec<String> = ["claude", "copilot", "codex", "gemini"].map(String::from).to_vec();
    let results = manager.update(&names, &|_, _| progress::silent(), &CancellationToken::new()).await;

    let agents: Vec<&str> = results.iter().map(|r| r.agent.as_str()).collect();
    assert_eq!(agents, ["claude", "copilot", "codex", "gemini"]);

    let versions: Vec<Option<&str>> = results.iter().map(|r| r.version.as_deref()).collect();
    assert_eq!(versions, [Some("2.0.76"), Some("0.0.372"), None, Some("0.21.0")]);
    assert!(matches!(results[2].error, Some(AgentboxError::UpstreamStatus { .. })));

    let store = manager.store();
    assert_eq!(store.read_current(AgentName::Claude).as_deref(), Some("2.0.76"));
    assert_eq!(store.read_current(AgentName::Copilot).as_deref(), Some("0.0.372"));
    assert_eq!(store.read_current(AgentName::Gemini).as_deref(), Some("0.21.0"));
    assert_eq!(store.read_current(AgentName::Codex).as_deref(), Some("0.76.0"));
    assert!(!store.version_dir(AgentName::Codex, "0.77.0").exists());

    let state = State::load(&temp.path().join("state.json")).unwrap();
    assert_eq!(state.agent_version("gemini"), Some("0.21.0"));
    assert_eq!(state.agents["gemini"].variant, "js");
    assert_eq!(state.agent_version("codex"), Some("0.76.0"));
}

#[tokio::test]
async fn test_update_skips_installed_version() {
    let upstream = MockUpstream::start().await;
    mount_gemini(&upstream, "0.21.0").await;

    let temp = TempDir::new().unwrap();
    let mut manager = manager_in(&temp, upstream.registry());
    seed_versions(manager.store(), AgentName::Gemini, "gemini.js", &["0.21.0"]);

    let names = vec!["gemini".to_string()];
    let results = manager.update(&names, &|_, _| progress::silent(), &CancellationToken::new()).await;

    assert!(results[0].is_success());
    // The seeded placeholder survives because nothing was downloaded
    let script = manager.store().version_dir(AgentName::Gemini, "0.21.0").join("gemini.js");
    assert_eq!(std::fs::read_to_string(script).unwrap(), "0.21.0");
    assert_eq!(manager.store().read_current(AgentName::Gemini).as_deref(), Some("0.21.0"));
}

#[tokio::test]
async fn test_switch_to_absent_version() {
    let upstream = MockUpstream::start().await;
    let temp = TempDir::new().unwrap();
    let mut manager = manager_in(&temp, upstream.registry());
    seed_versions(manager.store(), AgentName::Claude, "claude", &["1.0.0"]);
    manager.switch_version("claude", "1.0.0").unwrap();

    let err = manager.switch_version("claude", "2.0.0").unwrap_err();

    assert!(matches!(
        err,
        AgentboxError::VersionNotInstalled { ref agent, ref version } if agent == "claude" && version == "2.0.0"
    ));
    assert_eq!(manager.store().read_current(AgentName::Claude).as_deref(), Some("1.0.0"));
}

#[tokio::test]
async fn test_status_reports_each_agent() {
    let upstream = MockUpstream::start().await;
    upstream.mount_bucket_latest("2.0.76").await;
    upstream.mount_latest_tag("github/copilot-cli", "v0.0.372").await;
    upstream.mount_latest_tag("openai/codex", "rust-v0.77.0").await;
    // gemini has no mock: the HEAD answers 404

    let temp = TempDir::new().unwrap();
    let mut manager = manager_in(&temp, upstream.registry());
    seed_versions(manager.store(), AgentName::Claude, "claude", &["2.0.76"]);
    seed_versions(manager.store(), AgentName::Codex, "codex", &["0.76.0"]);
    manager.switch_version("claude", "2.0.76").unwrap();
    manager.switch_version("codex", "0.76.0").unwrap();

    let statuses = manager.status(&CancellationToken::new()).await;

    let names: Vec<AgentName> = statuses.iter().map(|s| s.name).collect();
    assert_eq!(names, AgentName::ALL);

    assert!(statuses[0].up_to_date);
    assert_eq!(statuses[1].installed, None);
    assert_eq!(statuses[1].latest.as_deref(), Some("0.0.372"));
    assert!(!statuses[1].up_to_date);
    assert_eq!(statuses[2].installed.as_deref(), Some("0.76.0"));
    assert!(!statuses[2].up_to_date);
    assert!(statuses[3].error.is_some());
}

#[tokio::test]
async fn test_cleanup_after_update() {
    let upstream = MockUpstream::start().await;
    upstream.mount_claude("2.1.0", b"claude").await;

    let temp = TempDir::new().unwrap();
    let mut manager = manager_in(&temp, upstream.registry());
    seed_versions(
        manager.store(),
        AgentName::Claude,
        "claude",
        &["1.0.0", "1.1.0", "1.2.0", "2.0.0", "2.0.1"],
    );

    let names = vec!["claude".to_string()];
    let results = manager.update(&names, &|_, _| progress::silent(), &CancellationToken::new()).await;
    assert!(results[0].is_success());

    assert_eq!(manager.cleanup_all(), 1);
    let (versions, current) = manager.list_versions("claude").unwrap();
    assert_eq!(versions, ["2.1.0", "2.0.1", "2.0.0", "1.2.0", "1.1.0"]);
    assert_eq!(current.as_deref(), Some("2.1.0"));
}

#[tokio::test]
async fn test_install_cancelled_mid_download() {
    let upstream = MockUpstream::start().await;
    let binary = vec![0x7f; 128 * 1024];
    upstream.mount_bucket_latest("2.0.76").await;
    upstream.mount_bucket_release("2.0.76", &sha256_hex(&binary), &binary).await;

    let temp = TempDir::new().unwrap();
    let mut manager = manager_in(&temp, upstream.registry());
    seed_versions(manager.store(), AgentName::Claude, "claude", &["2.0.75"]);
    manager.switch_version("claude", "2.0.75").unwrap();

    let cancel = CancellationToken::new();
    let err = manager.install("claude", cancel_after_first_chunk(&cancel), &cancel).await.unwrap_err();

    assert!(matches!(err, AgentboxError::Network { ref reason, .. } if reason == "cancelled"));
    let store = manager.store();
    assert!(!store.version_dir(AgentName::Claude, "2.0.76").exists());
    assert_eq!(store.read_current(AgentName::Claude).as_deref(), Some("2.0.75"));
    assert_eq!(dir_entries(&store.agent_dir(AgentName::Claude)), ["2.0.75", "current"]);
}
