//! Latest-version resolution over the built-in agent table.

use crate::common::MockUpstream;
use agentbox::core::AgentboxError;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_bucket_latest_is_trimmed() {
    let upstream = MockUpstream::start().await;
    upstream.mount_bucket_latest("2.0.76").await;

    let registry = upstream.registry();
    let version = registry
        .lookup("claude")
        .unwrap()
        .resolver
        .latest_version(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(version, "2.0.76");
}

#[tokio::test]
async fn test_redirect_tags_are_canonicalized() {
    let upstream = MockUpstream::start().await;
    upstream.mount_latest_tag("github/copilot-cli", "v0.0.372").await;
    upstream.mount_latest_tag("openai/codex", "rust-v0.77.0").await;
    upstream.mount_latest_tag("google-gemini/gemini-cli", "v0.21.0").await;

    let registry = upstream.registry();
    let cancel = CancellationToken::new();

    for (agent, expected) in [("copilot", "0.0.372"), ("codex", "0.77.0"), ("gemini", "0.21.0")] {
        let version = registry.lookup(agent).unwrap().resolver.latest_version(&cancel).await.unwrap();
        assert_eq!(version, expected, "agent {agent}");
    }
}

#[tokio::test]
async fn test_redirect_requires_redirect_status() {
    let upstream = MockUpstream::start().await;
    Mock::given(method("HEAD"))
        .and(path("/openai/codex/releases/latest"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&upstream.server)
        .await;

    let registry = upstream.registry();
    let err = registry
        .lookup("codex")
        .unwrap()
        .resolver
        .latest_version(&CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, AgentboxError::UpstreamStatus { ref status, .. } if status.starts_with("200")));
}

#[tokio::test]
async fn test_redirect_without_location() {
    let upstream = MockUpstream::start().await;
    Mock::given(method("HEAD"))
        .and(path("/github/copilot-cli/releases/latest"))
        .respond_with(ResponseTemplate::new(302))
        .mount(&upstream.server)
        .await;

    let registry = upstream.registry();
    let err = registry
        .lookup("copilot")
        .unwrap()
        .resolver
        .latest_version(&CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, AgentboxError::ProtocolShape { .. }));
}

#[tokio::test]
async fn test_bucket_server_error() {
    let upstream = MockUpstream::start().await;
    Mock::given(method("GET"))
        .and(path("/bucket/latest"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&upstream.server)
        .await;

    let registry = upstream.registry();
    let err = registry
        .lookup("claude")
        .unwrap()
        .resolver
        .latest_version(&CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, AgentboxError::UpstreamStatus { .. }));
    assert!(err.is_upstream());
}

#[tokio::test]
async fn test_cancelled_before_request() {
    let upstream = MockUpstream::start().await;
    upstream.mount_bucket_latest("2.0.76").await;

    let cancel = CancellationToken::new();
    cancel.cancel();

    let registry = upstream.registry();
    let err = registry.lookup("claude").unwrap().resolver.latest_version(&cancel).await.unwrap_err();

    assert!(matches!(err, AgentboxError::Network { ref reason, .. } if reason == "cancelled"));
}

#[tokio::test]
async fn test_bucket_latest_must_be_a_plain_version() {
    let upstream = MockUpstream::start().await;
    upstream.mount_bucket_latest("../x").await;

    let registry = upstream.registry();
    let err = registry
        .lookup("claude")
        .unwrap()
        .resolver
        .latest_version(&CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, AgentboxError::ProtocolShape { ref reason, .. } if reason.contains("../x")));
}

#[tokio::test]
async fn test_redirect_tag_must_be_a_plain_version() {
    let upstream = MockUpstream::start().await;
    Mock::given(method("HEAD"))
        .and(path("/openai/codex/releases/latest"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", "https://github.com/openai/codex/releases/tag/.."),
        )
        .mount(&upstream.server)
        .await;

    let registry = upstream.registry();
    let err = registry
        .lookup("codex")
        .unwrap()
        .resolver
        .latest_version(&CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, AgentboxError::ProtocolShape { .. }));
}
