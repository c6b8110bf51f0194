//! Latest-version strategies.
//!
//! Two shapes cover every agent:
//!
//! - [`BucketResolver`]: `GET <bucket>/latest`, the body is the version.
//! - [`GitHubReleaseResolver`]: `HEAD <github>/<owner>/<repo>/releases/latest`
//!   without following the redirect; the tag is read from `Location`.
//!   This avoids the rate-limited hosted-git API.

use super::http::HttpPolicy;
use super::store::is_version_name;
use crate::core::{AgentboxError, Result};
use crate::version::VersionComparator;
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::LOCATION;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Answers "what is the latest version of this agent?".
#[async_trait]
pub trait ReleaseResolver: Send + Sync {
    /// Canonical latest version (tag prefix already stripped).
    async fn latest_version(&self, cancel: &CancellationToken) -> Result<String>;
}

/// Resolver for a release bucket serving a `latest` object.
pub struct BucketResolver {
    http: HttpPolicy,
    bucket_url: String,
}

impl BucketResolver {
    /// Resolver for `<bucket_url>/latest`.
    pub fn new(http: HttpPolicy, bucket_url: impl Into<String>) -> Self {
        Self {
            http,
            bucket_url: bucket_url.into(),
        }
    }
}

#[async_trait]
impl ReleaseResolver for BucketResolver {
    async fn latest_version(&self, cancel: &CancellationToken) -> Result<String> {
        let url = format!("{}/latest", self.bucket_url);
        let body = self.http.get_text(&url, cancel).await?;
        let version = checked_version(&url, body.trim_end())?;
        debug!("Resolved {} to {}", url, version);
        Ok(version)
    }
}

/// Resolver for a hosted-git repository's "latest release" redirect.
pub struct GitHubReleaseResolver {
    http: HttpPolicy,
    github_url: String,
    repo: &'static str,
    tag_prefix: &'static str,
}

impl GitHubReleaseResolver {
    /// Resolver for `<github_url>/<repo>/releases/latest`, where `repo` is
    /// `owner/name`. Tags have `tag_prefix` stripped.
    pub fn new(
        http: HttpPolicy,
        github_url: impl Into<String>,
        repo: &'static str,
        tag_prefix: &'static str,
    ) -> Self {
        Self {
            http,
            github_url: github_url.into(),
            repo,
            tag_prefix,
        }
    }
}

#[async_trait]
impl ReleaseResolver for GitHubReleaseResolver {
    async fn latest_version(&self, cancel: &CancellationToken) -> Result<String> {
        let tag = fetch_latest_tag(&self.http, &self.github_url, self.repo, cancel).await?;
        let url = format!("{}/{}/releases/latest", self.github_url, self.repo);
        let version = checked_version(&url, VersionComparator::canonicalize(&tag, self.tag_prefix))?;
        debug!("Resolved {} tag {} to {}", self.repo, tag, version);
        Ok(version)
    }
}

/// Reads the latest release tag of `repo` from the release redirect.
///
/// # Errors
///
/// - [`AgentboxError::UpstreamStatus`] unless the answer is 301 or 302
/// - [`AgentboxError::ProtocolShape`] when `Location` is missing or does
///   not contain exactly one `/tag/` segment
pub async fn fetch_latest_tag(
    http: &HttpPolicy,
    github_url: &str,
    repo: &str,
    cancel: &CancellationToken,
) -> Result<String> {
    let url = format!("{github_url}/{repo}/releases/latest");
    let (status, headers) = http.head_no_redirect(&url, cancel).await?;

    if status != StatusCode::FOUND && status != StatusCode::MOVED_PERMANENTLY {
        return Err(AgentboxError::UpstreamStatus {
            url,
            status: status.to_string(),
        });
    }

    let location = headers
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AgentboxError::ProtocolShape {
            url: url.clone(),
            reason: "no redirect location".to_string(),
        })?;

    parse_tag(location).map(str::to_string).ok_or_else(|| AgentboxError::ProtocolShape {
        url,
        reason: format!("unexpected redirect URL: {location}"),
    })
}

/// Upstream versions become directory names, so anything that is not a
/// single plain path component is rejected.
fn checked_version(url: &str, version: &str) -> Result<String> {
    if version.is_empty() {
        return Err(AgentboxError::ProtocolShape {
            url: url.to_string(),
            reason: "empty version".to_string(),
        });
    }
    if !is_version_name(version) {
        return Err(AgentboxError::ProtocolShape {
            url: url.to_string(),
            reason: format!("invalid version: {version:?}"),
        });
    }
    Ok(version.to_string())
}

fn parse_tag(location: &str) -> Option<&str> {
    let parts: Vec<&str> = location.split("/tag/").collect();
    match parts.as_slice() {
        [_, tag] if !tag.is_empty() => Some(*tag),
        _ => None,
    }
}
