//! Process-wide HTTP policy and cancellable body streaming.
//!
//! Every upstream request goes through [`HttpPolicy`]: one timeout, one
//! user agent, and two clients (redirects followed for downloads, not
//! followed for release-redirect probes). Every send and every body chunk
//! races the caller's [`CancellationToken`]; cancellation surfaces as
//! [`AgentboxError::Network`] with the reason `cancelled`.

use crate::constants::{HTTP_TIMEOUT, USER_AGENT};
use crate::core::{AgentboxError, Result};
use crate::utils::progress::ProgressFn;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::header::HeaderMap;
use reqwest::{Client, RequestBuilder, Response, StatusCode, redirect};
use std::pin::Pin;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Shared request settings for all upstream channels.
#[derive(Debug, Clone)]
pub struct HttpPolicy {
    follow: Client,
    no_follow: Client,
}

impl HttpPolicy {
    /// Policy with the default 5 minute timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(HTTP_TIMEOUT)
    }

    /// Policy with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let build = |policy: redirect::Policy| {
            Client::builder()
                .user_agent(USER_AGENT)
                .timeout(timeout)
                .redirect(policy)
                .build()
                .map_err(|e| AgentboxError::Network {
                    url: String::new(),
                    reason: format!("failed to build HTTP client: {e}"),
                })
        };

        Ok(Self {
            follow: build(redirect::Policy::default())?,
            no_follow: build(redirect::Policy::none())?,
        })
    }

    /// `GET url`, following redirects. Anything but `200 OK` is an
    /// [`AgentboxError::UpstreamStatus`].
    pub async fn get(&self, url: &str, cancel: &CancellationToken) -> Result<Response> {
        debug!("GET {}", url);
        let response = send(self.follow.get(url), url, cancel).await?;
        if response.status() != StatusCode::OK {
            return Err(AgentboxError::UpstreamStatus {
                url: url.to_string(),
                status: response.status().to_string(),
            });
        }
        Ok(response)
    }

    /// `HEAD url` without following redirects. Returns the raw status and
    /// headers for the caller to interpret.
    pub async fn head_no_redirect(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<(StatusCode, HeaderMap)> {
        debug!("HEAD {} (no redirect)", url);
        let response = send(self.no_follow.head(url), url, cancel).await?;
        Ok((response.status(), response.headers().clone()))
    }

    /// `GET url` and read the whole body as text.
    pub async fn get_text(&self, url: &str, cancel: &CancellationToken) -> Result<String> {
        let response = self.get(url, cancel).await?;
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(cancelled(url)),
            text = response.text() => text.map_err(|e| network(url, &e)),
        }
    }
}

async fn send(request: RequestBuilder, url: &str, cancel: &CancellationToken) -> Result<Response> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(cancelled(url)),
        response = request.send() => response.map_err(|e| network(url, &e)),
    }
}

fn network(url: &str, error: &reqwest::Error) -> AgentboxError {
    let reason = if error.is_timeout() {
        "timed out".to_string()
    } else {
        error.to_string()
    };
    AgentboxError::Network {
        url: url.to_string(),
        reason,
    }
}

fn cancelled(url: &str) -> AgentboxError {
    AgentboxError::Network {
        url: url.to_string(),
        reason: "cancelled".to_string(),
    }
}

/// A response body read chunk by chunk with progress reporting.
///
/// The callback receives the cumulative count of raw body bytes and the
/// advertised content length (or the caller's hint when the upstream sent
/// none).
pub struct BodyStream {
    url: String,
    stream: Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>,
    downloaded: u64,
    total: Option<u64>,
    progress: ProgressFn,
}

impl BodyStream {
    /// Wraps `response`. `total_hint` is used when the response has no
    /// `Content-Length`.
    pub fn new(url: &str, response: Response, total_hint: Option<u64>, progress: ProgressFn) -> Self {
        let total = response.content_length().or(total_hint);
        Self {
            url: url.to_string(),
            stream: Box::pin(response.bytes_stream()),
            downloaded: 0,
            total,
            progress,
        }
    }

    /// Next chunk, or `None` at end of body.
    pub async fn next_chunk(&mut self, cancel: &CancellationToken) -> Result<Option<Bytes>> {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(cancelled(&self.url)),
            next = self.stream.next() => next,
        };

        match next {
            None => Ok(None),
            Some(Err(e)) => Err(network(&self.url, &e)),
            Some(Ok(chunk)) => {
                self.downloaded += chunk.len() as u64;
                (self.progress)(self.downloaded, self.total);
                Ok(Some(chunk))
            }
        }
    }

    /// Bytes received so far.
    pub fn downloaded(&self) -> u64 {
        self.downloaded
    }
}
