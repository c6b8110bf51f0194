//! Error handling for agentbox
//!
//! The error system follows two rules:
//! 1. **Strongly-typed errors** ([`AgentboxError`]) so callers can react to a
//!    specific failure category (a checksum mismatch is not a network blip).
//! 2. **User-friendly messages** ([`ErrorContext`]) with a suggestion for the CLI.
//!
//! # Error Categories
//!
//! - **Platform**: [`AgentboxError::UnsupportedPlatform`]
//! - **Network**: [`AgentboxError::Network`], [`AgentboxError::UpstreamStatus`]
//! - **Upstream content**: [`AgentboxError::ProtocolShape`],
//!   [`AgentboxError::ChecksumMismatch`], [`AgentboxError::ArchiveContent`]
//! - **Local storage**: [`AgentboxError::FileSystem`], [`AgentboxError::StateParse`]
//! - **Preconditions**: [`AgentboxError::UnknownAgent`],
//!   [`AgentboxError::VersionNotInstalled`]
//!
//! # Examples
//!
//! ```rust,no_run
//! use agentbox::core::{AgentboxError, user_friendly_error};
//!
//! let err = AgentboxError::UnknownAgent { name: "cursor".to_string() };
//! let ctx = user_friendly_error(anyhow::Error::from(err));
//! ctx.display(); // colored error with a suggestion
//! ```

use colored::Colorize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for agent acquisition and version management.
///
/// Every variant maps to one failure category. Network-level failures
/// (including timeouts and cancellation) are kept apart from upstream
/// status failures so the CLI can tell "you are offline" from "the release
/// host answered 500".
#[derive(Error, Debug)]
pub enum AgentboxError {
    /// The host CPU architecture has no published agent builds.
    #[error("unsupported architecture: {arch}")]
    UnsupportedPlatform {
        /// Architecture token reported by the host
        arch: String,
    },

    /// Transport-level HTTP failure: connect, read, timeout or cancellation.
    #[error("request to {url} failed: {reason}")]
    Network {
        /// URL of the failed request
        url: String,
        /// Transport failure description
        reason: String,
    },

    /// Upstream answered with a status the channel does not accept.
    #[error("unexpected status from {url}: {status}")]
    UpstreamStatus {
        /// URL of the request
        url: String,
        /// Status line, e.g. `500 Internal Server Error`
        status: String,
    },

    /// Upstream response is structurally invalid.
    #[error("invalid response from {url}: {reason}")]
    ProtocolShape {
        /// URL of the request
        url: String,
        /// What was wrong with the response
        reason: String,
    },

    /// Downloaded bytes do not hash to the published checksum.
    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Checksum published by the upstream manifest
        expected: String,
        /// Checksum of the bytes actually received
        actual: String,
    },

    /// The archive was read to the end without the expected binary.
    #[error("binary '{binary}' not found in archive")]
    ArchiveContent {
        /// Entry name that was searched for
        binary: String,
    },

    /// Any stat / mkdir / write / rename / chmod / remove failure.
    #[error("failed to {operation} {}", path.display())]
    FileSystem {
        /// Operation that failed (e.g. "create directory")
        operation: String,
        /// Path the operation was applied to
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The state file exists but is not valid JSON.
    #[error("invalid state file {}", path.display())]
    StateParse {
        /// Path of the state file
        path: PathBuf,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// The agent name is not one of the registered agents.
    #[error("unknown agent: {name}")]
    UnknownAgent {
        /// Name given by the caller
        name: String,
    },

    /// The requested version has no directory in the installation store.
    #[error("version {version} not installed for {agent}")]
    VersionNotInstalled {
        /// Agent name
        agent: String,
        /// Requested version
        version: String,
    },
}

impl AgentboxError {
    /// Shorthand for [`AgentboxError::FileSystem`].
    pub fn fs(operation: impl Into<String>, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileSystem {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }

    /// Returns `true` for failures caused by the network or the release host,
    /// as opposed to local storage or caller mistakes.
    #[must_use]
    pub const fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::Network { .. }
                | Self::UpstreamStatus { .. }
                | Self::ProtocolShape { .. }
                | Self::ChecksumMismatch { .. }
                | Self::ArchiveContent { .. }
        )
    }
}

/// Result alias used throughout the agent subsystem.
pub type Result<T, E = AgentboxError> = std::result::Result<T, E>;

/// An error message plus optional details and a suggestion for the user.
#[derive(Debug)]
pub struct ErrorContext {
    /// Main error message
    pub message: String,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new context from any displayable error.
    #[must_use]
    pub fn new(error: impl fmt::Display) -> Self {
        Self {
            message: error.to_string(),
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the context to stderr: error in red, details in yellow,
    /// suggestion in green.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.message);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] with a suggestion.
///
/// Known [`AgentboxError`] variants anywhere in the chain get a tailored
/// suggestion; anything else is rendered with its full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let message = render_chain(&error);

    if let Some(agentbox_error) = error.chain().find_map(|e| e.downcast_ref::<AgentboxError>()) {
        return create_error_context(message, agentbox_error);
    }

    let permission_denied = error
        .downcast_ref::<std::io::Error>()
        .is_some_and(|e| e.kind() == std::io::ErrorKind::PermissionDenied);
    if permission_denied {
        return ErrorContext::new(message)
            .with_suggestion("Check ownership and permissions of ~/.agentbox");
    }

    ErrorContext::new(message)
}

fn render_chain(error: &anyhow::Error) -> String {
    let mut message = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    message
}

fn create_error_context(message: String, error: &AgentboxError) -> ErrorContext {
    match error {
        AgentboxError::UnsupportedPlatform { .. } => ErrorContext::new(message)
            .with_suggestion("Run agentbox on an x86_64 or aarch64 Linux/macOS host")
            .with_details("Agent builds are only published for x64 and arm64"),

        AgentboxError::Network { .. } => ErrorContext::new(message)
            .with_suggestion("Check your internet connection and retry"),

        AgentboxError::UpstreamStatus { .. } | AgentboxError::ProtocolShape { .. } => {
            ErrorContext::new(message)
                .with_suggestion("The release host may be having problems; retry later")
        }

        AgentboxError::ChecksumMismatch { .. } => ErrorContext::new(message)
            .with_suggestion("Retry the update; the partial download was discarded")
            .with_details("The downloaded binary did not match the checksum published by the release manifest"),

        AgentboxError::ArchiveContent { .. } => ErrorContext::new(message)
            .with_details("The release asset layout changed upstream"),

        AgentboxError::FileSystem { .. } => ErrorContext::new(message)
            .with_suggestion("Check free disk space and permissions of ~/.agentbox"),

        AgentboxError::StateParse { path, .. } => ErrorContext::new(message).with_suggestion(
            format!("Remove {} and run 'agentbox agents update' to rebuild it", path.display()),
        ),

        AgentboxError::UnknownAgent { .. } => ErrorContext::new(message)
            .with_suggestion("Known agents are: claude, copilot, codex, gemini"),

        AgentboxError::VersionNotInstalled { agent, .. } => ErrorContext::new(message)
            .with_suggestion(format!("Run 'agentbox agents list {agent}' to see installed versions")),
    }
}
