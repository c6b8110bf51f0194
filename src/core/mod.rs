//! Core types shared by every agentbox module
//!
//! At the moment this is the error system:
//! - [`AgentboxError`] - one variant per failure category of the agent subsystem
//! - [`ErrorContext`] - user-facing wrapper with details and a suggestion
//! - [`user_friendly_error`] - convert any `anyhow::Error` for CLI display
//!
//! Library code returns [`Result`] (typed errors); the CLI layer wraps them in
//! `anyhow` with extra context and renders them through [`user_friendly_error`].

pub mod error;

pub use error::{AgentboxError, ErrorContext, Result, user_friendly_error};
