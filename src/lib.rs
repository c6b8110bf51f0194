//! agentbox - sandboxed container workspace for AI coding agents
//!
//! agentbox prepares a container recipe for a project and keeps a per-user
//! cache of AI coding agent binaries that the container mounts read-only.
//! This crate is the library behind the `agentbox` binary.
//!
//! # Architecture Overview
//!
//! - [`agents`] - platform probe, release resolvers, fetchers, the on-disk
//!   installation store and the [`agents::Manager`] that orchestrates them
//! - [`config`] - cache paths and the persisted agent state
//! - [`skeleton`] - the embedded container recipe written by `init`
//! - [`cli`] - clap commands dispatching to the manager
//! - [`core`] - error types and user-facing error rendering
//! - [`utils`] - filesystem and progress helpers
//! - [`version`] - numeric version ordering
//!
//! # Cache Layout
//!
//! ```text
//! ~/.agentbox/
//! ├── state.json
//! └── bin/
//!     ├── claude/
//!     │   ├── 2.0.76/claude
//!     │   └── current
//!     ├── copilot/
//!     ├── codex/
//!     └── gemini/
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use agentbox::agents::{AgentRegistry, Arch, InstallationStore, Manager, ReleaseHosts};
//! use agentbox::agents::http::HttpPolicy;
//! use agentbox::utils::progress;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let http = HttpPolicy::new()?;
//! let registry = AgentRegistry::builtin(Arch::detect()?, &ReleaseHosts::default(), &http);
//! let mut manager = Manager::new(registry, InstallationStore::new("/tmp/agentbox/bin"));
//!
//! let version = manager.install("codex", progress::silent(), &CancellationToken::new()).await?;
//! println!("codex {version} installed");
//! # Ok(())
//! # }
//! ```

// Agent acquisition and version management
pub mod agents;
pub mod config;
pub mod version;

// Command-line surface
pub mod cli;
pub mod skeleton;

// Supporting modules
pub mod constants;
pub mod core;
pub mod utils;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
