//! Shared utilities
//!
//! # Modules
//!
//! - [`fs`] - File system helpers with atomic writes and staging paths
//! - [`progress`] - Download progress bars and the [`ProgressFn`] callback type
//!
//! # Example
//!
//! ```rust,no_run
//! use agentbox::utils::{atomic_write, ensure_dir};
//! use std::path::Path;
//!
//! # fn example() -> agentbox::core::Result<()> {
//! ensure_dir(Path::new("/tmp/agentbox/bin"))?;
//! atomic_write(Path::new("/tmp/agentbox/state.json"), b"{}")?;
//! # Ok(())
//! # }
//! ```

pub mod fs;
pub mod progress;

pub use fs::{atomic_write, ensure_dir};
pub use progress::{MultiProgress, ProgressBar, ProgressFn};
