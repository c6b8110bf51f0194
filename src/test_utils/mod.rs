//! Test utilities for agentbox
//!
//! Helpers shared by unit tests and the integration suite (enabled there
//! through the `test-utils` feature):
//! - Logging set up once per test binary
//! - In-memory release assets (tar-gzip archives, checksums)
//! - Pre-seeded installation stores
//!
//! # Example
//!
//! ```rust,no_run
//! use agentbox::test_utils::{init_test_logging, tar_gz};
//!
//! init_test_logging(None);
//! let asset = tar_gz(&[("copilot", b"#!/bin/sh\n".as_slice())]);
//! assert!(!asset.is_empty());
//! ```

use crate::agents::{AgentName, InstallationStore};
use flate2::Compression;
use flate2::write::GzEncoder;
use sha2::{Digest, Sha256};
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Uses `level` when given, otherwise `RUST_LOG`. With neither, logging
/// stays off.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

/// Builds a gzip-compressed tarball with one regular file per entry.
///
/// # Panics
/// Panics if the in-memory archive cannot be written
pub fn tar_gz(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (path, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder.append_data(&mut header, path, *data).expect("append tar entry");
    }
    builder.into_inner().and_then(|gz| gz.finish()).expect("finish tarball")
}

/// Lowercase hex SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Creates version directories (each holding a dummy `binary`) without
/// touching `current`.
///
/// # Panics
/// Panics if the directories cannot be created
pub fn seed_versions(store: &InstallationStore, agent: AgentName, binary: &str, versions: &[&str]) {
    for version in versions {
        let dir = store.version_dir(agent, version);
        std::fs::create_dir_all(&dir).expect("create version directory");
        std::fs::write(dir.join(binary), version.as_bytes()).expect("write dummy binary");
    }
}
