//! Integration test suite for agentbox
//!
//! End-to-end tests against mock release hosts (wiremock) and the compiled
//! binary (assert_cmd). No test touches the network or the real `$HOME`.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **resolver**: latest-version resolution against mock hosts
//! - **fetcher**: the three download shapes and their failure modes
//! - **manager**: install, update, switch and prune flows over the built-in
//!   agent table
//! - **cli**: command-line smoke tests with an isolated `$HOME`

// Shared test utilities (from parent tests/ directory)
#[path = "../common/mod.rs"]
mod common;

mod fetcher;
mod manager;
mod resolver;
