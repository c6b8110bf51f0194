//! Version handling for agent releases.
//!
//! Agent versions are opaque upstream tokens with a leading tag prefix
//! stripped. See [`comparison`] for the ordering used when listing and
//! pruning installed versions.

pub mod comparison;

pub use comparison::VersionComparator;
