//! Version comparison for upstream release tags.
//!
//! Upstream channels publish dotted integer versions (`2.0.76`, `0.0.372`).
//! Ordering is numeric and component-wise; it is intentionally weaker than
//! semver so that nothing upstream can make parsing fail.
//!
//! # Rules
//!
//! - Components are split on `.`.
//! - Each component's leading run of ASCII digits is its value; a component
//!   without leading digits counts as zero (`3-beta` → 3, `rc1` → 0).
//! - Missing trailing components count as zero (`1.2` == `1.2.0`).
//!
//! # Examples
//!
//! ```rust
//! use agentbox::version::comparison::VersionComparator;
//! use std::cmp::Ordering;
//!
//! assert_eq!(VersionComparator::compare("1.10.0", "1.9.0"), Ordering::Greater);
//!
//! let mut versions = vec!["1.0.0".to_string(), "2.1.0".to_string(), "1.2.0".to_string()];
//! VersionComparator::sort_newest_first(&mut versions);
//! assert_eq!(versions, ["2.1.0", "1.2.0", "1.0.0"]);
//! ```

use std::cmp::Ordering;

/// Static helpers for ordering and canonicalising version strings.
pub struct VersionComparator;

impl VersionComparator {
    /// Compare two version strings component-wise.
    ///
    /// The order is total: antisymmetric and transitive, because every string
    /// maps to a single sequence of integers that is compared with implicit
    /// trailing zeros.
    #[must_use]
    pub fn compare(a: &str, b: &str) -> Ordering {
        let parts_a: Vec<u64> = a.split('.').map(component_value).collect();
        let parts_b: Vec<u64> = b.split('.').map(component_value).collect();

        let len = parts_a.len().max(parts_b.len());
        for i in 0..len {
            let num_a = parts_a.get(i).copied().unwrap_or(0);
            let num_b = parts_b.get(i).copied().unwrap_or(0);
            match num_a.cmp(&num_b) {
                Ordering::Equal => continue,
                other => return other,
            }
        }

        Ordering::Equal
    }

    /// Sort versions in place, newest first.
    ///
    /// The sort is stable, so strings that compare equal (`1.2` and `1.2.0`)
    /// keep their relative input order.
    pub fn sort_newest_first(versions: &mut [String]) {
        versions.sort_by(|a, b| Self::compare(b, a));
    }

    /// Strip a release tag prefix to get the canonical version.
    ///
    /// `prefix` is the channel's tag prefix (`v`, `rust-v`). Tags without the
    /// prefix are returned unchanged.
    ///
    /// ```rust
    /// use agentbox::version::comparison::VersionComparator;
    ///
    /// assert_eq!(VersionComparator::canonicalize("rust-v0.77.0", "rust-v"), "0.77.0");
    /// assert_eq!(VersionComparator::canonicalize("0.4.0", "v"), "0.4.0");
    /// ```
    #[must_use]
    pub fn canonicalize<'a>(tag: &'a str, prefix: &str) -> &'a str {
        tag.strip_prefix(prefix).unwrap_or(tag)
    }
}

fn component_value(component: &str) -> u64 {
    let digits_end = component
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(component.len());
    component[..digits_end].parse().unwrap_or(0)
}
