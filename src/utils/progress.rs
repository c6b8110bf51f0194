//! Progress indicators for agent downloads
//!
//! Thin wrappers around `indicatif` with a consistent style. The agent
//! subsystem never sees these types directly: fetchers report through a
//! [`ProgressFn`] callback, and the CLI turns a [`ProgressBar`] into one with
//! [`ProgressBar::callback`].
//!
//! # Environment Variables
//!
//! - `AGENTBOX_NO_PROGRESS`: Set to any value to disable all progress indicators
//!   (read by the CLI through the `--no-progress` flag)
//!
//! # Examples
//!
//! ```rust
//! use agentbox::utils::progress::MultiProgress;
//!
//! let multi = MultiProgress::new(false); // hidden, e.g. in CI
//! let bar = multi.add_download("claude 2.0.76");
//! let report = bar.callback();
//!
//! report(1024, Some(4096));
//! report(4096, Some(4096));
//! bar.finish();
//! ```

use indicatif::{ProgressBar as IndicatifBar, ProgressDrawTarget, ProgressStyle as IndicatifStyle};
use std::sync::Arc;

/// Byte-progress callback handed to fetchers.
///
/// Called with `(bytes_so_far, total)`. `total` is `None` when the upstream
/// did not announce a size.
pub type ProgressFn = Arc<dyn Fn(u64, Option<u64>) + Send + Sync>;

/// A callback that ignores every report.
#[must_use]
pub fn silent() -> ProgressFn {
    Arc::new(|_, _| {})
}

/// A single download progress bar.
///
/// Cloning is cheap; clones drive the same bar.
#[derive(Clone)]
pub struct ProgressBar {
    inner: IndicatifBar,
}

impl ProgressBar {
    /// Creates a byte-oriented download bar with an unknown total.
    ///
    /// The total is filled in by the first report that carries one.
    #[must_use]
    pub fn new_download(label: impl Into<String>) -> Self {
        let bar = IndicatifBar::no_length();
        bar.set_style(ProgressStyle::download());
        bar.set_prefix(label.into());
        Self { inner: bar }
    }

    /// Current byte position.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.inner.position()
    }

    /// Total length, if known.
    #[must_use]
    pub fn length(&self) -> Option<u64> {
        self.inner.length()
    }

    /// Builds a [`ProgressFn`] that drives this bar.
    ///
    /// A known total switches the bar from the byte counter to a full bar.
    #[must_use]
    pub fn callback(&self) -> ProgressFn {
        let bar = self.inner.clone();
        Arc::new(move |done, total| {
            if let Some(total) = total {
                if bar.length() != Some(total) {
                    bar.set_length(total);
                }
            }
            bar.set_position(done);
        })
    }

    /// Marks the download as complete and leaves the bar on screen.
    pub fn finish(&self) {
        self.inner.finish();
    }

    /// Stops the bar where it is, for failed downloads.
    pub fn abandon(&self) {
        self.inner.abandon();
    }
}

/// Progress styles shared by all bars.
pub struct ProgressStyle;

const DOWNLOAD_TEMPLATE: &str =
    "{prefix:.bold.cyan} [{bar:40.cyan/blue}] {percent:>3}% {bytes}/{total_bytes} {bytes_per_sec} ({eta})";

impl ProgressStyle {
    /// Byte-oriented style for downloads.
    ///
    /// ```text
    /// claude 2.0.76 [━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━] 100% 48.2 MiB/48.2 MiB 12.1 MiB/s (0s)
    /// ```
    #[must_use]
    pub fn download() -> IndicatifStyle {
        IndicatifStyle::default_bar()
            .template(DOWNLOAD_TEMPLATE)
            .unwrap_or_else(|_| IndicatifStyle::default_bar())
            .progress_chars("━╸━")
    }
}

/// A container that stacks one download bar per agent.
pub struct MultiProgress {
    inner: indicatif::MultiProgress,
}

impl MultiProgress {
    /// Creates a container. When `enabled` is false every bar is hidden.
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        let inner = indicatif::MultiProgress::new();
        if !enabled {
            inner.set_draw_target(ProgressDrawTarget::hidden());
        }
        Self { inner }
    }

    /// Adds a download bar labelled `label`.
    #[must_use]
    pub fn add_download(&self, label: impl Into<String>) -> ProgressBar {
        let bar = ProgressBar::new_download(label);
        ProgressBar {
            inner: self.inner.add(bar.inner),
        }
    }
}
