//! Global constants used throughout the agentbox codebase.
//!
//! Timeouts, retention limits and upstream locations live here so the
//! magic numbers are discoverable in one place.

use std::time::Duration;

/// Timeout applied to every upstream HTTP request (5 minutes).
///
/// Covers the slowest release endpoint: a full agent binary download
/// on a poor connection.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(300);

/// User-Agent header sent with every upstream request.
pub const USER_AGENT: &str = "agentbox/1.0";

/// Number of version directories kept per agent after cleanup.
pub const MAX_VERSIONS_TO_KEEP: usize = 5;

/// Name of the per-agent file holding the current version.
pub const CURRENT_FILE_NAME: &str = "current";

/// Suffix of the staging file a binary is written to before publish.
pub const STAGING_SUFFIX: &str = ".tmp";

/// Number of body chunks buffered between the HTTP reader and the
/// archive extractor.
pub const ARCHIVE_CHANNEL_CAPACITY: usize = 16;

/// Release bucket for the claude agent.
pub const CLAUDE_BUCKET_URL: &str = "https://storage.googleapis.com/claude-code-dist-86c565f3-f756-42ad-8dfa-d59b1c096819/claude-code-releases";

/// Hosted-git base URL for release redirects and asset downloads.
pub const GITHUB_URL: &str = "https://github.com";

/// Environment variable that disables progress bars.
pub const NO_PROGRESS_ENV: &str = "AGENTBOX_NO_PROGRESS";
