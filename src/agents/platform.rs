//! Host architecture probe.
//!
//! Agents publish builds for two architectures. The canonical tokens are
//! `x64` and `arm64`; [`Arch::rust_arch`] projects them onto the target
//! triple vocabulary for channels that name assets that way.

use crate::core::{AgentboxError, Result};
use std::fmt;

/// A supported CPU architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    /// 64-bit x86
    X64,
    /// 64-bit ARM
    Arm64,
}

impl Arch {
    /// Probes the architecture this binary was built for.
    ///
    /// # Errors
    ///
    /// [`AgentboxError::UnsupportedPlatform`] on anything but x86_64 and
    /// aarch64.
    pub fn detect() -> Result<Self> {
        Self::from_token(std::env::consts::ARCH)
    }

    /// Maps an architecture token to its canonical value.
    ///
    /// Accepts both the toolchain spelling (`x86_64`, `aarch64`) and the
    /// common distribution spelling (`amd64`, `arm64`).
    ///
    /// ```rust
    /// use agentbox::agents::Arch;
    ///
    /// assert_eq!(Arch::from_token("amd64").unwrap(), Arch::X64);
    /// assert_eq!(Arch::from_token("arm64").unwrap(), Arch::Arm64);
    /// assert!(Arch::from_token("riscv64").is_err());
    /// ```
    pub fn from_token(token: &str) -> Result<Self> {
        match token {
            "x86_64" | "amd64" | "x64" => Ok(Self::X64),
            "aarch64" | "arm64" => Ok(Self::Arm64),
            other => Err(AgentboxError::UnsupportedPlatform {
                arch: other.to_string(),
            }),
        }
    }

    /// Canonical token (`x64` / `arm64`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::X64 => "x64",
            Self::Arm64 => "arm64",
        }
    }

    /// Target triple spelling (`x86_64` / `aarch64`).
    #[must_use]
    pub const fn rust_arch(self) -> &'static str {
        match self {
            Self::X64 => "x86_64",
            Self::Arm64 => "aarch64",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
