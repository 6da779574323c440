use std::fmt;

/// Environment variables whose presence marks a CI run.
pub const CI_ENV_VARS: [&str; 2] = ["CI", "GITHUB_ACTIONS"];

/// Detected operating system platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    /// macOS; packages come from Homebrew.
    MacOs,
    /// Linux; packages come from apt.
    Linux,
    /// Anything else; no package manager is supported.
    Other,
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MacOs => write!(f, "macos"),
            Self::Linux => write!(f, "linux"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Platform information for the current system.
#[derive(Debug, Clone)]
pub struct Platform {
    /// Operating system family.
    pub os: Os,
    /// Whether the process runs under a CI service.
    pub is_ci: bool,
}

impl Platform {
    /// Detect the current platform from the compile target and environment.
    #[must_use]
    pub fn detect() -> Self {
        Self {
            os: Self::detect_os(),
            is_ci: is_ci_env(|name| std::env::var_os(name).is_some()),
        }
    }

    /// Create a platform with explicit values.
    #[must_use]
    pub const fn new(os: Os, is_ci: bool) -> Self {
        Self { os, is_ci }
    }

    /// Returns `true` on macOS.
    #[must_use]
    pub fn is_macos(&self) -> bool {
        self.os == Os::MacOs
    }

    /// Returns `true` on Linux.
    #[must_use]
    pub fn is_linux(&self) -> bool {
        self.os == Os::Linux
    }

    fn detect_os() -> Os {
        if cfg!(target_os = "macos") {
            Os::MacOs
        } else if cfg!(target_os = "linux") {
            Os::Linux
        } else {
            Os::Other
        }
    }
}

/// Return `true` if any CI marker variable is present according to `is_set`.
pub fn is_ci_env(is_set: impl Fn(&str) -> bool) -> bool {
    CI_ENV_VARS.iter().any(|name| is_set(name))
}
