//! Run settings resolved once from CLI flags and the environment.
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::Cli;

/// Per-package time limit applied in CI.
pub const CI_PACKAGE_TIMEOUT: Duration = Duration::from_secs(900);

/// Conflict-handling flags for the reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct Mode {
    /// Prompt on conflicts.
    pub interactive: bool,
    /// Back up and replace conflicting targets without asking.
    pub force_overwrite: bool,
    /// Append to mergeable targets instead of linking.
    pub append: bool,
    /// Never prompt, regardless of `interactive`.
    pub non_interactive: bool,
}

impl Mode {
    /// Whether prompts may be shown.
    #[must_use]
    pub const fn prompts_enabled(&self) -> bool {
        self.interactive && !self.non_interactive
    }

    /// Whether the append policy applies; `force_overwrite` takes precedence.
    #[must_use]
    pub const fn appends(&self) -> bool {
        self.append && !self.force_overwrite
    }
}

/// Everything the driver needs to know about this run.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Conflict-handling flags.
    pub mode: Mode,
    /// Skip the package manager, packages and tools.
    pub skip_packages: bool,
    /// Whether the run is under CI.
    pub ci: bool,
    /// Provisioning repository root.
    pub root: PathBuf,
    /// Home directory targets are relative to.
    pub home: PathBuf,
    /// Time limit for each package install, if any.
    pub package_timeout: Option<Duration>,
}

impl Settings {
    /// Resolve settings from parsed flags. Returns the settings together
    /// with any validation warnings the caller should log.
    #[must_use]
    pub fn resolve(cli: &Cli, ci: bool, root: PathBuf, home: PathBuf) -> (Self, Vec<String>) {
        let mut warnings = Vec::new();
        if cli.force_overwrite && cli.append {
            warnings.push(
                "--force-overwrite and --append both set; conflicting files will be overwritten"
                    .to_string(),
            );
        }

        let non_interactive = cli.non_interactive || ci;
        let mode = Mode {
            interactive: !non_interactive,
            force_overwrite: cli.force_overwrite,
            append: cli.append,
            non_interactive,
        };

        let settings = Self {
            mode,
            skip_packages: cli.skip_packages,
            ci,
            root,
            home,
            package_timeout: ci.then_some(CI_PACKAGE_TIMEOUT),
        };
        (settings, warnings)
    }
}
