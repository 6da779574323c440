//! Package manager capabilities and the per-package resource.
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use super::script::{RemoteScript, ScriptRunner};
use super::{Applicable, Resource, ResourceChange, ResourceState};
use crate::config::packages::{Package, PackageKind};
use crate::error::ResourceError;
use crate::exec::Executor;
use crate::platform::{Os, Platform};

/// Homebrew's official install script.
pub const HOMEBREW_INSTALL_URL: &str =
    "https://raw.githubusercontent.com/Homebrew/install/HEAD/install.sh";

/// Where the Homebrew installer puts `brew` when it is not yet on `PATH`.
const HOMEBREW_PREFIXES: &[&str] = &["/opt/homebrew/bin/brew", "/usr/local/bin/brew"];

/// A platform package manager.
pub trait PackageInstaller: Send + Sync + std::fmt::Debug {
    /// Manager name for log lines.
    fn name(&self) -> &'static str;

    /// Make the manager usable, installing it if the platform allows.
    ///
    /// # Errors
    ///
    /// Returns an error if the manager is absent and cannot be installed.
    fn bootstrap(&self, scripts: &dyn ScriptRunner) -> Result<()>;

    /// Whether `package` is already installed.
    fn is_installed(&self, package: &Package) -> bool;

    /// Install one package, killing the manager after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the install fails or times out.
    fn install(&self, package: &Package, timeout: Option<Duration>) -> Result<()>;
}

/// Pick the installer for `platform`, if it has one.
#[must_use]
pub fn installer_for(
    platform: &Platform,
    executor: Arc<dyn Executor>,
) -> Option<Arc<dyn PackageInstaller>> {
    match platform.os {
        Os::MacOs => Some(Arc::new(Homebrew::new(executor))),
        Os::Linux => Some(Arc::new(Apt::new(executor))),
        Os::Other => None,
    }
}

/// Homebrew on macOS.
#[derive(Debug, Clone)]
pub struct Homebrew {
    executor: Arc<dyn Executor>,
}

impl Homebrew {
    /// Create a Homebrew installer.
    #[must_use]
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self { executor }
    }

    /// `brew` on `PATH`, or at a standard prefix after a fresh install.
    fn program(&self) -> Option<String> {
        if self.executor.which("brew") {
            return Some("brew".to_string());
        }
        HOMEBREW_PREFIXES
            .iter()
            .find(|p| Path::new(p).exists())
            .map(|p| (*p).to_string())
    }

    fn require_program(&self) -> Result<String> {
        self.program().ok_or_else(|| {
            ResourceError::NoPackageManager {
                platform: Os::MacOs.to_string(),
            }
            .into()
        })
    }
}

impl PackageInstaller for Homebrew {
    fn name(&self) -> &'static str {
        "homebrew"
    }

    fn bootstrap(&self, scripts: &dyn ScriptRunner) -> Result<()> {
        if self.program().is_some() {
            return Ok(());
        }
        scripts.run(&RemoteScript {
            url: HOMEBREW_INSTALL_URL.to_string(),
            shell: "bash",
            args: vec![],
            env: vec![("NONINTERACTIVE".to_string(), "1".to_string())],
        })?;
        self.require_program().map(|_| ())
    }

    fn is_installed(&self, package: &Package) -> bool {
        let Some(brew) = self.program() else {
            return false;
        };
        let kind_flag = match package.kind {
            PackageKind::Standard => "--formula",
            PackageKind::Cask => "--cask",
        };
        self.executor
            .run_unchecked(&brew, &["list", kind_flag, &package.name])
            .is_ok_and(|r| r.success)
    }

    fn install(&self, package: &Package, timeout: Option<Duration>) -> Result<()> {
        let brew = self.require_program()?;
        let mut args = vec!["install"];
        if package.kind == PackageKind::Cask {
            args.push("--cask");
        }
        args.push(&package.name);
        self.executor.run_with_timeout(&brew, &args, timeout)?;
        Ok(())
    }
}

/// apt on Debian-family Linux.
#[derive(Debug, Clone)]
pub struct Apt {
    executor: Arc<dyn Executor>,
}

impl Apt {
    /// Create an apt installer.
    #[must_use]
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self { executor }
    }

    /// Prefix `args` with `sudo` when it is available.
    fn privileged<'a>(&self, args: &[&'a str]) -> (&'static str, Vec<&'a str>) {
        if self.executor.which("sudo") {
            let mut full = vec!["apt-get"];
            full.extend_from_slice(args);
            ("sudo", full)
        } else {
            ("apt-get", args.to_vec())
        }
    }
}

impl PackageInstaller for Apt {
    fn name(&self) -> &'static str {
        "apt"
    }

    fn bootstrap(&self, _scripts: &dyn ScriptRunner) -> Result<()> {
        if !self.executor.which("apt-get") {
            return Err(ResourceError::NoPackageManager {
                platform: Os::Linux.to_string(),
            }
            .into());
        }
        let (program, args) = self.privileged(&["update"]);
        self.executor.run(program, &args)?;
        Ok(())
    }

    fn is_installed(&self, package: &Package) -> bool {
        self.executor
            .run_unchecked(
                "dpkg-query",
                &["-W", "-f=${Status}", &package.name],
            )
            .is_ok_and(|r| r.success && r.stdout.contains("install ok installed"))
    }

    fn install(&self, package: &Package, timeout: Option<Duration>) -> Result<()> {
        let (program, args) = self.privileged(&["install", "-y", &package.name]);
        self.executor.run_with_timeout(program, &args, timeout)?;
        Ok(())
    }
}

/// One package that should be installed.
#[derive(Debug)]
pub struct PackageResource<'a> {
    /// The package.
    pub package: &'a Package,
    installer: &'a dyn PackageInstaller,
    timeout: Option<Duration>,
}

impl<'a> PackageResource<'a> {
    /// Create a new package resource.
    #[must_use]
    pub const fn new(
        package: &'a Package,
        installer: &'a dyn PackageInstaller,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            package,
            installer,
            timeout,
        }
    }
}

impl Applicable for PackageResource<'_> {
    fn description(&self) -> String {
        match self.package.kind {
            PackageKind::Standard => format!("{} ({})", self.package.name, self.installer.name()),
            PackageKind::Cask => format!("{} ({} cask)", self.package.name, self.installer.name()),
        }
    }

    fn apply(&self) -> Result<ResourceChange> {
        self.installer.install(self.package, self.timeout)?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for PackageResource<'_> {
    fn current_state(&self) -> Result<ResourceState> {
        Ok(if self.installer.is_installed(self.package) {
            ResourceState::Correct
        } else {
            ResourceState::Missing
        })
    }
}
