//! Package list configuration loading.
use anyhow::Result;
use serde::Deserialize;
use std::path::Path;

use super::toml_loader;
use crate::platform::{Os, Platform};

/// How a package is passed to the package manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageKind {
    /// `install <name>` (Homebrew formula or apt package).
    Standard,
    /// `install --cask <name>` (Homebrew only).
    Cask,
}

/// A package to install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    /// Package name as the manager knows it.
    pub name: String,
    /// Install flavour.
    pub kind: PackageKind,
}

impl Package {
    fn standard(name: String) -> Self {
        Self {
            name,
            kind: PackageKind::Standard,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct MacosSection {
    #[serde(default)]
    formulae: Vec<String>,
    #[serde(default)]
    casks: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LinuxSection {
    #[serde(default)]
    packages: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PackagesFile {
    #[serde(default)]
    macos: MacosSection,
    #[serde(default)]
    linux: LinuxSection,
}

/// Load the packages for the current platform from `packages.toml`.
///
/// On macOS formulae come before casks; other platforms have no list.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load(path: &Path, platform: &Platform) -> Result<Vec<Package>> {
    let file: PackagesFile = toml_loader::load_config(path)?;
    let packages = match platform.os {
        Os::MacOs => file
            .macos
            .formulae
            .into_iter()
            .map(Package::standard)
            .chain(file.macos.casks.into_iter().map(|name| Package {
                name,
                kind: PackageKind::Cask,
            }))
            .collect(),
        Os::Linux => file
            .linux
            .packages
            .into_iter()
            .map(Package::standard)
            .collect(),
        Os::Other => Vec::new(),
    };
    Ok(packages)
}
