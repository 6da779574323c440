//! Configuration lists loaded from the repository's `conf/` directory.
pub mod links;
pub mod packages;
pub mod toml_loader;
pub mod tools;

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::platform::Platform;
use crate::reconcile::LinkRequest;

/// All loaded configuration for one run.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Provisioning repository root.
    pub root: PathBuf,
    /// Dotfile links in file order.
    pub links: Vec<links::LinkEntry>,
    /// Packages for the current platform.
    pub packages: Vec<packages::Package>,
    /// Remote developer tool scripts.
    pub tools: Vec<tools::ToolEntry>,
}

impl Config {
    /// Load all configuration from `<root>/conf/`. Missing files are empty.
    ///
    /// # Errors
    ///
    /// Returns an error if any present file cannot be read or parsed.
    pub fn load(root: &Path, platform: &Platform) -> Result<Self> {
        let conf = root.join("conf");

        let links = links::load(&conf.join("links.toml")).context("loading links.toml")?;
        let packages = packages::load(&conf.join("packages.toml"), platform)
            .context("loading packages.toml")?;
        let tools = tools::load(&conf.join("tools.toml")).context("loading tools.toml")?;

        Ok(Self {
            root: root.to_path_buf(),
            links,
            packages,
            tools,
        })
    }

    /// Build one reconciliation request per configured link.
    #[must_use]
    pub fn link_requests(&self, home: &Path) -> Vec<LinkRequest> {
        self.links
            .iter()
            .map(|entry| entry.to_request(&self.root, home, links::is_shell_startup_file))
            .collect()
    }

    /// Return warnings for configuration that loads but looks wrong.
    #[must_use]
    pub fn validate(&self, home: &Path) -> Vec<String> {
        let mut warnings = Vec::new();
        let mut seen = HashSet::new();
        for entry in &self.links {
            let target = entry.target_path(home);
            if !seen.insert(target.clone()) {
                warnings.push(format!(
                    "links.toml: target {} is listed more than once",
                    target.display()
                ));
            }
        }
        for tool in &self.tools {
            if !tool.url.starts_with("https://") {
                warnings.push(format!(
                    "tools.toml: {} is not fetched over HTTPS ({})",
                    tool.name, tool.url
                ));
            }
        }
        warnings
    }
}
