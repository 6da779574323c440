//! Developer tool configuration loading.
use anyhow::Result;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use super::toml_loader;

/// One `[[tool]]` entry: a remote install script and how to run it.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ToolEntry {
    /// Display name; also the binary checked on `PATH` when `command` is unset.
    pub name: String,
    /// HTTPS URL of the install script.
    pub url: String,
    /// Binary whose presence means the tool is already installed.
    #[serde(default)]
    pub command: Option<String>,
    /// Arguments passed after `sh -s --`.
    #[serde(default)]
    pub args: Vec<String>,
    /// Extra environment for the script; values may start with `~`.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
struct ToolsFile {
    #[serde(default)]
    tool: Vec<ToolEntry>,
}

/// Load tool entries from `tools.toml`.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load(path: &Path) -> Result<Vec<ToolEntry>> {
    let file: ToolsFile = toml_loader::load_config(path)?;
    Ok(file.tool)
}

impl ToolEntry {
    /// Binary that marks the tool as installed.
    #[must_use]
    pub fn probe_command(&self) -> &str {
        self.command.as_deref().unwrap_or(&self.name)
    }

    /// Environment with `~` expanded against `home`.
    #[must_use]
    pub fn expanded_env(&self, home: &Path) -> Vec<(String, String)> {
        self.env
            .iter()
            .map(|(key, value)| {
                let expanded =
                    shellexpand::tilde_with_context(value, || home.to_str().map(str::to_string));
                (key.clone(), expanded.into_owned())
            })
            .collect()
    }
}
