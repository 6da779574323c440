//! Dotfile link configuration loading.
use anyhow::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::toml_loader;
use crate::reconcile::LinkRequest;

/// Shell startup files that may be merged rather than replaced.
const SHELL_STARTUP_FILES: &[&str] = &[
    ".bashrc",
    ".bash_profile",
    ".zshrc",
    ".zprofile",
    ".zshenv",
    ".profile",
];

/// One `[[link]]` entry from `links.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LinkEntry {
    /// Path relative to the repository root.
    pub source: String,
    /// Path relative to `$HOME`; `~/` prefixes and absolute paths are accepted.
    pub target: String,
    /// Override of the default mergeability predicate.
    #[serde(default)]
    pub merge: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct LinksFile {
    #[serde(default)]
    link: Vec<LinkEntry>,
}

/// Load link entries from `links.toml`.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load(path: &Path) -> Result<Vec<LinkEntry>> {
    let file: LinksFile = toml_loader::load_config(path)?;
    Ok(file.link)
}

/// Default mergeability predicate: the target is a shell startup file.
#[must_use]
pub fn is_shell_startup_file(target: &Path) -> bool {
    target
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| SHELL_STARTUP_FILES.contains(&name))
}

impl LinkEntry {
    /// Resolve the target against `home`, expanding a leading `~`.
    #[must_use]
    pub fn target_path(&self, home: &Path) -> PathBuf {
        let expanded =
            shellexpand::tilde_with_context(&self.target, || home.to_str().map(str::to_string));
        let path = PathBuf::from(expanded.as_ref());
        if path.is_absolute() {
            path
        } else {
            home.join(path)
        }
    }

    /// Build a reconciliation request, using `mergeable` unless the entry
    /// overrides it.
    #[must_use]
    pub fn to_request(
        &self,
        root: &Path,
        home: &Path,
        mergeable: impl Fn(&Path) -> bool,
    ) -> LinkRequest {
        let target = self.target_path(home);
        let mergeable = self.merge.unwrap_or_else(|| mergeable(&target));
        LinkRequest {
            source: root.join(&self.source),
            target,
            mergeable,
            replace_conflicts: false,
        }
    }
}
