//! The private secrets file sourced by the shell.
use anyhow::{Context as _, Result};
use regex::Regex;
use std::collections::HashMap;
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::LazyLock;

use super::helpers::fs::{ensure_parent_dir, exists_no_follow};
use super::{Applicable, Resource, ResourceChange, ResourceState};

/// Keys written to the secrets file, in order.
pub const SECRET_KEYS: &[&str] = &[
    "OPENAI_API_KEY",
    "ANTHROPIC_API_KEY",
    "GITHUB_TOKEN",
    "HOMEBREW_GITHUB_API_TOKEN",
];

/// Value written for keys with nothing to migrate.
pub const PLACEHOLDER: &str = "your-key-here";

const HEADER: &str = "\
# Private environment for interactive shells. Keep this file mode 600.
# Sourced by the shell startup files; never commit it.
";

#[allow(clippy::expect_used)]
static EXPORT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*export\s+([A-Za-z_][A-Za-z0-9_]*)=(.*?)\s*$").expect("valid regex")
});

/// Extract `export NAME=value` assignments for the known keys from shell
/// source text. Later assignments win; surrounding quotes and trailing
/// comments are removed.
#[must_use]
pub fn migrate_exports(text: &str) -> HashMap<String, String> {
    EXPORT_LINE
        .captures_iter(text)
        .filter_map(|caps| {
            let name = caps.get(1)?.as_str();
            let value = caps.get(2)?.as_str();
            SECRET_KEYS
                .contains(&name)
                .then(|| (name.to_string(), shell_value(value).to_string()))
        })
        .filter(|(_, value)| !value.is_empty())
        .collect()
}

/// The word a shell assigns from `raw`: the text inside a leading quote
/// pair, else everything up to the first blank (which drops ` # comment`).
fn shell_value(raw: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(rest) = raw.strip_prefix(quote) {
            return rest.split_once(quote).map_or(raw, |(inner, _)| inner);
        }
    }
    raw.split_whitespace().next().unwrap_or_default()
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// The secrets file, created only when absent.
#[derive(Debug, Clone)]
pub struct SecretsFileResource {
    /// Path of the secrets file (normally `~/.secrets`).
    pub path: PathBuf,
    /// Shell files searched for existing values, highest priority first.
    pub sources: Vec<PathBuf>,
}

impl SecretsFileResource {
    /// Create a secrets resource for `home`, migrating from `~/.zshrc`
    /// and then `~/.bashrc`.
    #[must_use]
    pub fn for_home(home: &std::path::Path) -> Self {
        Self {
            path: home.join(".secrets"),
            sources: vec![home.join(".zshrc"), home.join(".bashrc")],
        }
    }

    /// Render the file contents and return them with the number of
    /// migrated values.
    #[must_use]
    pub fn render(&self) -> (String, usize) {
        let mut found: HashMap<String, String> = HashMap::new();
        for source in self.sources.iter().rev() {
            if let Ok(text) = std::fs::read_to_string(source) {
                found.extend(migrate_exports(&text));
            }
        }

        let mut out = String::from(HEADER);
        out.push('\n');
        for key in SECRET_KEYS {
            let value = found.get(*key).map_or(PLACEHOLDER, String::as_str);
            out.push_str(&format!("export {key}=\"{}\"\n", escape(value)));
        }
        (out, found.len())
    }

    fn create_private(&self, contents: &str) -> Result<()> {
        ensure_parent_dir(&self.path)?;
        let mut options = std::fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt as _;
            options.mode(0o600);
        }
        let mut file = options
            .open(&self.path)
            .with_context(|| format!("creating {}", self.path.display()))?;
        file.write_all(contents.as_bytes())
            .with_context(|| format!("writing {}", self.path.display()))
    }
}

impl Applicable for SecretsFileResource {
    fn description(&self) -> String {
        self.path.display().to_string()
    }

    fn apply(&self) -> Result<ResourceChange> {
        if exists_no_follow(&self.path) {
            return Ok(ResourceChange::AlreadyCorrect);
        }
        let (contents, _) = self.render();
        self.create_private(&contents)?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for SecretsFileResource {
    fn current_state(&self) -> Result<ResourceState> {
        Ok(if exists_no_follow(&self.path) {
            ResourceState::Correct
        } else {
            ResourceState::Missing
        })
    }
}
