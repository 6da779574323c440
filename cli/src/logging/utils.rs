//! Log file location, ANSI stripping and timestamps.
use regex::Regex;
use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Directory name under the cache root that holds run logs.
const CACHE_DIR_NAME: &str = "dotfiles-setup";

#[allow(clippy::expect_used)]
static ANSI_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b(?:\[[0-?]*[ -/]*[@-~]|[@-Z\\-_])").expect("valid regex"));

/// Remove terminal escape sequences so the log file stays plain text.
pub(super) fn strip_ansi(s: &str) -> Cow<'_, str> {
    ANSI_ESCAPE.replace_all(s, "")
}

/// Cache root: `$XDG_CACHE_HOME`, else `$HOME/.cache`.
fn cache_root() -> PathBuf {
    std::env::var_os("XDG_CACHE_HOME")
        .filter(|v| !v.is_empty())
        .map_or_else(
            || {
                std::env::var_os("HOME")
                    .map_or_else(|| PathBuf::from("."), PathBuf::from)
                    .join(".cache")
            },
            PathBuf::from,
        )
}

/// Path of the log for `command`, creating its directory.
///
/// `None` when the directory cannot be created; the run then logs to the
/// console only.
pub(super) fn log_file_path(command: &str) -> Option<PathBuf> {
    let dir = cache_root().join(CACHE_DIR_NAME);
    fs::create_dir_all(&dir).ok()?;
    Some(dir.join(format!("{command}.log")))
}

/// Keep the previous run's log next to the new one as `<name>.log.1`.
pub(super) fn keep_previous(path: &Path) {
    if path.is_file() {
        let mut previous = path.as_os_str().to_owned();
        previous.push(".1");
        fs::rename(path, previous).ok();
    }
}

/// Local wall-clock time, e.g. `2026-01-02 03:04:05` or `03:04:05`.
pub(super) fn local_now(with_date: bool) -> String {
    let format = if with_date {
        "%Y-%m-%d %H:%M:%S"
    } else {
        "%H:%M:%S"
    };
    chrono::Local::now().format(format).to_string()
}
