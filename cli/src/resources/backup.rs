//! Per-run backup directory for targets about to be replaced.
use anyhow::{Context as _, Result};
use chrono::{DateTime, Local};
use std::path::{Component, Path, PathBuf};

use super::helpers::fs::{copy_dir_recursive, copy_symlink, exists_no_follow};

/// Prefix of the backup directory name under `$HOME`.
pub const BACKUP_DIR_PREFIX: &str = ".dotfiles_backup_";

/// Timestamped backup directory shared by every request in one run.
///
/// The directory path is fixed when the store is created; the directory
/// itself is only created by the first [`backup`](Self::backup).
#[derive(Debug, Clone)]
pub struct BackupStore {
    dir: PathBuf,
    home: PathBuf,
}

impl BackupStore {
    /// Create the store for a run starting at `started`.
    #[must_use]
    pub fn for_run(home: &Path, started: DateTime<Local>) -> Self {
        let stamp = started.format("%Y%m%d_%H%M%S");
        Self {
            dir: home.join(format!("{BACKUP_DIR_PREFIX}{stamp}")),
            home: home.to_path_buf(),
        }
    }

    /// The backup directory path, whether or not it exists yet.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The backup directory, if anything has been backed up this run.
    #[must_use]
    pub fn dir_if_used(&self) -> Option<&Path> {
        self.dir.is_dir().then_some(self.dir.as_path())
    }

    /// Entry name for `target`: its path relative to home (or without its
    /// root when outside home) with separators replaced by `_`, plus `.bak`.
    #[must_use]
    pub fn entry_name(&self, target: &Path) -> String {
        let relative = target.strip_prefix(&self.home).unwrap_or(target);
        let parts: Vec<String> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        format!("{}.bak", parts.join("_"))
    }

    /// Copy `target` into the backup directory and return the entry path.
    ///
    /// Regular files are copied, directories copied recursively, and
    /// symlinks recreated with the same value. An existing entry of the
    /// same name gets a numeric suffix instead of being overwritten.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the copy fails.
    pub fn backup(&self, target: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating backup directory {}", self.dir.display()))?;

        let entry = self.free_entry_path(&self.entry_name(target));
        let meta = target
            .symlink_metadata()
            .with_context(|| format!("reading metadata: {}", target.display()))?;

        if meta.file_type().is_symlink() {
            copy_symlink(target, &entry)?;
        } else if meta.is_dir() {
            copy_dir_recursive(target, &entry)?;
        } else {
            std::fs::copy(target, &entry).with_context(|| {
                format!("copying {} to {}", target.display(), entry.display())
            })?;
        }
        Ok(entry)
    }

    fn free_entry_path(&self, name: &str) -> PathBuf {
        let candidate = self.dir.join(name);
        if !exists_no_follow(&candidate) {
            return candidate;
        }
        let stem = name.strip_suffix(".bak").unwrap_or(name);
        (1u32..)
            .map(|n| self.dir.join(format!("{stem}.{n}.bak")))
            .find(|p| !exists_no_follow(p))
            .unwrap_or(candidate)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use chrono::TimeZone as _;
    use std::fs;

    fn store(home: &Path) -> BackupStore {
        let started = Local.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).single().unwrap();
        BackupStore::for_run(home, started)
    }

    #[test]
    fn dir_name_is_timestamped() {
        let s = store(Path::new("/home/u"));
        assert_eq!(
            s.dir(),
            Path::new("/home/u/.dotfiles_backup_20260314_092653")
        );
    }

    #[test]
    fn entry_name_flattens_relative_path() {
        let s = store(Path::new("/home/u"));
        assert_eq!(s.entry_name(Path::new("/home/u/.zshrc")), ".zshrc.bak");
        assert_eq!(
            s.entry_name(Path::new("/home/u/.config/nvim")),
            ".config_nvim.bak"
        );
        assert_eq!(s.entry_name(Path::new("/etc/hosts")), "etc_hosts.bak");
    }

    #[test]
    fn directory_is_created_lazily() {
        let home = tempfile::tempdir().unwrap();
        let s = store(home.path());
        assert!(s.dir_if_used().is_none());

        let target = home.path().join(".zshrc");
        fs::write(&target, "C").unwrap();
        let entry = s.backup(&target).unwrap();

        assert_eq!(s.dir_if_used(), Some(s.dir()));
        assert_eq!(fs::read_to_string(entry).unwrap(), "C");
        assert_eq!(fs::read_to_string(&target).unwrap(), "C", "original kept");
    }

    #[test]
    fn repeated_backup_is_disambiguated() {
        let home = tempfile::tempdir().unwrap();
        let s = store(home.path());
        let target = home.path().join(".zshrc");
        fs::write(&target, "first").unwrap();
        let first = s.backup(&target).unwrap();
        fs::write(&target, "second").unwrap();
        let second = s.backup(&target).unwrap();

        assert_ne!(first, second);
        assert_eq!(second.file_name().unwrap(), ".zshrc.1.bak");
        assert_eq!(fs::read_to_string(first).unwrap(), "first");
        assert_eq!(fs::read_to_string(second).unwrap(), "second");
    }

    #[test]
    fn directory_backup_is_recursive() {
        let home = tempfile::tempdir().unwrap();
        let s = store(home.path());
        let target = home.path().join(".config/nvim");
        fs::create_dir_all(target.join("lua")).unwrap();
        fs::write(target.join("lua/init.lua"), "x").unwrap();

        let entry = s.backup(&target).unwrap();

        assert_eq!(fs::read_to_string(entry.join("lua/init.lua")).unwrap(), "x");
    }

    #[cfg(unix)]
    #[test]
    fn symlink_backup_is_recreated() {
        let home = tempfile::tempdir().unwrap();
        let s = store(home.path());
        let target = home.path().join(".vimrc");
        std::os::unix::fs::symlink("/somewhere/else", &target).unwrap();

        let entry = s.backup(&target).unwrap();

        assert_eq!(fs::read_link(entry).unwrap(), PathBuf::from("/somewhere/else"));
    }
}
