//! Git clones via `git2`, and the clone-if-absent resource.
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};

use super::backup::BackupStore;
use super::helpers::fs::{ensure_parent_dir, exists_no_follow, remove_existing};
use super::{Applicable, Resource, ResourceChange, ResourceState};
use crate::error::ResourceError;

/// Clones remote repositories.
pub trait Cloner: Send + Sync + std::fmt::Debug {
    /// Clone `url` into `dest`, which must not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the clone fails.
    fn clone_repo(&self, url: &str, dest: &Path) -> Result<()>;
}

/// Production [`Cloner`] backed by libgit2.
#[derive(Debug, Default, Clone, Copy)]
pub struct Git2Cloner;

impl Cloner for Git2Cloner {
    fn clone_repo(&self, url: &str, dest: &Path) -> Result<()> {
        use git2::build::RepoBuilder;

        let failed = |message: String| ResourceError::CloneFailed {
            url: url.to_string(),
            message,
        };

        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| failed(format!("failed to create directory: {e}")))?;
        }

        RepoBuilder::new()
            .clone(url, dest)
            .map_err(|e| failed(e.message().to_string()))?;
        Ok(())
    }
}

/// A repository that should be checked out at `dest`.
///
/// `marker` is a path inside the checkout whose presence means the clone
/// completed. A `dest` without it is copied into the run's backup
/// directory before it is replaced.
#[derive(Debug)]
pub struct CloneResource<'a> {
    /// Remote URL.
    pub url: String,
    /// Checkout directory.
    pub dest: PathBuf,
    /// File proving the checkout is complete.
    pub marker: PathBuf,
    cloner: &'a dyn Cloner,
    backups: &'a BackupStore,
}

impl<'a> CloneResource<'a> {
    /// Create a new clone resource.
    #[must_use]
    pub fn new(
        url: &str,
        dest: PathBuf,
        marker: PathBuf,
        cloner: &'a dyn Cloner,
        backups: &'a BackupStore,
    ) -> Self {
        Self {
            url: url.to_string(),
            dest,
            marker,
            cloner,
            backups,
        }
    }
}

impl Applicable for CloneResource<'_> {
    fn description(&self) -> String {
        format!("{} -> {}", self.url, self.dest.display())
    }

    fn apply(&self) -> Result<ResourceChange> {
        if exists_no_follow(&self.dest) {
            self.backups
                .backup(&self.dest)
                .with_context(|| format!("backing up {}", self.dest.display()))?;
            remove_existing(&self.dest)?;
        }
        ensure_parent_dir(&self.dest)?;
        self.cloner.clone_repo(&self.url, &self.dest)?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for CloneResource<'_> {
    fn current_state(&self) -> Result<ResourceState> {
        if self.marker.exists() {
            return Ok(ResourceState::Correct);
        }
        if exists_no_follow(&self.dest) {
            return Ok(ResourceState::Incorrect {
                current: "incomplete checkout".to_string(),
            });
        }
        Ok(ResourceState::Missing)
    }
}


#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::test_helpers::FakeCloner;
    use super::*;

    fn backups(home: &Path) -> BackupStore {
        BackupStore::for_run(home, chrono::Local::now())
    }

    #[test]
    fn state_missing_then_correct_after_apply() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("tpm");
        let cloner = FakeCloner::writing("tpm");
        let store = backups(dir.path());
        let res = CloneResource::new(
            "https://github.com/tmux-plugins/tpm",
            dest.clone(),
            dest.join("tpm"),
            &cloner,
            &store,
        );

        assert_eq!(res.current_state().unwrap(), ResourceState::Missing);
        assert_eq!(res.apply().unwrap(), ResourceChange::Applied);
        assert_eq!(res.current_state().unwrap(), ResourceState::Correct);
        assert_eq!(cloner.call_count(), 1);
    }

    #[test]
    fn incomplete_checkout_is_backed_up_before_clone() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("nvim");
        std::fs::create_dir_all(&dest).unwrap();
        std::fs::write(dest.join("init.vim"), "set number").unwrap();
        let cloner = FakeCloner::writing("init.lua");
        let store = backups(dir.path());
        let res = CloneResource::new(
            "https://github.com/LazyVim/starter",
            dest.clone(),
            dest.join("init.lua"),
            &cloner,
            &store,
        );

        assert!(matches!(
            res.current_state().unwrap(),
            ResourceState::Incorrect { .. }
        ));
        res.apply().unwrap();
        assert!(dest.join("init.lua").exists());
        assert_eq!(
            std::fs::read_to_string(store.dir().join("nvim.bak/init.vim")).unwrap(),
            "set number"
        );
    }

    #[test]
    fn failed_backup_leaves_checkout_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("nvim");
        std::fs::create_dir_all(&dest).unwrap();
        std::fs::write(dest.join("init.vim"), "set number").unwrap();
        let home = dir.path().join("home");
        std::fs::create_dir_all(&home).unwrap();
        let store = backups(&home);
        // A file where the backup directory should go.
        std::fs::write(store.dir(), "").unwrap();
        let cloner = FakeCloner::writing("init.lua");
        let res = CloneResource::new(
            "https://github.com/LazyVim/starter",
            dest.clone(),
            dest.join("init.lua"),
            &cloner,
            &store,
        );

        assert!(res.apply().is_err());
        assert!(dest.join("init.vim").exists());
        assert_eq!(cloner.call_count(), 0);
    }

    #[test]
    fn git2_clone_of_bad_url_is_typed() {
        let dir = tempfile::tempdir().unwrap();
        let err = Git2Cloner
            .clone_repo(
                dir.path().join("no-such-repo").to_str().unwrap(),
                &dir.path().join("dest"),
            )
            .unwrap_err();
        assert!(
            matches!(
                err.downcast_ref::<ResourceError>(),
                Some(ResourceError::CloneFailed { .. })
            ),
            "expected CloneFailed, got: {err:#}"
        );
    }
}
