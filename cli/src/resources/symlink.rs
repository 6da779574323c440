//! Target classification and atomic link/copy primitives.
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};

use super::helpers::fs::{
    copy_dir_recursive, ensure_parent_dir, remove_existing, staging_path, symlink,
    write_atomically,
};

/// What currently occupies a target path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetState {
    /// Nothing exists at the path.
    Absent,
    /// A symlink (possibly dangling) with the given value.
    SymlinkTo(PathBuf),
    /// A regular file, directory, or other non-symlink entry.
    ExistsOther,
}

impl TargetState {
    /// Whether this is a symlink whose value is `source`.
    #[must_use]
    pub fn links_to(&self, source: &Path) -> bool {
        matches!(self, Self::SymlinkTo(value) if paths_equal(value, source))
    }
}

/// Classify `target` without following a symlink at the final component.
///
/// # Errors
///
/// Returns an error if `target` is a symlink whose value cannot be read.
pub fn classify(target: &Path) -> Result<TargetState> {
    let Ok(meta) = target.symlink_metadata() else {
        return Ok(TargetState::Absent);
    };
    if meta.file_type().is_symlink() {
        let value = std::fs::read_link(target)
            .with_context(|| format!("reading link {}", target.display()))?;
        return Ok(TargetState::SymlinkTo(value));
    }
    Ok(TargetState::ExistsOther)
}

/// Make `target` a symlink to `source`, replacing whatever is there.
///
/// The link is created at a staging sibling and renamed over the target.
/// A real directory cannot be renamed over, so it is removed first; the
/// caller is expected to have backed it up.
///
/// # Errors
///
/// Returns an error if the parent cannot be created, the staging link
/// cannot be created, or the rename fails.
pub fn link_atomically(source: &Path, target: &Path) -> Result<()> {
    ensure_parent_dir(target)?;
    let tmp = staging_path(target);
    remove_existing(&tmp)?;
    symlink(source, &tmp)?;

    if target
        .symlink_metadata()
        .is_ok_and(|m| m.file_type().is_dir())
        && let Err(e) = remove_existing(target)
    {
        let _ = std::fs::remove_file(&tmp);
        return Err(e);
    }

    if let Err(e) = std::fs::rename(&tmp, target) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e).with_context(|| format!("rename {} to {}", tmp.display(), target.display()));
    }
    Ok(())
}

/// Copy `source` to a target that does not exist yet, staging the copy so
/// the target appears complete or not at all.
///
/// # Errors
///
/// Returns an error if the source cannot be read or the copy fails.
pub fn copy_atomically(source: &Path, target: &Path) -> Result<()> {
    if source.is_dir() {
        ensure_parent_dir(target)?;
        let tmp = staging_path(target);
        remove_existing(&tmp)?;
        copy_dir_recursive(source, &tmp)?;
        if let Err(e) = std::fs::rename(&tmp, target) {
            let _ = remove_existing(&tmp);
            return Err(e)
                .with_context(|| format!("rename {} to {}", tmp.display(), target.display()));
        }
        return Ok(());
    }
    let contents =
        std::fs::read(source).with_context(|| format!("reading {}", source.display()))?;
    write_atomically(target, &contents)
}

/// Compare two paths for equality, ignoring trailing separators and `.`
/// components.
#[must_use]
pub fn paths_equal(a: &Path, b: &Path) -> bool {
    a.components().eq(b.components())
}
