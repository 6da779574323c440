//! File-system resource helpers.
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};

/// Suffix of the sibling path used to stage writes before a rename.
const TEMP_SUFFIX: &str = "dotfiles-setup.tmp";

/// Ensure the parent directory of `path` exists, creating it (and any
/// ancestors) if necessary.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create parent: {}", parent.display()))?;
    }
    Ok(())
}

/// Whether anything (including a broken symlink) exists at `path`.
#[must_use]
pub fn exists_no_follow(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}

/// Remove whatever is at `path`: a file, a symlink (broken or not), or a
/// real directory tree. Does nothing if `path` does not exist.
///
/// # Errors
///
/// Returns an error if the path exists but cannot be removed.
pub fn remove_existing(path: &Path) -> Result<()> {
    let Ok(meta) = path.symlink_metadata() else {
        return Ok(());
    };
    if meta.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    }
    .with_context(|| format!("remove existing: {}", path.display()))
}

/// Sibling path of `target` used to stage a write before renaming it
/// into place, so the rename stays on one filesystem.
#[must_use]
pub fn staging_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map_or_else(|| "target".into(), |n| n.to_string_lossy().into_owned());
    target.with_file_name(format!(".{name}.{TEMP_SUFFIX}"))
}

/// Write `contents` to `target` through a staging path and a rename, so
/// `target` is never observed partially written.
///
/// An existing `target` keeps its permission bits.
///
/// # Errors
///
/// Returns an error if the staging file cannot be written, given the
/// target's permissions, or renamed.
pub fn write_atomically(target: &Path, contents: &[u8]) -> Result<()> {
    ensure_parent_dir(target)?;
    let tmp = staging_path(target);
    remove_existing(&tmp)?;
    let staged = stage(&tmp, target, contents).and_then(|()| {
        std::fs::rename(&tmp, target)
            .with_context(|| format!("rename {} to {}", tmp.display(), target.display()))
    });
    if staged.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    staged
}

fn stage(tmp: &Path, target: &Path, contents: &[u8]) -> Result<()> {
    std::fs::write(tmp, contents).with_context(|| format!("write {}", tmp.display()))?;
    if let Ok(meta) = std::fs::metadata(target) {
        std::fs::set_permissions(tmp, meta.permissions())
            .with_context(|| format!("set permissions on {}", tmp.display()))?;
    }
    Ok(())
}

/// Recursively copy a directory tree.
///
/// Symlinks inside the tree are recreated as symlinks with the same value
/// rather than followed.
///
/// # Errors
///
/// Returns an error if the destination directory cannot be created, a source
/// entry cannot be read, or a file cannot be copied.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<()> {
    std::fs::create_dir_all(dst)
        .with_context(|| format!("creating directory {}", dst.display()))?;
    for entry in
        std::fs::read_dir(src).with_context(|| format!("reading directory {}", src.display()))?
    {
        let entry = entry.with_context(|| format!("reading entry in {}", src.display()))?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        let file_type = entry
            .file_type()
            .with_context(|| format!("reading type of {}", src_path.display()))?;
        if file_type.is_symlink() {
            copy_symlink(&src_path, &dst_path)?;
        } else if file_type.is_dir() {
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path).with_context(|| {
                format!("copying {} to {}", src_path.display(), dst_path.display())
            })?;
        }
    }
    Ok(())
}

/// Recreate the symlink at `src` as a new symlink at `dst` with the same value.
///
/// # Errors
///
/// Returns an error if the link cannot be read or created.
pub fn copy_symlink(src: &Path, dst: &Path) -> Result<()> {
    let value =
        std::fs::read_link(src).with_context(|| format!("reading link {}", src.display()))?;
    symlink(&value, dst)
}

/// Create a symlink at `link` whose value is `value`.
///
/// # Errors
///
/// Returns an error if the symlink cannot be created.
#[cfg(unix)]
pub fn symlink(value: &Path, link: &Path) -> Result<()> {
    std::os::unix::fs::symlink(value, link)
        .with_context(|| format!("creating symlink {} -> {}", link.display(), value.display()))
}

/// Create a symlink at `link` whose value is `value`.
///
/// # Errors
///
/// Always fails: only Unix-like systems are supported.
#[cfg(not(unix))]
pub fn symlink(value: &Path, link: &Path) -> Result<()> {
    anyhow::bail!(
        "symlinks are not supported on this platform: {} -> {}",
        link.display(),
        value.display()
    )
}
