//! Reconcile one (source, target) pair against the home directory.
//!
//! Each request ends in exactly one of: a new symlink, a verbatim copy, an
//! append with a banner, a backup followed by an overwrite, or no change.
//! Whenever a pre-existing target is modified it is first copied into the
//! run's [`BackupStore`]; if that copy fails nothing is touched.
pub mod policy;
pub mod prompt;

use chrono::{DateTime, Local};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::ReconcileError;
use crate::logging::Log;
use crate::resources::backup::BackupStore;
use crate::resources::helpers::fs::write_atomically;
use crate::resources::symlink::{classify, copy_atomically, link_atomically};
use crate::settings::Mode;
pub use policy::{Action, decide};
pub use prompt::{ConflictChoice, Prompter, TerminalPrompter};

/// One source file or directory that should appear at a target path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRequest {
    /// File or directory in the provisioning repository.
    pub source: PathBuf,
    /// Path under the home directory.
    pub target: PathBuf,
    /// Whether the target may be merged by appending.
    pub mergeable: bool,
    /// Back up and replace any conflicting target without asking.
    pub replace_conflicts: bool,
}

/// What happened to one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A symlink (or verbatim copy) was created at an absent target.
    Created,
    /// The previous target was backed up and replaced by a symlink.
    Overwritten,
    /// The previous target was backed up and the source appended to it.
    Appended,
    /// The target was left unchanged after a conflict.
    Skipped,
    /// The target already links to the source.
    AlreadyLinked,
    /// The source does not exist; nothing was done.
    SourceMissing,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Overwritten => "overwritten",
            Self::Appended => "appended",
            Self::Skipped => "skipped",
            Self::AlreadyLinked => "already linked",
            Self::SourceMissing => "source missing",
        };
        f.write_str(s)
    }
}

/// The banner placed between existing content and appended source content.
#[must_use]
pub fn append_banner(now: DateTime<Local>) -> String {
    format!(
        "\n# Appended by dotfiles setup on {}\n",
        now.format("%Y-%m-%d %H:%M:%S")
    )
}

/// Executes the conflict policy for individual requests.
pub struct Reconciler<'a> {
    mode: Mode,
    backups: &'a BackupStore,
    prompter: &'a dyn Prompter,
    log: &'a dyn Log,
}

impl fmt::Debug for Reconciler<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler")
            .field("mode", &self.mode)
            .field("backups", &self.backups)
            .finish_non_exhaustive()
    }
}

impl<'a> Reconciler<'a> {
    /// Create a reconciler for one run.
    #[must_use]
    pub fn new(
        mode: Mode,
        backups: &'a BackupStore,
        prompter: &'a dyn Prompter,
        log: &'a dyn Log,
    ) -> Self {
        Self {
            mode,
            backups,
            prompter,
            log,
        }
    }

    /// Reconcile one request and log a single line describing the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::BackupFailed`] if a required backup could
    /// not be made (the target is untouched), or
    /// [`ReconcileError::WriteFailed`] if the link, copy or append failed.
    pub fn reconcile(&self, req: &LinkRequest) -> Result<Outcome, ReconcileError> {
        if !req.source.exists() {
            self.log.warn(&format!(
                "source missing: {} (skipping {})",
                req.source.display(),
                req.target.display()
            ));
            return Ok(Outcome::SourceMissing);
        }

        let state = classify(&req.target).map_err(|e| write_failed("inspect", &req.target, &e))?;
        let action = decide(req, &state, self.mode, self.prompter);
        self.execute(req, action)
    }

    fn execute(&self, req: &LinkRequest, action: Action) -> Result<Outcome, ReconcileError> {
        let target = &req.target;
        match action {
            Action::Link => {
                link_atomically(&req.source, target).map_err(|e| write_failed("link", target, &e))?;
                self.log
                    .info(&format!("linked {} -> {}", target.display(), req.source.display()));
                Ok(Outcome::Created)
            }
            Action::CopyNew => {
                copy_atomically(&req.source, target)
                    .map_err(|e| write_failed("copy to", target, &e))?;
                self.log
                    .info(&format!("copied {} to {}", req.source.display(), target.display()));
                Ok(Outcome::Created)
            }
            Action::AlreadyLinked => {
                self.log
                    .debug(&format!("already linked: {}", target.display()));
                Ok(Outcome::AlreadyLinked)
            }
            Action::Skip => {
                self.log.info(&format!("skipped {}", target.display()));
                Ok(Outcome::Skipped)
            }
            Action::Overwrite => {
                let saved = self.back_up(target)?;
                link_atomically(&req.source, target).map_err(|e| write_failed("link", target, &e))?;
                self.log.info(&format!(
                    "replaced {} with link to {} (backup: {})",
                    target.display(),
                    req.source.display(),
                    saved.display()
                ));
                Ok(Outcome::Overwritten)
            }
            Action::Append => {
                let saved = self.back_up(target)?;
                append_source(&req.source, target, Local::now())
                    .map_err(|e| write_failed("append to", target, &e))?;
                self.log.info(&format!(
                    "appended {} to {} (backup: {})",
                    req.source.display(),
                    target.display(),
                    saved.display()
                ));
                Ok(Outcome::Appended)
            }
        }
    }

    fn back_up(&self, target: &Path) -> Result<PathBuf, ReconcileError> {
        self.backups
            .backup(target)
            .map_err(|e| ReconcileError::BackupFailed {
                target: target.to_path_buf(),
                reason: format!("{e:#}"),
            })
    }
}

/// Replace `target` with a regular file holding its current content, the
/// banner, then the source content.
fn append_source(source: &Path, target: &Path, now: DateTime<Local>) -> anyhow::Result<()> {
    use anyhow::Context as _;
    let mut contents =
        std::fs::read(target).with_context(|| format!("reading {}", target.display()))?;
    contents.extend_from_slice(append_banner(now).as_bytes());
    contents.extend(std::fs::read(source).with_context(|| format!("reading {}", source.display()))?);
    write_atomically(target, &contents)
}

fn write_failed(action: &'static str, target: &Path, err: &anyhow::Error) -> ReconcileError {
    ReconcileError::WriteFailed {
        action,
        target: target.to_path_buf(),
        reason: format!("{err:#}"),
    }
}
