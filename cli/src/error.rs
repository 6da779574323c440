//! Domain-specific error types for the provisioning engine.
//!
//! Internal modules return these typed errors where the failure has a
//! meaningful shape; task and command code converts them to
//! [`anyhow::Error`] with the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! SetupError
//! ├── Config(ConfigError)       : conf/ parsing, root and home resolution
//! ├── Reconcile(ReconcileError) : one (source, target) request
//! ├── Resource(ResourceError)   : commands, clones, downloads
//! └── Fatal { task, reason }    : a critical task failed; the run stops
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the provisioning engine.
#[derive(Error, Debug)]
pub enum SetupError {
    /// Configuration-related error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A single reconciliation request failed.
    #[error("Reconcile error: {0}")]
    Reconcile(#[from] ReconcileError),

    /// An external command or download failed.
    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    /// A critical task failed and the run was aborted.
    #[error("{task} failed, aborting: {reason}")]
    Fatal {
        /// Name of the task that failed.
        task: String,
        /// Human-readable reason for the failure.
        reason: String,
    },
}

/// Errors that arise while resolving settings and loading `conf/`.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A config file exists but could not be read.
    #[error("IO error reading config file {path}: {source}")]
    Io {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A config file is not valid TOML or has the wrong shape.
    #[error("Invalid TOML in {path}: {message}")]
    InvalidSyntax {
        /// Path to the offending file.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// The home directory could not be determined.
    #[error("HOME environment variable is not set")]
    MissingHome,

    /// The provisioning repository root could not be found.
    #[error("cannot determine dotfiles root. Use --root or set DOTFILES_ROOT env var")]
    RootNotFound,
}

/// Errors that arise while reconciling one (source, target) pair.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// The pre-existing target could not be backed up; nothing was modified.
    #[error("backup of {target} failed: {reason}")]
    BackupFailed {
        /// Target that was about to be replaced.
        target: PathBuf,
        /// Why the copy failed.
        reason: String,
    },

    /// Linking, copying or appending failed after the backup.
    #[error("{action} {target} failed: {reason}")]
    WriteFailed {
        /// Verb describing the write (e.g. `"link"`, `"append to"`).
        action: &'static str,
        /// Target being written.
        target: PathBuf,
        /// Why the write failed.
        reason: String,
    },
}

/// Errors that arise from external commands, clones and downloads.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// A command exited with a non-zero status.
    #[error("command '{program}' failed (exit {exit_code}): {stderr}")]
    ExecutionFailed {
        /// Program that was invoked.
        program: String,
        /// Exit code, or `-1` when killed by a signal.
        exit_code: i32,
        /// Captured standard error output.
        stderr: String,
    },

    /// A command did not finish within its time limit and was killed.
    #[error("command '{program}' timed out after {seconds}s")]
    TimedOut {
        /// Program that was invoked.
        program: String,
        /// The limit that was exceeded.
        seconds: u64,
    },

    /// No supported package manager is available on this platform.
    #[error("no supported package manager found on {platform}")]
    NoPackageManager {
        /// Platform name (e.g. `"linux"`).
        platform: String,
    },

    /// A git clone failed.
    #[error("cloning {url} failed: {message}")]
    CloneFailed {
        /// Remote URL.
        url: String,
        /// Message from libgit2.
        message: String,
    },

    /// An install script could not be downloaded.
    #[error("downloading {url} failed: {message}")]
    DownloadFailed {
        /// Remote URL.
        url: String,
        /// Message from the HTTP client.
        message: String,
    },
}
