//! Core logging types: task entries, failed items, and the [`Log`] trait.
use std::fmt;

/// Task execution result for summary reporting.
#[derive(Debug, Clone)]
pub struct TaskEntry {
    /// Human-readable task name.
    pub name: String,
    /// Final status of the task.
    pub status: TaskStatus,
    /// Optional detail message (e.g., skip reason or error description).
    pub message: Option<String>,
}

/// Status of a completed task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Task completed successfully.
    Ok,
    /// Task does not apply to the current platform or run mode.
    NotApplicable,
    /// Task was explicitly skipped (e.g., `--skip-packages`, nothing configured).
    Skipped,
    /// Task encountered an error and could not complete.
    Failed,
}

/// Category of a per-item failure listed in the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    /// A package manager install.
    Package,
    /// A remote developer tool script.
    Tool,
    /// A single dotfile reconciliation.
    Link,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Package => write!(f, "packages"),
            Self::Tool => write!(f, "tools"),
            Self::Link => write!(f, "links"),
        }
    }
}

/// One item that failed without stopping its task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedItem {
    /// What kind of item failed.
    pub kind: ItemKind,
    /// Package name, tool name or link target.
    pub name: String,
}

/// Abstraction over logging backends.
///
/// [`Logger`](super::logger::Logger) is the production implementation;
/// tests may substitute their own to capture output.
pub trait Log: Send + Sync {
    /// Log a stage header (major section).
    fn stage(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Log a debug message (may be suppressed on console).
    fn debug(&self, msg: &str);
    /// Log a warning message.
    fn warn(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
    /// Record a task result for the summary.
    fn record_task(&self, name: &str, status: TaskStatus, message: Option<&str>);
    /// Record a per-item failure for the summary.
    fn record_failure(&self, kind: ItemKind, name: &str);
}
