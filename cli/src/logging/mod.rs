//! Logging infrastructure for structured console and file output.

mod logger;
mod subscriber;
mod types;
mod utils;

pub use logger::Logger;
pub use subscriber::init_subscriber;
pub use types::{FailedItem, ItemKind, Log, TaskEntry, TaskStatus};

/// Create a Logger whose events reach a [`FileLayer`](subscriber::FileLayer)
/// in a temporary directory through a thread-local subscriber.
///
/// The returned guard must be kept alive for the duration of the test.
#[cfg(test)]
#[allow(clippy::expect_used)]
pub(crate) fn isolated_logger() -> (Logger, tempfile::TempDir, tracing::dispatcher::DefaultGuard) {
    use tracing_subscriber::{Layer as _, filter::LevelFilter, layer::SubscriberExt as _};
    let tmp = tempfile::tempdir().expect("failed to create temp dir");
    let path = tmp.path().join("test.log");
    let file_layer = subscriber::FileLayer::open(&path).expect("failed to create file layer");
    let log = Logger::writing_to(Some(path));
    let subscriber =
        tracing_subscriber::registry().with(file_layer.with_filter(LevelFilter::DEBUG));
    let guard = tracing::dispatcher::set_default(&tracing::Dispatch::new(subscriber));
    (log, tmp, guard)
}

/// A [`Log`] that keeps every message in memory, prefixed with its level.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct CapturingLog {
    lines: std::sync::Mutex<Vec<String>>,
    tasks: std::sync::Mutex<Vec<TaskEntry>>,
    failures: std::sync::Mutex<Vec<FailedItem>>,
}

#[cfg(test)]
impl CapturingLog {
    fn push(&self, level: &str, msg: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(format!("{level}: {msg}"));
        }
    }

    /// Every message logged so far.
    pub(crate) fn lines(&self) -> Vec<String> {
        self.lines.lock().map_or_else(|_| vec![], |l| l.clone())
    }

    /// Every task recorded so far.
    pub(crate) fn tasks(&self) -> Vec<TaskEntry> {
        self.tasks.lock().map_or_else(|_| vec![], |t| t.clone())
    }

    /// Every per-item failure recorded so far.
    pub(crate) fn failures(&self) -> Vec<FailedItem> {
        self.failures.lock().map_or_else(|_| vec![], |f| f.clone())
    }
}

#[cfg(test)]
impl Log for CapturingLog {
    fn stage(&self, msg: &str) {
        self.push("stage", msg);
    }
    fn info(&self, msg: &str) {
        self.push("info", msg);
    }
    fn debug(&self, msg: &str) {
        self.push("debug", msg);
    }
    fn warn(&self, msg: &str) {
        self.push("warn", msg);
    }
    fn error(&self, msg: &str) {
        self.push("error", msg);
    }
    fn record_task(&self, name: &str, status: TaskStatus, message: Option<&str>) {
        if let Ok(mut tasks) = self.tasks.lock() {
            tasks.push(TaskEntry {
                name: name.to_string(),
                status,
                message: message.map(String::from),
            });
        }
    }
    fn record_failure(&self, kind: ItemKind, name: &str) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.push(FailedItem {
                kind,
                name: name.to_string(),
            });
        }
    }
}
