//! `tracing` subscriber: coloured console output plus a plain-text run log.
use std::fs;
use std::io::Write as _;
use std::path::Path;
use std::sync::Mutex;

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Metadata};

use super::utils::{keep_previous, local_now, log_file_path, strip_ansi};

/// Tracing target used for stage headers.
pub(super) const STAGE_TARGET: &str = "setup::stage";

/// How an event is presented, independent of where it is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Stage,
    Error,
    Warn,
    Info,
    Debug,
}

impl LineKind {
    fn of(metadata: &Metadata<'_>) -> Self {
        match *metadata.level() {
            Level::ERROR => Self::Error,
            Level::WARN => Self::Warn,
            Level::INFO if metadata.target() == STAGE_TARGET => Self::Stage,
            Level::INFO => Self::Info,
            _ => Self::Debug,
        }
    }

    fn console(self, msg: &str) -> String {
        match self {
            Self::Stage => format!("\x1b[1;34m==>\x1b[0m \x1b[1m{msg}\x1b[0m"),
            Self::Error => format!("\x1b[31mERROR\x1b[0m {msg}"),
            Self::Warn => format!("\x1b[33mWARN\x1b[0m  {msg}"),
            Self::Info => format!("  {msg}"),
            Self::Debug => format!("  \x1b[2m{msg}\x1b[0m"),
        }
    }

    fn file(self, time: &str, msg: &str) -> String {
        let msg = strip_ansi(msg);
        match self {
            Self::Stage => format!("[{time}] ==> {msg}"),
            Self::Error => format!("[{time}]     [error] {msg}"),
            Self::Warn => format!("[{time}]     [warn] {msg}"),
            Self::Info => format!("[{time}]     {msg}"),
            Self::Debug => format!("[{time}]     [debug] {msg}"),
        }
    }
}

/// The `message` field of an event.
fn message_of(event: &Event<'_>) -> String {
    #[derive(Default)]
    struct Message(String);

    impl Visit for Message {
        fn record_str(&mut self, field: &Field, value: &str) {
            if field.name() == "message" {
                value.clone_into(&mut self.0);
            }
        }

        fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
            if field.name() == "message" {
                self.0 = format!("{value:?}");
            }
        }
    }

    let mut message = Message::default();
    event.record(&mut message);
    message.0
}

/// Appends every event to the run log, timestamped and without colour.
#[derive(Debug)]
pub(super) struct FileLayer {
    file: Mutex<fs::File>,
}

impl FileLayer {
    /// Start a fresh log at `path` with a run header.
    ///
    /// `None` if the file cannot be written.
    pub(super) fn open(path: &Path) -> Option<Self> {
        let version = option_env!("DOTFILES_SETUP_VERSION")
            .unwrap_or(concat!("dev-", env!("CARGO_PKG_VERSION")));
        let rule = "=".repeat(42);
        let header = format!(
            "{rule}\ndotfiles-setup {version} {}\n{rule}\n",
            local_now(true)
        );
        fs::write(path, header).ok()?;
        let file = fs::OpenOptions::new().append(true).open(path).ok()?;
        Some(Self {
            file: Mutex::new(file),
        })
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for FileLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let line = LineKind::of(event.metadata()).file(&local_now(false), &message_of(event));
        if let Ok(mut file) = self.file.lock() {
            writeln!(file, "{line}").ok();
        }
    }
}

/// Console formatter for the setup output style.
struct ConsoleFormat;

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for ConsoleFormat
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let line = LineKind::of(event.metadata()).console(&message_of(event));
        writeln!(writer, "{line}")
    }
}

/// Initialise the global [`tracing`] subscriber.
///
/// Warnings and errors go to stderr, everything else to stdout; debug
/// output reaches the console only with `verbose`. The run log at
/// `$XDG_CACHE_HOME/dotfiles-setup/<command>.log` always receives debug
/// events, and the previous run's log is kept as `<command>.log.1`.
pub fn init_subscriber(verbose: bool, command: &str) {
    use tracing_subscriber::fmt::writer::MakeWriterExt as _;
    use tracing_subscriber::{
        Layer as _, filter::LevelFilter, fmt, layer::SubscriberExt as _,
        util::SubscriberInitExt as _,
    };

    let console_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let console = fmt::layer()
        .event_format(ConsoleFormat)
        .with_writer(
            std::io::stderr
                .with_max_level(Level::WARN)
                .and(std::io::stdout.with_min_level(Level::INFO)),
        )
        .with_filter(console_level);

    let file = log_file_path(command).and_then(|path| {
        keep_previous(&path);
        FileLayer::open(&path)
    });

    tracing_subscriber::registry()
        .with(console)
        .with(file.map(|layer| layer.with_filter(LevelFilter::DEBUG)))
        .init();
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn file_lines_are_plain() {
        assert_eq!(
            LineKind::Warn.file("10:00:00", "\x1b[1mskipped\x1b[0m ~/.zshrc"),
            "[10:00:00]     [warn] skipped ~/.zshrc"
        );
        assert_eq!(
            LineKind::Stage.file("10:00:00", "Reconcile dotfiles"),
            "[10:00:00] ==> Reconcile dotfiles"
        );
    }

    #[test]
    fn console_lines_are_coloured_by_kind() {
        assert_eq!(LineKind::Info.console("linked"), "  linked");
        assert!(LineKind::Error.console("boom").starts_with("\x1b[31mERROR"));
        assert!(LineKind::Stage.console("Summary").contains("==>"));
    }

    #[test]
    fn open_writes_run_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("setup.log");
        let _layer = FileLayer::open(&path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with(&"=".repeat(42)));
        assert!(text.contains("dotfiles-setup "));
    }
}
