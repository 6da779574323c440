//! Named, ordered tasks that orchestrate resource changes.
pub mod context;
pub mod editor;
pub mod links;
pub mod packages;
pub mod plugins;
mod processing;
pub mod secrets;
pub mod tools;

pub use context::Context;
pub use processing::{ProcessOpts, TaskStats, process_resources, process_single};

use anyhow::Result;

use crate::error::SetupError;
use crate::logging::TaskStatus;

/// Result of a single task execution.
///
/// # Examples
///
/// ```
/// use dotfiles_setup::tasks::TaskResult;
///
/// let ok = TaskResult::Ok;
/// let skipped = TaskResult::Skipped("no packages configured".into());
///
/// assert!(matches!(ok, TaskResult::Ok));
/// assert!(matches!(skipped, TaskResult::Skipped(_)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskResult {
    /// Task completed successfully.
    Ok,
    /// Task had nothing to do.
    Skipped(String),
}

/// A named, executable task.
pub trait Task: Send + Sync {
    /// Human-readable task name.
    fn name(&self) -> &'static str;

    /// Whether a failure of this task aborts the whole run.
    fn is_critical(&self) -> bool {
        false
    }

    /// Whether this task should run for the current platform and settings.
    fn should_run(&self, ctx: &Context) -> bool;

    /// Execute the task.
    ///
    /// # Errors
    ///
    /// Returns an error if the task as a whole fails. Per-item failures are
    /// recorded through the logger instead.
    fn run(&self, ctx: &Context) -> Result<TaskResult>;
}

/// The complete, ordered set of tasks run by the setup command.
#[must_use]
pub fn all_setup_tasks() -> Vec<Box<dyn Task>> {
    vec![
        Box::new(packages::BootstrapPackageManager),
        Box::new(packages::InstallPackages),
        Box::new(tools::InstallTools),
        Box::new(plugins::BootstrapTmuxPluginManager),
        Box::new(editor::BootstrapEditor),
        Box::new(secrets::CreateSecretsFile),
        Box::new(links::ReconcileDotfiles),
        Box::new(plugins::InstallTmuxPlugins),
    ]
}

/// Execute a task, recording the result in the logger.
///
/// # Errors
///
/// Returns [`SetupError::Fatal`] when a critical task fails. Failures of
/// other tasks are recorded and swallowed.
pub fn execute(task: &dyn Task, ctx: &Context) -> Result<(), SetupError> {
    if !task.should_run(ctx) {
        ctx.log
            .debug(&format!("skipping task: {} (not applicable)", task.name()));
        ctx.log
            .record_task(task.name(), TaskStatus::NotApplicable, None);
        return Ok(());
    }

    ctx.log.stage(task.name());

    match task.run(ctx) {
        Ok(TaskResult::Ok) => {
            ctx.log.record_task(task.name(), TaskStatus::Ok, None);
        }
        Ok(TaskResult::Skipped(reason)) => {
            ctx.log.info(&format!("skipped: {reason}"));
            ctx.log
                .record_task(task.name(), TaskStatus::Skipped, Some(&reason));
        }
        Err(e) => {
            let reason = format!("{e:#}");
            ctx.log.error(&format!("{}: {reason}", task.name()));
            ctx.log
                .record_task(task.name(), TaskStatus::Failed, Some(&reason));
            if task.is_critical() {
                return Err(SetupError::Fatal {
                    task: task.name().to_string(),
                    reason,
                });
            }
        }
    }
    Ok(())
}

/// Execute `tasks` in order, stopping at the first critical failure.
///
/// # Errors
///
/// Returns [`SetupError::Fatal`] from the first critical task that fails.
pub fn run_all<'a>(
    tasks: impl IntoIterator<Item = &'a dyn Task>,
    ctx: &Context,
) -> Result<(), SetupError> {
    for task in tasks {
        execute(task, ctx)?;
    }
    Ok(())
}

/// Shared helpers for task unit tests.
#[cfg(test)]
pub(crate) mod test_helpers {
    use std::path::Path;
    use std::sync::Arc;

    use chrono::TimeZone as _;

    use crate::config::Config;
    use crate::exec::Executor;
    use crate::logging::{CapturingLog, Log};
    use crate::platform::{Os, Platform};
    use crate::reconcile::Prompter;
    use crate::resources::backup::BackupStore;
    use crate::resources::git::Cloner;
    use crate::resources::git::test_helpers::FakeCloner;
    use crate::resources::package::PackageInstaller;
    use crate::resources::script::ScriptRunner;
    use crate::resources::test_helpers::{MockExecutor, RecordingScripts};
    use crate::settings::{Mode, Settings};

    use super::Context;

    /// A [`Prompter`] that never receives an answer.
    #[derive(Debug, Default)]
    pub struct NoAnswer;

    impl Prompter for NoAnswer {
        fn choose_conflict(&self, _: &Path) -> Option<crate::reconcile::ConflictChoice> {
            None
        }

        fn confirm_overwrite(&self, _: &Path) -> bool {
            false
        }
    }

    /// Settings for a non-interactive run rooted at `root` with `home`.
    #[must_use]
    pub fn settings(root: &Path, home: &Path) -> Settings {
        Settings {
            mode: Mode {
                interactive: false,
                force_overwrite: false,
                append: false,
                non_interactive: true,
            },
            skip_packages: false,
            ci: false,
            root: root.to_path_buf(),
            home: home.to_path_buf(),
            package_timeout: None,
        }
    }

    /// Build a Linux [`Context`] over `root` and `home` with inert
    /// capabilities and a [`CapturingLog`].
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn make_context(root: &Path, home: &Path) -> (Context, Arc<CapturingLog>) {
        let log = Arc::new(CapturingLog::default());
        let started = chrono::Local
            .with_ymd_and_hms(2024, 1, 2, 3, 4, 5)
            .single()
            .expect("valid timestamp");
        let ctx = Context {
            config: Config {
                root: root.to_path_buf(),
                ..Config::default()
            },
            settings: settings(root, home),
            platform: Platform::new(Os::Linux, false),
            log: Arc::clone(&log) as Arc<dyn Log>,
            executor: Arc::new(MockExecutor::with_responses(vec![])) as Arc<dyn Executor>,
            installer: None,
            cloner: Arc::new(FakeCloner::writing("README.md")) as Arc<dyn Cloner>,
            scripts: Arc::new(RecordingScripts::default()) as Arc<dyn ScriptRunner>,
            prompter: Arc::new(NoAnswer) as Arc<dyn Prompter>,
            backups: BackupStore::for_run(home, started),
        };
        (ctx, log)
    }

    /// Attach a package installer to `ctx`.
    #[must_use]
    pub fn with_installer(mut ctx: Context, installer: Arc<dyn PackageInstaller>) -> Context {
        ctx.installer = Some(installer);
        ctx
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use test_helpers::make_context;

    /// A mock task for testing `execute()`.
    struct MockTask {
        name: &'static str,
        critical: bool,
        should_run: bool,
        result: Result<TaskResult, String>,
    }

    impl MockTask {
        fn new(name: &'static str, result: Result<TaskResult, String>) -> Self {
            Self {
                name,
                critical: false,
                should_run: true,
                result,
            }
        }
    }

    impl Task for MockTask {
        fn name(&self) -> &'static str {
            self.name
        }
        fn is_critical(&self) -> bool {
            self.critical
        }
        fn should_run(&self, _ctx: &Context) -> bool {
            self.should_run
        }
        fn run(&self, _ctx: &Context) -> Result<TaskResult> {
            self.result.clone().map_err(|s| anyhow::anyhow!("{s}"))
        }
    }

    fn statuses(log: &crate::logging::CapturingLog) -> Vec<(String, TaskStatus)> {
        log.tasks()
            .into_iter()
            .map(|t| (t.name, t.status))
            .collect()
    }

    #[test]
    fn execute_skips_non_applicable_task() {
        let tmp = tempfile::tempdir().unwrap();
        let (ctx, log) = make_context(tmp.path(), tmp.path());
        let task = MockTask {
            should_run: false,
            ..MockTask::new("test-task", Ok(TaskResult::Ok))
        };

        execute(&task, &ctx).unwrap();
        assert_eq!(
            statuses(&log),
            vec![("test-task".to_string(), TaskStatus::NotApplicable)]
        );
        assert!(
            !log.lines().iter().any(|l| l.starts_with("stage:")),
            "a non-applicable task must not print a stage header"
        );
    }

    #[test]
    fn execute_records_ok_task() {
        let tmp = tempfile::tempdir().unwrap();
        let (ctx, log) = make_context(tmp.path(), tmp.path());
        execute(&MockTask::new("ok-task", Ok(TaskResult::Ok)), &ctx).unwrap();
        assert_eq!(statuses(&log), vec![("ok-task".to_string(), TaskStatus::Ok)]);
        assert!(log.lines().contains(&"stage: ok-task".to_string()));
    }

    #[test]
    fn execute_records_skipped_task_with_reason() {
        let tmp = tempfile::tempdir().unwrap();
        let (ctx, log) = make_context(tmp.path(), tmp.path());
        let task = MockTask::new("skip-task", Ok(TaskResult::Skipped("nothing".to_string())));
        execute(&task, &ctx).unwrap();
        let entry = &log.tasks()[0];
        assert_eq!(entry.status, TaskStatus::Skipped);
        assert_eq!(entry.message.as_deref(), Some("nothing"));
    }

    #[test]
    fn non_critical_failure_is_recorded_and_swallowed() {
        let tmp = tempfile::tempdir().unwrap();
        let (ctx, log) = make_context(tmp.path(), tmp.path());
        execute(&MockTask::new("fail-task", Err("kaboom".to_string())), &ctx).unwrap();
        assert_eq!(
            statuses(&log),
            vec![("fail-task".to_string(), TaskStatus::Failed)]
        );
        assert!(log.lines().contains(&"error: fail-task: kaboom".to_string()));
    }

    #[test]
    fn critical_failure_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let (ctx, _log) = make_context(tmp.path(), tmp.path());
        let task = MockTask {
            critical: true,
            ..MockTask::new("critical", Err("no network".to_string()))
        };
        let err = execute(&task, &ctx).unwrap_err();
        assert!(matches!(err, SetupError::Fatal { ref task, .. } if task == "critical"));
    }

    #[test]
    fn run_all_stops_after_fatal_task() {
        let tmp = tempfile::tempdir().unwrap();
        let (ctx, log) = make_context(tmp.path(), tmp.path());
        let first = MockTask::new("first", Ok(TaskResult::Ok));
        let fatal = MockTask {
            critical: true,
            ..MockTask::new("fatal", Err("boom".to_string()))
        };
        let never = MockTask::new("never", Ok(TaskResult::Ok));
        let tasks: Vec<&dyn Task> = vec![&first, &fatal, &never];

        assert!(run_all(tasks, &ctx).is_err());
        let names: Vec<String> = log.tasks().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["first", "fatal"]);
    }

    #[test]
    fn run_all_continues_past_non_critical_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let (ctx, log) = make_context(tmp.path(), tmp.path());
        let failing = MockTask::new("failing", Err("boom".to_string()));
        let after = MockTask::new("after", Ok(TaskResult::Ok));
        let tasks: Vec<&dyn Task> = vec![&failing, &after];

        run_all(tasks, &ctx).unwrap();
        assert_eq!(log.tasks().len(), 2);
    }

    #[test]
    fn setup_task_order() {
        let names: Vec<&str> = all_setup_tasks().iter().map(|t| t.name()).collect();
        insta::assert_debug_snapshot!(names, @r#"
        [
            "Bootstrap package manager",
            "Install packages",
            "Install developer tools",
            "Bootstrap tmux plugin manager",
            "Bootstrap editor",
            "Create secrets file",
            "Reconcile dotfiles",
            "Install tmux plugins",
        ]
        "#);
    }

    #[test]
    fn only_bootstrap_tasks_are_critical() {
        let critical: Vec<&str> = all_setup_tasks()
            .iter()
            .filter(|t| t.is_critical())
            .map(|t| t.name())
            .collect();
        assert_eq!(critical, vec!["Bootstrap package manager", "Bootstrap editor"]);
    }
}
