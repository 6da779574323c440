use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::exec::Executor;
use crate::logging::Log;
use crate::platform::Platform;
use crate::reconcile::{Prompter, Reconciler};
use crate::resources::backup::BackupStore;
use crate::resources::git::Cloner;
use crate::resources::package::PackageInstaller;
use crate::resources::script::ScriptRunner;
use crate::settings::Settings;

/// Shared state handed to every task.
///
/// Capabilities are trait objects so tests can substitute fakes for the
/// package manager, git, remote scripts and the terminal.
pub struct Context {
    /// Configuration loaded from `conf/`.
    pub config: Config,
    /// Flags and paths resolved for this run.
    pub settings: Settings,
    /// Detected platform information.
    pub platform: Platform,
    /// Logger for output and task recording.
    pub log: Arc<dyn Log>,
    /// Command executor.
    pub executor: Arc<dyn Executor>,
    /// Package manager for this platform, if one is supported.
    pub installer: Option<Arc<dyn PackageInstaller>>,
    /// Git checkout capability.
    pub cloner: Arc<dyn Cloner>,
    /// Remote install script capability.
    pub scripts: Arc<dyn ScriptRunner>,
    /// Conflict prompts.
    pub prompter: Arc<dyn Prompter>,
    /// This run's backup directory.
    pub backups: BackupStore,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("config", &"<Config>")
            .field("settings", &self.settings)
            .field("platform", &self.platform)
            .field("log", &"<dyn Log>")
            .field("executor", &self.executor)
            .field(
                "installer",
                &self.installer.as_ref().map(|i| i.name()),
            )
            .field("cloner", &self.cloner)
            .field("scripts", &self.scripts)
            .field("prompter", &"<dyn Prompter>")
            .field("backups", &self.backups)
            .finish()
    }
}

impl Context {
    /// Home directory targets are relative to.
    #[must_use]
    pub fn home(&self) -> &Path {
        &self.settings.home
    }

    /// Root directory of the provisioning repository.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.config.root
    }

    /// A reconciler bound to this run's mode, backups, prompter and log.
    #[must_use]
    pub fn reconciler(&self) -> Reconciler<'_> {
        Reconciler::new(
            self.settings.mode,
            &self.backups,
            self.prompter.as_ref(),
            self.log.as_ref(),
        )
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use crate::tasks::test_helpers::make_context;
    use std::path::PathBuf;

    #[test]
    fn root_and_home_come_from_config_and_settings() {
        let (ctx, _log) = make_context(
            PathBuf::from("/dotfiles").as_path(),
            PathBuf::from("/home/test").as_path(),
        );
        assert_eq!(ctx.root(), PathBuf::from("/dotfiles"));
        assert_eq!(ctx.home(), PathBuf::from("/home/test"));
    }

    #[test]
    fn debug_hides_trait_objects() {
        let (ctx, _log) = make_context(
            PathBuf::from("/dotfiles").as_path(),
            PathBuf::from("/home/test").as_path(),
        );
        let rendered = format!("{ctx:?}");
        assert!(rendered.contains("<dyn Log>"));
        assert!(rendered.contains("installer: None"));
    }
}
