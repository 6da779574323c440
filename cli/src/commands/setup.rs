use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::Cli;
use crate::config::Config;
use crate::error::ConfigError;
use crate::exec::{Executor, SystemExecutor};
use crate::logging::{Log, Logger};
use crate::platform::Platform;
use crate::reconcile::TerminalPrompter;
use crate::resources::backup::BackupStore;
use crate::resources::git::Git2Cloner;
use crate::resources::package::installer_for;
use crate::resources::script::HttpScriptRunner;
use crate::settings::Settings;
use crate::tasks::{self, Context};

/// Exit status used when the run is interrupted.
const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Run the setup command.
///
/// # Errors
///
/// Returns an error if the root or home directory cannot be determined,
/// configuration fails to load, a critical task fails, or any task
/// recorded a failure.
pub fn run(cli: &Cli, log: &Arc<Logger>) -> Result<()> {
    let version = option_env!("DOTFILES_SETUP_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
    log.info(&format!("dotfiles-setup {version}"));

    let platform = Platform::detect();
    let root = resolve_root(cli)?;
    let home = resolve_home()?;
    log.debug(&format!("root: {}", root.display()));
    log.debug(&format!("home: {}", home.display()));
    log.debug(&format!("platform: {} (ci: {})", platform.os, platform.is_ci));

    let (settings, warnings) = Settings::resolve(cli, platform.is_ci, root.clone(), home.clone());
    for warning in &warnings {
        log.warn(warning);
    }
    if settings.ci {
        log.info("CI detected: running non-interactively");
    }

    log.stage("Loading configuration");
    let config = Config::load(&root, &platform)?;
    log.info(&format!(
        "loaded {} links, {} packages, {} tools",
        config.links.len(),
        config.packages.len(),
        config.tools.len()
    ));
    let warnings = config.validate(&home);
    if !warnings.is_empty() {
        log.warn(&format!(
            "found {} configuration warning(s):",
            warnings.len()
        ));
        for warning in &warnings {
            log.warn(&format!("  {warning}"));
        }
    }

    let backups = BackupStore::for_run(&home, chrono::Local::now());
    install_interrupt_handler(log, backups.dir());

    let executor: Arc<dyn Executor> = Arc::new(SystemExecutor);
    let ctx = Context {
        installer: installer_for(&platform, Arc::clone(&executor)),
        scripts: Arc::new(HttpScriptRunner::new(Arc::clone(&executor))),
        cloner: Arc::new(Git2Cloner),
        prompter: Arc::new(TerminalPrompter),
        log: Arc::clone(log) as Arc<dyn Log>,
        executor,
        config,
        settings,
        platform,
        backups,
    };

    let all = tasks::all_setup_tasks();
    let outcome = tasks::run_all(all.iter().map(AsRef::as_ref), &ctx);

    log.print_summary(ctx.backups.dir_if_used());
    outcome?;

    let count = log.failure_count();
    if count > 0 {
        anyhow::bail!("{count} task(s) failed");
    }
    Ok(())
}

/// Log where backups went and exit with status 130 on Ctrl-C.
fn install_interrupt_handler(log: &Arc<Logger>, backup_dir: &Path) {
    let log = Arc::clone(log);
    let backup_dir = backup_dir.to_path_buf();
    let installed = ctrlc::set_handler(move || {
        if backup_dir.is_dir() {
            log.warn(&format!(
                "interrupted; backups so far are in {}",
                backup_dir.display()
            ));
        } else {
            log.warn("interrupted; nothing was backed up");
        }
        std::process::exit(INTERRUPTED_EXIT_CODE);
    });
    if let Err(e) = installed {
        tracing::debug!("could not install interrupt handler: {e}");
    }
}

/// Resolve the provisioning repository root.
///
/// Checked in order: `--root`, `$DOTFILES_ROOT`, the nearest ancestor of
/// the executable containing `conf/`, and the current directory.
///
/// # Errors
///
/// Returns [`ConfigError::RootNotFound`] if no candidate exists.
pub fn resolve_root(cli: &Cli) -> Result<PathBuf> {
    let env_root = std::env::var_os("DOTFILES_ROOT").map(PathBuf::from);
    let exe = std::env::current_exe().ok();
    let cwd = std::env::current_dir().context("reading current directory")?;
    Ok(find_root(cli.root.as_deref(), env_root, exe.as_deref(), &cwd)?)
}

fn find_root(
    explicit: Option<&Path>,
    env_root: Option<PathBuf>,
    exe: Option<&Path>,
    cwd: &Path,
) -> Result<PathBuf, ConfigError> {
    if let Some(root) = explicit.map(Path::to_path_buf).or(env_root) {
        return dunce::canonicalize(&root).map_err(|_| ConfigError::RootNotFound);
    }

    if let Some(found) = exe
        .into_iter()
        .flat_map(Path::ancestors)
        .skip(1)
        .find(|dir| dir.join("conf").is_dir())
    {
        return dunce::canonicalize(found).map_err(|_| ConfigError::RootNotFound);
    }

    if cwd.join("conf").is_dir() {
        return Ok(cwd.to_path_buf());
    }

    Err(ConfigError::RootNotFound)
}

fn resolve_home() -> Result<PathBuf, ConfigError> {
    std::env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
        .ok_or(ConfigError::MissingHome)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn explicit_root_wins_over_env() {
        let explicit = tempfile::tempdir().unwrap();
        let env = tempfile::tempdir().unwrap();
        let root = find_root(
            Some(explicit.path()),
            Some(env.path().to_path_buf()),
            None,
            Path::new("/"),
        )
        .unwrap();
        assert_eq!(root, dunce::canonicalize(explicit.path()).unwrap());
    }

    #[test]
    fn env_root_used_without_flag() {
        let env = tempfile::tempdir().unwrap();
        let root = find_root(None, Some(env.path().to_path_buf()), None, Path::new("/")).unwrap();
        assert_eq!(root, dunce::canonicalize(env.path()).unwrap());
    }

    #[test]
    fn nonexistent_explicit_root_is_not_found() {
        let err = find_root(
            Some(Path::new("/definitely/not/here")),
            None,
            None,
            Path::new("/"),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::RootNotFound));
    }

    #[test]
    fn exe_ancestor_with_conf_is_found() {
        let repo = tempfile::tempdir().unwrap();
        fs::create_dir_all(repo.path().join("conf")).unwrap();
        fs::create_dir_all(repo.path().join("cli/target/release")).unwrap();
        let exe = repo.path().join("cli/target/release/dotfiles-setup");

        let root = find_root(None, None, Some(&exe), Path::new("/")).unwrap();
        assert_eq!(root, dunce::canonicalize(repo.path()).unwrap());
    }

    #[test]
    fn cwd_with_conf_is_last_resort() {
        let repo = tempfile::tempdir().unwrap();
        fs::create_dir_all(repo.path().join("conf")).unwrap();
        let root = find_root(None, None, None, repo.path()).unwrap();
        assert_eq!(root, repo.path());
    }

    #[test]
    fn nothing_found_is_an_error() {
        let empty = tempfile::tempdir().unwrap();
        let err = find_root(None, None, None, empty.path()).unwrap_err();
        assert!(err.to_string().contains("--root"));
    }
}
