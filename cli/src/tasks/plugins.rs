use anyhow::{Context as _, Result};
use std::path::PathBuf;

use super::{Context, ProcessOpts, Task, TaskResult, process_resources};
use crate::resources::git::CloneResource;

/// Upstream repository of the tmux plugin manager.
pub const TPM_URL: &str = "https://github.com/tmux-plugins/tpm";

fn tpm_dir(ctx: &Context) -> PathBuf {
    ctx.home().join(".tmux/plugins/tpm")
}

fn install_plugins_script(ctx: &Context) -> PathBuf {
    tpm_dir(ctx).join("bin/install_plugins")
}

/// Clone the tmux plugin manager when it is absent.
#[derive(Debug)]
pub struct BootstrapTmuxPluginManager;

impl Task for BootstrapTmuxPluginManager {
    fn name(&self) -> &'static str {
        "Bootstrap tmux plugin manager"
    }

    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let dest = tpm_dir(ctx);
        let marker = dest.join("tpm");
        let resource = CloneResource::new(
            TPM_URL,
            dest,
            marker,
            ctx.cloner.as_ref(),
            &ctx.backups,
        );
        process_resources(ctx, [resource], &ProcessOpts::apply_all("clone"))
    }
}

/// Post-install hook: let the plugin manager fetch the configured plugins.
#[derive(Debug)]
pub struct InstallTmuxPlugins;

impl Task for InstallTmuxPlugins {
    fn name(&self) -> &'static str {
        "Install tmux plugins"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.settings.ci
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let script = install_plugins_script(ctx);
        if !script.exists() {
            return Ok(TaskResult::Skipped(format!(
                "{} not found",
                script.display()
            )));
        }
        let program = script.to_string_lossy();
        ctx.executor
            .run(&program, &[])
            .context("installing tmux plugins")?;
        Ok(TaskResult::Ok)
    }
}
