use anyhow::{Context as _, Result};

use super::{Context, ProcessOpts, Task, TaskResult, process_resources};
use crate::error::ResourceError;
use crate::logging::ItemKind;
use crate::platform::Os;
use crate::resources::package::PackageResource;

/// Make sure the platform package manager is usable, installing Homebrew
/// from its script on macOS when it is absent.
#[derive(Debug)]
pub struct BootstrapPackageManager;

impl Task for BootstrapPackageManager {
    fn name(&self) -> &'static str {
        "Bootstrap package manager"
    }

    fn is_critical(&self) -> bool {
        true
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.settings.skip_packages && ctx.platform.os != Os::Other
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let Some(installer) = &ctx.installer else {
            return Err(ResourceError::NoPackageManager {
                platform: ctx.platform.os.to_string(),
            }
            .into());
        };
        ctx.log.debug(&format!("using {}", installer.name()));
        installer
            .bootstrap(ctx.scripts.as_ref())
            .with_context(|| format!("bootstrapping {}", installer.name()))?;
        Ok(TaskResult::Ok)
    }
}

/// Install every configured package, one invocation per package.
#[derive(Debug)]
pub struct InstallPackages;

impl Task for InstallPackages {
    fn name(&self) -> &'static str {
        "Install packages"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.settings.skip_packages && !ctx.config.packages.is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let Some(installer) = &ctx.installer else {
            return Ok(TaskResult::Skipped("no package manager".to_string()));
        };
        if let Some(limit) = ctx.settings.package_timeout {
            ctx.log
                .debug(&format!("per-package timeout: {}s", limit.as_secs()));
        }
        ctx.log.debug(&format!(
            "{} packages to process",
            ctx.config.packages.len()
        ));

        let resources = ctx.config.packages.iter().map(|pkg| {
            PackageResource::new(pkg, installer.as_ref(), ctx.settings.package_timeout)
        });
        process_resources(
            ctx,
            resources,
            &ProcessOpts::apply_all("install").collect_failures(ItemKind::Package),
        )
    }
}
