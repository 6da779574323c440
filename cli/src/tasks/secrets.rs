use anyhow::Result;

use super::{Context, ProcessOpts, Task, TaskResult, process_resources};
use crate::resources::Resource as _;
use crate::resources::secrets::SecretsFileResource;

/// Create `~/.secrets` from known API key exports, migrating any values
/// already exported in the shell startup files.
#[derive(Debug)]
pub struct CreateSecretsFile;

impl Task for CreateSecretsFile {
    fn name(&self) -> &'static str {
        "Create secrets file"
    }

    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let resource = SecretsFileResource::for_home(ctx.home());
        if resource.needs_change()? {
            let (_, migrated) = resource.render();
            ctx.log
                .debug(&format!("{migrated} existing value(s) to migrate"));
        }
        process_resources(ctx, [resource], &ProcessOpts::apply_all("create"))
    }
}
