use anyhow::Result;

use super::{Context, ProcessOpts, Task, TaskResult, process_resources};
use crate::logging::ItemKind;
use crate::resources::tool::ToolResource;

/// Run the install script of every configured developer tool that is not
/// yet on `PATH`.
#[derive(Debug)]
pub struct InstallTools;

impl Task for InstallTools {
    fn name(&self) -> &'static str {
        "Install developer tools"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.settings.skip_packages && !ctx.config.tools.is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let resources = ctx.config.tools.iter().map(|tool| {
            ToolResource::new(
                tool,
                ctx.home(),
                ctx.executor.as_ref(),
                ctx.scripts.as_ref(),
            )
        });
        process_resources(
            ctx,
            resources,
            &ProcessOpts::apply_all("install").collect_failures(ItemKind::Tool),
        )
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::config::tools::ToolEntry;
    use crate::resources::test_helpers::{MockExecutor, RecordingScripts};
    use crate::tasks::test_helpers::make_context;
    use std::sync::Arc;

    fn tool(name: &str) -> ToolEntry {
        ToolEntry {
            name: name.to_string(),
            url: format!("https://example.invalid/{name}.sh"),
            command: None,
            args: vec![],
            env: std::collections::BTreeMap::new(),
        }
    }

    #[test]
    fn not_applicable_when_skipping_packages() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut ctx, _log) = make_context(tmp.path(), tmp.path());
        ctx.config.tools = vec![tool("uv")];
        ctx.settings.skip_packages = true;
        assert!(!InstallTools.should_run(&ctx));
    }

    #[test]
    fn missing_tools_run_their_scripts() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut ctx, log) = make_context(tmp.path(), tmp.path());
        ctx.config.tools = vec![tool("uv"), tool("rustup")];
        let scripts = Arc::new(RecordingScripts::default());
        ctx.scripts = scripts.clone();

        InstallTools.run(&ctx).unwrap();
        let urls: Vec<String> = scripts.scripts().into_iter().map(|s| s.url).collect();
        assert_eq!(
            urls,
            vec![
                "https://example.invalid/uv.sh",
                "https://example.invalid/rustup.sh"
            ]
        );
        assert!(log.failures().is_empty());
    }

    #[test]
    fn present_tools_are_left_alone() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut ctx, _log) = make_context(tmp.path(), tmp.path());
        ctx.config.tools = vec![tool("uv")];
        ctx.executor = Arc::new(MockExecutor::with_responses(vec![]).with_which(true));
        let scripts = Arc::new(RecordingScripts::default());
        ctx.scripts = scripts.clone();

        InstallTools.run(&ctx).unwrap();
        assert!(scripts.scripts().is_empty());
    }

    #[test]
    fn each_script_failure_is_independent() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut ctx, log) = make_context(tmp.path(), tmp.path());
        ctx.config.tools = vec![tool("uv"), tool("rustup")];
        let scripts = Arc::new(RecordingScripts::failing());
        ctx.scripts = scripts.clone();

        assert_eq!(InstallTools.run(&ctx).unwrap(), TaskResult::Ok);
        assert_eq!(scripts.scripts().len(), 2, "second tool still attempted");
        let names: Vec<String> = log.failures().into_iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["uv", "rustup"]);
    }
}
