//! Developer tool resource: a remote script guarded by a `PATH` probe.
use anyhow::Result;
use std::path::Path;

use super::script::{RemoteScript, ScriptRunner};
use super::{Applicable, Resource, ResourceChange, ResourceState};
use crate::config::tools::ToolEntry;
use crate::exec::Executor;

/// A developer tool installed by piping its script to `sh`.
#[derive(Debug)]
pub struct ToolResource<'a> {
    /// The configured tool.
    pub tool: &'a ToolEntry,
    home: &'a Path,
    executor: &'a dyn Executor,
    scripts: &'a dyn ScriptRunner,
}

impl<'a> ToolResource<'a> {
    /// Create a new tool resource.
    #[must_use]
    pub const fn new(
        tool: &'a ToolEntry,
        home: &'a Path,
        executor: &'a dyn Executor,
        scripts: &'a dyn ScriptRunner,
    ) -> Self {
        Self {
            tool,
            home,
            executor,
            scripts,
        }
    }

    fn script(&self) -> RemoteScript {
        RemoteScript {
            url: self.tool.url.clone(),
            shell: "sh",
            args: self.tool.args.clone(),
            env: self.tool.expanded_env(self.home),
        }
    }
}

impl Applicable for ToolResource<'_> {
    fn description(&self) -> String {
        self.tool.name.clone()
    }

    fn apply(&self) -> Result<ResourceChange> {
        self.scripts.run(&self.script())?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for ToolResource<'_> {
    fn current_state(&self) -> Result<ResourceState> {
        Ok(if self.executor.which(self.tool.probe_command()) {
            ResourceState::Correct
        } else {
            ResourceState::Missing
        })
    }
}
