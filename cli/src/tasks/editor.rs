use anyhow::{Context as _, Result};
use std::path::PathBuf;

use super::links::reconcile_request;
use super::{Context, ProcessOpts, Task, TaskResult, process_single};
use crate::reconcile::LinkRequest;
use crate::resources::git::CloneResource;

/// Editor starter template cloned when the repository has no config yet.
pub const STARTER_URL: &str = "https://github.com/LazyVim/starter";

fn editor_source(ctx: &Context) -> PathBuf {
    ctx.root().join("nvim")
}

/// The request linking `~/.config/nvim` to the repository's editor config.
///
/// A conflicting directory is backed up and replaced without asking.
#[must_use]
pub fn editor_link(ctx: &Context) -> LinkRequest {
    LinkRequest {
        source: editor_source(ctx),
        target: ctx.home().join(".config/nvim"),
        mergeable: false,
        replace_conflicts: true,
    }
}

/// Ensure the editor config exists in the repository, cloning the starter
/// template if needed, then link it into `~/.config`.
#[derive(Debug)]
pub struct BootstrapEditor;

impl Task for BootstrapEditor {
    fn name(&self) -> &'static str {
        "Bootstrap editor"
    }

    fn is_critical(&self) -> bool {
        true
    }

    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let dest = editor_source(ctx);
        let marker = dest.join("init.lua");
        let template = CloneResource::new(
            STARTER_URL,
            dest,
            marker,
            ctx.cloner.as_ref(),
            &ctx.backups,
        );
        let mut stats = process_single(ctx, &template, &ProcessOpts::apply_all("clone"))
            .context("editor starter template")?;

        stats += reconcile_request(ctx, &ctx.reconciler(), &editor_link(ctx));
        Ok(stats.finish(ctx))
    }
}

#[cfg(all(test, unix))]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::resources::git::test_helpers::FakeCloner;
    use crate::tasks::test_helpers::make_context;
    use std::fs;
    use std::sync::Arc;

    fn dirs() -> (tempfile::TempDir, PathBuf, PathBuf) {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("repo");
        let home = tmp.path().join("home");
        fs::create_dir_all(&root).unwrap();
        fs::create_dir_all(&home).unwrap();
        (tmp, root, home)
    }

    #[test]
    fn clones_starter_and_links_config() {
        let (_tmp, root, home) = dirs();
        let (mut ctx, _log) = make_context(&root, &home);
        let cloner = Arc::new(FakeCloner::writing("init.lua"));
        ctx.cloner = cloner.clone();

        assert_eq!(BootstrapEditor.run(&ctx).unwrap(), TaskResult::Ok);
        assert_eq!(cloner.call_count(), 1);
        assert!(root.join("nvim/init.lua").exists());
        assert_eq!(
            fs::read_link(home.join(".config/nvim")).unwrap(),
            root.join("nvim")
        );
    }

    #[test]
    fn existing_config_is_not_recloned() {
        let (_tmp, root, home) = dirs();
        fs::create_dir_all(root.join("nvim")).unwrap();
        fs::write(root.join("nvim/init.lua"), "-- mine").unwrap();
        let (mut ctx, _log) = make_context(&root, &home);
        let cloner = Arc::new(FakeCloner::writing("init.lua"));
        ctx.cloner = cloner.clone();

        BootstrapEditor.run(&ctx).unwrap();
        assert_eq!(cloner.call_count(), 0);
        assert_eq!(fs::read_to_string(root.join("nvim/init.lua")).unwrap(), "-- mine");
    }

    #[test]
    fn existing_vimscript_config_is_backed_up_before_clone() {
        let (_tmp, root, home) = dirs();
        fs::create_dir_all(root.join("nvim")).unwrap();
        fs::write(root.join("nvim/init.vim"), "set number").unwrap();
        let (mut ctx, _log) = make_context(&root, &home);
        let cloner = Arc::new(FakeCloner::writing("init.lua"));
        ctx.cloner = cloner.clone();

        BootstrapEditor.run(&ctx).unwrap();
        assert_eq!(cloner.call_count(), 1);
        assert!(root.join("nvim/init.lua").exists());
        let saved = ctx.backups.dir_if_used().expect("backup dir created");
        let entries: Vec<_> = fs::read_dir(saved)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(
            fs::read_to_string(entries[0].join("init.vim")).unwrap(),
            "set number"
        );
    }

    #[test]
    fn conflicting_config_dir_is_backed_up_and_replaced() {
        let (_tmp, root, home) = dirs();
        fs::create_dir_all(root.join("nvim")).unwrap();
        fs::write(root.join("nvim/init.lua"), "").unwrap();
        fs::create_dir_all(home.join(".config/nvim")).unwrap();
        fs::write(home.join(".config/nvim/init.vim"), "set nu").unwrap();
        let (ctx, _log) = make_context(&root, &home);

        BootstrapEditor.run(&ctx).unwrap();
        assert!(home.join(".config/nvim").is_symlink());
        let backup = ctx.backups.dir().join(".config_nvim.bak");
        assert_eq!(fs::read_to_string(backup.join("init.vim")).unwrap(), "set nu");
    }

    #[test]
    fn clone_failure_is_an_error() {
        let (_tmp, root, home) = dirs();
        let (mut ctx, _log) = make_context(&root, &home);
        ctx.cloner = Arc::new(FakeCloner::failing());

        assert!(BootstrapEditor.is_critical());
        let err = BootstrapEditor.run(&ctx).unwrap_err();
        assert!(format!("{err:#}").contains("editor starter template"));
        assert!(!home.join(".config/nvim").exists());
    }
}
