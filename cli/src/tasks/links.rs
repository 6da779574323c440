use anyhow::Result;

use super::{Context, Task, TaskResult, TaskStats};
use crate::logging::ItemKind;
use crate::reconcile::{LinkRequest, Outcome, Reconciler};

/// Reconcile one request, turning its outcome into a stats delta.
///
/// A failed request is logged as a warning and recorded; it never stops
/// the caller from moving on to the next request.
pub(super) fn reconcile_request(
    ctx: &Context,
    reconciler: &Reconciler<'_>,
    req: &LinkRequest,
) -> TaskStats {
    let mut delta = TaskStats::new();
    match reconciler.reconcile(req) {
        Ok(Outcome::Created | Outcome::Overwritten | Outcome::Appended) => delta.changed += 1,
        Ok(Outcome::AlreadyLinked) => delta.already_ok += 1,
        Ok(Outcome::Skipped | Outcome::SourceMissing) => delta.skipped += 1,
        Err(e) => {
            ctx.log.warn(&format!("{e}"));
            ctx.log
                .record_failure(ItemKind::Link, &req.target.display().to_string());
            delta.failed += 1;
        }
    }
    delta
}

/// Reconcile every configured (source, target) pair against `$HOME`.
#[derive(Debug)]
pub struct ReconcileDotfiles;

impl Task for ReconcileDotfiles {
    fn name(&self) -> &'static str {
        "Reconcile dotfiles"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.config.links.is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let requests = ctx.config.link_requests(ctx.home());
        ctx.log
            .debug(&format!("{} links to reconcile", requests.len()));

        let reconciler = ctx.reconciler();
        let mut stats = TaskStats::new();
        for req in &requests {
            stats += reconcile_request(ctx, &reconciler, req);
        }
        Ok(stats.finish(ctx))
    }
}
