//! Generic resource processing loop: check state, apply, collect stats.

use anyhow::Result;

use super::{Context, TaskResult};
use crate::logging::ItemKind;
use crate::resources::{Resource, ResourceChange, ResourceState};

/// Counters for batch tasks that process many items.
///
/// Provides consistent summary logging across all tasks.
///
/// # Examples
///
/// ```
/// use dotfiles_setup::tasks::TaskStats;
///
/// let mut stats = TaskStats::new();
/// stats.changed = 3;
/// stats.already_ok = 10;
/// assert_eq!(stats.summary(), "3 changed, 10 already ok");
///
/// stats.skipped = 1;
/// stats.failed = 2;
/// assert_eq!(stats.summary(), "3 changed, 10 already ok, 1 skipped, 2 failed");
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TaskStats {
    /// Number of items changed or applied.
    pub changed: u32,
    /// Number of items already in the correct state.
    pub already_ok: u32,
    /// Number of items left alone (declined, inapplicable or source missing).
    pub skipped: u32,
    /// Number of items that failed without stopping the task.
    pub failed: u32,
}

impl TaskStats {
    /// Create a new empty stats counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Format the summary string (e.g. "3 changed, 10 already ok, 1 skipped").
    #[must_use]
    pub fn summary(&self) -> String {
        let mut out = format!("{} changed, {} already ok", self.changed, self.already_ok);
        if self.skipped > 0 {
            out.push_str(&format!(", {} skipped", self.skipped));
        }
        if self.failed > 0 {
            out.push_str(&format!(", {} failed", self.failed));
        }
        out
    }

    /// Log the summary and return [`TaskResult::Ok`].
    #[must_use]
    pub fn finish(self, ctx: &Context) -> TaskResult {
        ctx.log.info(&self.summary());
        TaskResult::Ok
    }
}

impl std::ops::AddAssign for TaskStats {
    fn add_assign(&mut self, other: Self) {
        self.changed += other.changed;
        self.already_ok += other.already_ok;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

/// Configuration for the generic resource processing loop.
///
/// # Examples
///
/// ```
/// use dotfiles_setup::logging::ItemKind;
/// use dotfiles_setup::tasks::ProcessOpts;
///
/// // Fix everything, bail on errors (strict):
/// let opts = ProcessOpts::apply_all("clone");
/// assert!(opts.bail_on_error());
///
/// // Fix everything, record each failure and keep going:
/// let opts = ProcessOpts::apply_all("install").collect_failures(ItemKind::Package);
/// assert!(!opts.bail_on_error());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ProcessOpts<'a> {
    /// Verb for log messages (e.g., "install", "clone").
    pub verb: &'a str,
    /// When set, failures are warned about and recorded under this kind
    /// instead of failing the task.
    pub failure_kind: Option<ItemKind>,
}

impl<'a> ProcessOpts<'a> {
    /// Fix both missing and incorrect resources, bailing on errors.
    #[must_use]
    pub const fn apply_all(verb: &'a str) -> Self {
        Self {
            verb,
            failure_kind: None,
        }
    }

    /// Warn on errors and record the item as failed instead of bailing.
    #[must_use]
    pub const fn collect_failures(mut self, kind: ItemKind) -> Self {
        self.failure_kind = Some(kind);
        self
    }

    /// Whether an apply error fails the whole task.
    #[must_use]
    pub const fn bail_on_error(&self) -> bool {
        self.failure_kind.is_none()
    }
}

/// Process resources by checking each one's current state and applying as
/// needed, in order.
///
/// # Errors
///
/// Returns an error if a resource's state cannot be determined, or if an
/// apply fails and `opts` does not collect failures.
pub fn process_resources<R: Resource>(
    ctx: &Context,
    resources: impl IntoIterator<Item = R>,
    opts: &ProcessOpts,
) -> Result<TaskResult> {
    let mut stats = TaskStats::new();
    for resource in resources {
        stats += process_single(ctx, &resource, opts)?;
    }
    Ok(stats.finish(ctx))
}

/// Check and, if needed, apply a single resource, returning a stats delta.
///
/// # Errors
///
/// Same as [`process_resources`].
pub fn process_single<R: Resource>(
    ctx: &Context,
    resource: &R,
    opts: &ProcessOpts,
) -> Result<TaskStats> {
    let desc = resource.description();
    let mut delta = TaskStats::new();
    match resource.current_state()? {
        ResourceState::Correct => {
            ctx.log.debug(&format!("ok: {desc}"));
            delta.already_ok += 1;
        }
        ResourceState::Incorrect { current } => {
            ctx.log.debug(&format!("{desc}: {current}"));
            delta += apply_resource(ctx, resource, opts)?;
        }
        ResourceState::Missing => {
            delta += apply_resource(ctx, resource, opts)?;
        }
    }
    Ok(delta)
}

fn apply_resource<R: Resource>(
    ctx: &Context,
    resource: &R,
    opts: &ProcessOpts,
) -> Result<TaskStats> {
    let desc = resource.description();
    let mut delta = TaskStats::new();
    let failure = match resource.apply() {
        Ok(ResourceChange::Applied) => {
            ctx.log.info(&format!("{}: {desc}", opts.verb));
            delta.changed += 1;
            return Ok(delta);
        }
        Ok(ResourceChange::AlreadyCorrect) => {
            delta.already_ok += 1;
            return Ok(delta);
        }
        Err(e) => e,
    };

    let Some(kind) = opts.failure_kind else {
        return Err(failure.context(format!("failed to {} {desc}", opts.verb)));
    };
    ctx.log
        .warn(&format!("failed to {} {desc}: {failure:#}", opts.verb));
    ctx.log.record_failure(kind, &desc);
    delta.failed += 1;
    Ok(delta)
}
