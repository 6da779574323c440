//! The conflict policy: which single action a request gets.
use super::LinkRequest;
use super::prompt::{ConflictChoice, Prompter};
use crate::resources::symlink::TargetState;
use crate::settings::Mode;

/// The one action taken for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Create a symlink at an absent target.
    Link,
    /// Copy the source verbatim to an absent target.
    CopyNew,
    /// Back up, then write existing content + banner + source.
    Append,
    /// Back up, then replace the target with a symlink.
    Overwrite,
    /// Nothing to do; the target already links to the source.
    AlreadyLinked,
    /// Leave the target untouched.
    Skip,
}

/// Decide the action for `req` given the target's current `state`.
///
/// The source is assumed to exist. `prompter` is consulted only when
/// prompts are enabled and the target conflicts.
#[must_use]
pub fn decide(
    req: &LinkRequest,
    state: &TargetState,
    mode: Mode,
    prompter: &dyn Prompter,
) -> Action {
    let already_linked = state.links_to(&req.source);

    if req.mergeable && mode.appends() {
        return match state {
            TargetState::Absent => Action::CopyNew,
            _ if already_linked => Action::AlreadyLinked,
            _ => Action::Append,
        };
    }

    match state {
        TargetState::Absent => Action::Link,
        _ if already_linked => Action::AlreadyLinked,
        _ => resolve_conflict(req, mode, prompter),
    }
}

fn resolve_conflict(req: &LinkRequest, mode: Mode, prompter: &dyn Prompter) -> Action {
    if req.replace_conflicts || mode.force_overwrite {
        return Action::Overwrite;
    }

    if req.mergeable {
        if !mode.prompts_enabled() {
            return Action::Overwrite;
        }
        return match prompter.choose_conflict(&req.target) {
            Some(ConflictChoice::Overwrite) | None => Action::Overwrite,
            Some(ConflictChoice::Append) => Action::Append,
            Some(ConflictChoice::Skip) => Action::Skip,
        };
    }

    if mode.prompts_enabled() && prompter.confirm_overwrite(&req.target) {
        Action::Overwrite
    } else {
        Action::Skip
    }
}
