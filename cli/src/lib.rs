//! Personal environment provisioning engine.
//!
//! Installs packages through the platform package manager, bootstraps the
//! tmux plugin manager and an editor starter template, writes a secrets
//! file, and reconciles the configured dotfiles against `$HOME`.
//!
//! The public API is organised into layers:
//!
//! - **[`config`]** : load the TOML lists in `conf/`
//! - **[`settings`]** : resolve CLI flags and CI detection into a [`settings::Mode`]
//! - **[`reconcile`]** : the conflict policy for one (source, target) pair
//! - **[`resources`]** : backups, symlinks and the external capabilities
//!   (package managers, git, install scripts)
//! - **[`tasks`]** : the ordered units of work the driver runs
//! - **[`commands`]** : top-level orchestration
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod logging;
pub mod platform;
pub mod reconcile;
pub mod resources;
pub mod settings;
pub mod tasks;
