use anyhow::Result;
use clap::Parser;
use std::sync::Arc;

use dotfiles_setup::{cli, commands, logging};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = cli::Cli::parse();
    logging::init_subscriber(args.verbose, "setup");
    let log = Arc::new(logging::Logger::new("setup"));

    commands::setup::run(&args, &log)
}
