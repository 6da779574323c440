use clap::Parser;

/// Top-level CLI entry point for the provisioning tool.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "dotfiles-setup",
    about = "Install packages and link dotfiles into the home directory",
    version
)]
pub struct Cli {
    /// Prompt before replacing conflicting files (default)
    #[arg(short, long, conflicts_with = "non_interactive")]
    pub interactive: bool,

    /// Never prompt; conflicting files are skipped unless forced
    #[arg(long)]
    pub non_interactive: bool,

    /// Back up and replace conflicting files without prompting
    #[arg(long)]
    pub force_overwrite: bool,

    /// Append to existing shell startup files instead of replacing them
    #[arg(long)]
    pub append: bool,

    /// Skip the package manager, packages and developer tools
    #[arg(long)]
    pub skip_packages: bool,

    /// Override the provisioning repository root
    #[arg(long)]
    pub root: Option<std::path::PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}
