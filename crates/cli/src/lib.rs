//! # pbxgraft CLI
//!
//! Hook driver that grafts an app extension into the Xcode project of a
//! Cordova iOS platform.
//!
//! ## Commands
//!
//! - `copy` - Stage the extension template in the iOS platform folder
//! - `add` - Add the extension target, group and files to the project
//! - `remove` - Remove the extension group and target from the project
//! - `inspect` - Print the targets, phases and group tree of the project
//!

pub mod commands;
pub mod config;
pub mod context;
pub mod report;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub use config::HookConfig;
pub use context::HookContext;

/// CLI version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// pbxgraft - graft app extensions into Xcode projects
#[derive(Parser, Debug)]
#[command(name = "pbxgraft")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOptions,
}

/// Options available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalOptions {
    /// Root of the Cordova project
    #[arg(
        long,
        global = true,
        env = "PBXGRAFT_PROJECT_ROOT",
        default_value = "."
    )]
    pub project_root: PathBuf,

    /// iOS platform folder (defaults to <project-root>/platforms/ios)
    #[arg(long, global = true)]
    pub ios_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Name of the extension folder, target and group
    #[arg(long, global = true, default_value = config::DEFAULT_EXTENSION_NAME)]
    pub name: String,

    /// Group receiving the extension group
    #[arg(long, global = true, default_value = config::DEFAULT_PARENT_GROUP)]
    pub parent_group: String,

    /// Report what would change without writing anything
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Keep a .backup copy of project.pbxproj before overwriting it
    #[arg(long, global = true)]
    pub backup: bool,
}

impl GlobalOptions {
    /// Hook configuration from the global flags
    pub fn hook_config(&self) -> HookConfig {
        let mut config = HookConfig::new()
            .with_extension_name(&self.name)
            .with_parent_group(&self.parent_group);
        if self.dry_run {
            config = config.dry_run();
        }
        if self.backup {
            config = config.with_backup();
        }
        config
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Copy the extension template into the iOS platform folder
    Copy(commands::copy::CopyArgs),

    /// Add the extension target, group and files to the Xcode project
    Add(commands::add::AddArgs),

    /// Remove the extension group and target from the Xcode project
    Remove(commands::remove::RemoveArgs),

    /// Show the targets, build phases and groups of the Xcode project
    Inspect(commands::inspect::InspectArgs),
}

/// Run a parsed command line
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Copy(args) => commands::copy::execute(args, cli.global),
        Commands::Add(args) => commands::add::execute(args, cli.global),
        Commands::Remove(args) => commands::remove::execute(args, cli.global),
        Commands::Inspect(args) => commands::inspect::execute(args, cli.global),
    }
}
