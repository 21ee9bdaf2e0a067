//! pbxgraft - graft app extensions into Xcode projects
//!
//! Driven by the hooks of a Cordova plugin:
//!
//! ```bash
//! # stage the extension template
//! pbxgraft copy
//!
//! # add the extension target to platforms/ios/<App>.xcodeproj
//! pbxgraft add IOS_URL_SCHEME=myapp
//!
//! # take it out again
//! pbxgraft remove
//! ```

use clap::Parser;
use pbxgraft_cli::{Cli, report};
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.global.quiet {
        "warn"
    } else if cli.global.verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    tracing::debug!(version = pbxgraft_cli::VERSION, "Starting pbxgraft");

    match pbxgraft_cli::execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report::error(&err);
            ExitCode::FAILURE
        }
    }
}
