//! Terminal output

use colored::Colorize;
use std::fmt::Display;

/// Prefix of every line printed for the user
pub const PREFIX: &str = "[pbxgraft]";

/// Announce a step
pub fn step(message: impl Display) {
    println!("{} {}", PREFIX.cyan(), message);
}

/// Detail line under a step
pub fn detail(message: impl Display) {
    println!("    {}", message);
}

/// Successful outcome
pub fn success(message: impl Display) {
    println!("{} {} {}", PREFIX.cyan(), "✓".green().bold(), message);
}

/// Something the user should look at
pub fn warning(message: impl Display) {
    eprintln!("{} {} {}", PREFIX.cyan(), "warning:".yellow().bold(), message);
}

/// Print a failure with its chain of causes
pub fn error(err: &anyhow::Error) {
    eprintln!("{} {} {}", PREFIX.cyan(), "error:".red().bold(), err);
    for cause in err.chain().skip(1) {
        eprintln!("    {} {}", "caused by:".red(), cause);
    }
}
