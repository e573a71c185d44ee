//! stackres CLI entry point
//!
//! Parses arguments, runs the command and maps any error to a user-friendly
//! message and exit code 1.

use anyhow::Result;
use clap::Parser;
use stack_resolver::cli;
use stack_resolver::core::error::user_friendly_error;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute() {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
