//! aymix - AY-3-8910 channel dump mixer
//!
//! Command-line interface for rendering channel dumps to FLAC.

use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;
use log::info;

use aymix::cli::{commands, Cli};

fn main() -> ExitCode {
    // Usage errors exit here with status 2 before any file is touched
    let cli = Cli::parse();

    env_logger::Builder::from_env(Env::default().default_filter_or(cli.default_log_filter()))
        .init();

    info!("aymix v{}", env!("CARGO_PKG_VERSION"));

    match commands::render_command(&cli.basename) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error[{}]: {}", err.error_code(), err);
            for suggestion in err.recovery_suggestions() {
                eprintln!("  hint: {}", suggestion);
            }
            ExitCode::FAILURE
        }
    }
}
