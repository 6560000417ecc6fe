//! Mima CLI - run and check programs for the minimal accumulator machine

use clap::Parser;
use std::process::ExitCode;

use mima::cli::{init_tracing, Cli};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);
    let quiet = cli.quiet;

    match cli.execute() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if !quiet {
                eprintln!("Error: {}", e);
            }
            ExitCode::FAILURE
        }
    }
}
