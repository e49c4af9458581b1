use std::process::ExitCode;

use clap::Parser;
use homebus_runner::{run_cli, Cli};

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run_cli(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("homebus: {}", e);
            ExitCode::FAILURE
        }
    }
}
