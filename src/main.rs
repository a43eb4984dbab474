//! Segmentar CLI
//!
//! Training entry point for the segmentar library.
//!
//! # Usage
//!
//! ```bash
//! # Train from an experiment file
//! segmentar train experiment.json
//!
//! # Resume an interrupted run
//! segmentar train experiment.json --resume
//!
//! # Validate a config
//! segmentar validate experiment.json
//!
//! # Show config info
//! segmentar info experiment.json
//! ```

use clap::Parser;
use segmentar::cli::{run_command, Cli};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
