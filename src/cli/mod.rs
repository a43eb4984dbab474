//! CLI module
//!
//! Command handlers and output utilities; `main` parses and dispatches here.

mod args;
mod commands;
mod logging;

pub use args::{apply_overrides, parse_args, Cli, Command, InfoArgs, TrainArgs, ValidateArgs};
pub use commands::run_command;
pub use logging::{log, LogLevel};
