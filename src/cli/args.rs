//! CLI argument parsing
//!
//! ```bash
//! segmentar train experiment.json
//! segmentar train experiment.json --epochs 50 --seed 7
//! segmentar train experiment.json --resume
//! segmentar validate experiment.json
//! segmentar info experiment.json
//! ```

use clap::{Parser, Subcommand};
use std::ffi::OsString;
use std::path::PathBuf;

use crate::config::Config;

/// Segmentar: perfusion-CT segmentation training core
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "segmentar")]
#[command(version)]
#[command(about = "Training core for perfusion-CT infarct segmentation")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run a training session from a JSON experiment file
    Train(TrainArgs),

    /// Validate an experiment file without training
    Validate(ValidateArgs),

    /// Display information about an experiment file
    Info(InfoArgs),
}

/// Arguments for the train command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct TrainArgs {
    /// Path to the JSON experiment file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Resume from the latest checkpoint of this experiment
    #[arg(short, long)]
    pub resume: bool,

    /// Resume from a specific completed-epoch record (implies --resume)
    #[arg(long, value_name = "EPOCH")]
    pub which_epoch: Option<i64>,

    /// Override number of epochs
    #[arg(short, long)]
    pub epochs: Option<usize>,

    /// Override batch size
    #[arg(short, long)]
    pub batch_size: Option<usize>,

    /// Override learning rate
    #[arg(short, long)]
    pub lr: Option<f32>,

    /// Override the run seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Validate the config and report the planned run without training
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the validate command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ValidateArgs {
    /// Path to the JSON experiment file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Show a detailed validation report
    #[arg(short, long)]
    pub detailed: bool,
}

/// Arguments for the info command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct InfoArgs {
    /// Path to the JSON experiment file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,
}

/// Parse arguments from an iterator, for tests and embedding
pub fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Cli::try_parse_from(args)
}

/// Fold command-line overrides into a loaded configuration
pub fn apply_overrides(cfg: &mut Config, args: &TrainArgs) {
    if let Some(epochs) = args.epochs {
        cfg.training.n_epochs = epochs;
    }
    if let Some(batch_size) = args.batch_size {
        cfg.training.batch_size = batch_size;
    }
    if let Some(lr) = args.lr {
        cfg.model.learning_rate = lr;
    }
    if let Some(seed) = args.seed {
        cfg.data_split.seed = seed;
    }
    if args.resume || args.which_epoch.is_some() {
        cfg.model.continue_train = true;
    }
    if let Some(which) = args.which_epoch {
        cfg.model.which_epoch = which;
    }
}
