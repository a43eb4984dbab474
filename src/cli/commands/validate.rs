//! Validate command implementation

use crate::cli::args::ValidateArgs;
use crate::cli::logging::{log, LogLevel};
use crate::config::load_config;

pub fn run_validate(args: ValidateArgs, level: LogLevel) -> Result<(), String> {
    let cfg = load_config(&args.config).map_err(|e| format!("Config error: {e}"))?;

    log(level, LogLevel::Normal, &format!("{}: valid", args.config.display()));

    if args.detailed {
        log(level, LogLevel::Normal, &format!("  Experiment: {}", cfg.name));
        log(
            level,
            LogLevel::Normal,
            &format!(
                "  Split: {:.2}/{:.2}/{:.2} seed {}",
                cfg.data_split.train_size,
                cfg.data_split.validation_size,
                cfg.data_split.test_size,
                cfg.data_split.seed,
            ),
        );
        log(
            level,
            LogLevel::Normal,
            &format!(
                "  Model: {} / {} / {}",
                cfg.model.model_type, cfg.model.arch_type, cfg.model.criterion
            ),
        );
        log(
            level,
            LogLevel::Normal,
            &format!(
                "  Early stop: {} {} patience {} after {} epochs",
                cfg.training.early_stop.monitor,
                match cfg.training.early_stop.direction {
                    crate::config::Direction::Min => "min",
                    crate::config::Direction::Max => "max",
                },
                cfg.training.early_stop.patience,
                cfg.training.early_stop.min_epochs,
            ),
        );
    }
    Ok(())
}
