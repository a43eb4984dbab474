//! Info command implementation

use crate::cli::args::InfoArgs;
use crate::cli::logging::{log, LogLevel};
use crate::config::load_config;

pub fn run_info(args: InfoArgs, level: LogLevel) -> Result<(), String> {
    let cfg = load_config(&args.config).map_err(|e| format!("Config error: {e}"))?;

    log(level, LogLevel::Normal, &format!("Experiment: {}", cfg.name));
    log(level, LogLevel::Normal, &format!("  Dataset: {} at {}", cfg.data_opts.dataset, cfg.data_path.display()));
    log(
        level,
        LogLevel::Normal,
        &format!(
            "  Volume: {:?} x {} channels, {} classes",
            cfg.data_opts.scale_size, cfg.data_opts.n_channels, cfg.data_opts.n_classes
        ),
    );
    log(
        level,
        LogLevel::Normal,
        &format!(
            "  Training: {} epochs, batch {}, checkpoint every {}",
            cfg.training.n_epochs, cfg.training.batch_size, cfg.training.save_epoch_freq
        ),
    );
    log(
        level,
        LogLevel::Normal,
        &format!(
            "  Model: {} ({}), criterion {}, optimizer {} @ {:.1e}",
            cfg.model.arch_type,
            cfg.model.model_type,
            cfg.model.criterion,
            cfg.model.optimizer,
            cfg.model.learning_rate,
        ),
    );
    log(
        level,
        LogLevel::Normal,
        &format!(
            "  Checkpoints: {}",
            cfg.checkpoints_dir.join(&cfg.name).display()
        ),
    );
    log(level, LogLevel::Verbose, &format!("  GPUs: {:?}", cfg.model.gpu_ids));
    Ok(())
}
