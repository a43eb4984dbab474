//! Configuration loading
//!
//! Reads a JSON experiment file, parses it into the typed schema and runs
//! validation. This is the only place configuration enters the system; the
//! resulting [`Config`] value is immutable and passed explicitly to every
//! component that needs it.

use crate::config::schema::Config;
use crate::config::validate::validate_config;
use crate::error::{Error, Result};
use crate::model::{CriterionRegistry, ModelRegistry};
use std::fs;
use std::path::Path;

/// Load, parse and validate a configuration file against the given registries
///
/// # Errors
///
/// Returns `Error::Config` when the file is unreadable or not valid JSON for
/// the schema, and `Error::Validation` when a value is out of range or a
/// registry key does not resolve.
pub fn load_config_with<P: AsRef<Path>>(
    config_path: P,
    models: &ModelRegistry,
    criteria: &CriterionRegistry,
) -> Result<Config> {
    let raw = fs::read_to_string(config_path.as_ref()).map_err(|e| {
        Error::Config(format!(
            "failed to read config file {}: {e}",
            config_path.as_ref().display()
        ))
    })?;

    let cfg: Config = serde_json::from_str(&raw)
        .map_err(|e| Error::Config(format!("failed to parse JSON config: {e}")))?;

    validate_config(&cfg, models, criteria)?;

    Ok(cfg)
}

/// Load a configuration using the built-in registries
pub fn load_config<P: AsRef<Path>>(config_path: P) -> Result<Config> {
    load_config_with(
        config_path,
        &ModelRegistry::with_builtins(),
        &CriterionRegistry::with_builtins(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const VALID: &str = r#"{
        "name": "roundtrip",
        "training": {
            "n_epochs": 3,
            "early_stop": {"direction": "min", "patience": 2}
        },
        "data_split": {"train_size": 0.8, "test_size": 0.1, "validation_size": 0.1, "seed": 3},
        "data_path": ".",
        "data_opts": {"scale_size": [8, 8, 4], "n_channels": 1},
        "model": {
            "model_type": "seg",
            "arch_type": "unet",
            "criterion": "dice",
            "learning_rate": 0.01,
            "gpu_ids": [0]
        }
    }"#;

    #[test]
    fn test_load_valid_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(VALID.as_bytes()).unwrap();
        let cfg = load_config(file.path()).unwrap();
        assert_eq!(cfg.name, "roundtrip");
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = load_config("/nonexistent/experiment.json").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_malformed_json_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{not json").unwrap();
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_out_of_range_value_is_validation_error() {
        let bad = VALID.replacen("\"train_size\": 0.8", "\"train_size\": 0.9", 1);
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(bad.as_bytes()).unwrap();
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
