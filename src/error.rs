//! Crate-level error type
//!
//! Each subsystem defines its own `thiserror` enum; this type unifies them at
//! the API boundary so callers can use a single `Result` alias.

use crate::config::ValidationError;
use crate::data::DataError;
use crate::train::CheckpointError;

/// Crate-level result alias
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error for the training core
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration failed to load or validate
    #[error("config error: {0}")]
    Config(String),

    /// A configuration value is out of range or unresolvable
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Dataset-level failure (empty split, unreadable sample set)
    #[error(transparent)]
    Data(#[from] DataError),

    /// Checkpoint persistence or restore failure
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    /// Filesystem failure outside checkpoint handling
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
