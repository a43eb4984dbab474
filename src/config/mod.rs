//! Typed, validated training configuration
//!
//! The configuration is loaded once from a JSON experiment file into an
//! immutable [`Config`] value and handed explicitly to each component; no
//! component reads configuration through ambient lookup.

mod loader;
mod schema;
mod validate;

pub use loader::{load_config, load_config_with};
pub use schema::{
    AugmentationSection, Config, DataOptsSection, DataSplitSection, Direction, EarlyStopSection,
    ModelSection, TrainingSection, VisualisationSection,
};
pub(crate) use validate::validate_augmentation;
pub use validate::{validate_config, ValidationError, RATIO_TOLERANCE};
