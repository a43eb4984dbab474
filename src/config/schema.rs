//! JSON schema for the training configuration
//!
//! The on-disk format mirrors the experiment files used for the perfusion-CT
//! runs: seven sections (`training`, `visualisation`, `data_split`,
//! `data_path`, `data_opts`, `augmentation`, `model`) plus the experiment
//! name and checkpoint root. Unknown keys are ignored; missing required keys
//! fail at parse time. Truthy values may arrive as real JSON booleans or as
//! Python-style quoted strings (`"True"`/`"False"`).

use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

/// Deserialize a bool from either a JSON boolean (`true`) or a quoted string
/// (`"True"`, `"false"`, ...). The source configs were written by a Python
/// tool that quotes its booleans.
fn deserialize_bool_lenient<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        Str(String),
    }

    match BoolOrString::deserialize(deserializer)? {
        BoolOrString::Bool(b) => Ok(b),
        BoolOrString::Str(s) => match s.to_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "expected 'true' or 'false', got '{other}'"
            ))),
        },
    }
}

/// Improvement direction of the monitored metric
///
/// Always explicit in the config; never inferred from the metric name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Lower values are better (losses)
    Min,
    /// Higher values are better (scores)
    Max,
}

impl Direction {
    /// True when `candidate` improves on `best` in this direction
    pub fn improves(self, candidate: f64, best: f64) -> bool {
        match self {
            Direction::Min => candidate < best,
            Direction::Max => candidate > best,
        }
    }

    /// Worst representable value, used to seed best-so-far tracking
    pub fn worst(self) -> f64 {
        match self {
            Direction::Min => f64::INFINITY,
            Direction::Max => f64::NEG_INFINITY,
        }
    }
}

/// Complete training configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Experiment name; checkpoint records live under
    /// `checkpoints_dir/<name>/`
    pub name: String,

    /// Root directory for checkpoint storage
    #[serde(default = "default_checkpoints_dir")]
    pub checkpoints_dir: PathBuf,

    /// Epoch-loop hyperparameters
    pub training: TrainingSection,

    /// Display-server wiring, consumed by an external collaborator
    #[serde(default)]
    pub visualisation: VisualisationSection,

    /// Train/val/test partition ratios and seed
    pub data_split: DataSplitSection,

    /// Dataset root directory
    pub data_path: PathBuf,

    /// Volume geometry and domain tag
    pub data_opts: DataOptsSection,

    /// Stochastic augmentation parameters
    #[serde(default)]
    pub augmentation: AugmentationSection,

    /// Model selection, optimizer, and learning-rate policy
    pub model: ModelSection,
}

fn default_checkpoints_dir() -> PathBuf {
    PathBuf::from("./checkpoints")
}

/// Epoch-loop hyperparameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSection {
    /// Maximum number of epochs
    pub n_epochs: usize,

    /// Samples per optimizer step
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Save a tagged `epoch_<n>` record every N epochs
    #[serde(default = "default_save_epoch_freq")]
    pub save_epoch_freq: usize,

    /// Early-stopping policy
    pub early_stop: EarlyStopSection,
}

fn default_batch_size() -> usize {
    1
}

fn default_save_epoch_freq() -> usize {
    1
}

/// Early-stopping policy for the monitored validation metric
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarlyStopSection {
    /// Name of the monitored metric
    #[serde(default = "default_monitor")]
    pub monitor: String,

    /// Whether the metric is minimized or maximized
    pub direction: Direction,

    /// Epochs without improvement before stopping
    pub patience: usize,

    /// Epochs during which observations are ignored entirely
    #[serde(default)]
    pub min_epochs: usize,
}

fn default_monitor() -> String {
    "seg_loss".to_string()
}

/// Display-server parameters; the core validates but never acts on these
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualisationSection {
    /// Whether a display server should be attached
    #[serde(default, deserialize_with = "deserialize_bool_lenient")]
    pub display: bool,

    /// Port of the display server
    #[serde(default = "default_display_port")]
    pub display_port: u16,

    /// Refresh the display every N iterations
    #[serde(default = "default_display_freq")]
    pub display_freq: usize,
}

impl Default for VisualisationSection {
    fn default() -> Self {
        Self {
            display: false,
            display_port: default_display_port(),
            display_freq: default_display_freq(),
        }
    }
}

fn default_display_port() -> u16 {
    8097
}

fn default_display_freq() -> usize {
    10
}

/// Partition ratios and the seed driving the permutation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSplitSection {
    /// Fraction of samples assigned to training
    pub train_size: f64,
    /// Fraction of samples assigned to testing
    pub test_size: f64,
    /// Fraction of samples assigned to validation
    pub validation_size: f64,
    /// Run seed; also the root of every derived random stream
    pub seed: u64,
}

/// Volume geometry and dataset domain tag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataOptsSection {
    /// Domain tag selecting data source and channel layout
    #[serde(default = "default_dataset")]
    pub dataset: String,

    /// Fixed output spatial shape `[x, y, z]`; every sample is conformed to
    /// this shape after augmentation
    pub scale_size: [usize; 3],

    /// Image channels per sample
    pub n_channels: usize,

    /// Segmentation classes (background included)
    #[serde(default = "default_n_classes")]
    pub n_classes: usize,
}

fn default_dataset() -> String {
    "gsd_pCT".to_string()
}

fn default_n_classes() -> usize {
    2
}

/// Stochastic augmentation parameters
///
/// Each transform has its own activation probability; magnitudes are drawn
/// uniformly from the configured ranges. Validated once at load by
/// `AugmentSpec::from_config`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AugmentationSection {
    /// Activation probability of the flip transform
    pub flip_prob: f64,
    /// Activation probability of the affine transform
    pub affine_prob: f64,
    /// Activation probability of the elastic deformation
    pub elastic_prob: f64,
    /// Activation probability of the additive noise
    pub noise_prob: f64,

    /// Rotation angle range in degrees, in-plane
    pub rotation_degrees: [f32; 2],
    /// Isotropic scale factor range
    pub scale_range: [f32; 2],
    /// Translation range as a fraction of each spatial extent
    pub shift_range: [f32; 2],
    /// Maximum elastic displacement per control point, in voxels
    pub max_displacement: f32,
    /// Control points per axis of the elastic deformation lattice
    pub elastic_control_points: usize,
    /// Gaussian noise standard-deviation range
    pub noise_std_range: [f32; 2],
    /// Spatial axes eligible for flipping (0 = x, 1 = y, 2 = z)
    pub flip_axes: Vec<usize>,

    /// Clamp deformation and scale so labeled foreground cannot leave the
    /// volume
    #[serde(deserialize_with = "deserialize_bool_lenient")]
    pub prudent: bool,
}

impl Default for AugmentationSection {
    fn default() -> Self {
        Self {
            flip_prob: 0.5,
            affine_prob: 0.5,
            elastic_prob: 0.5,
            noise_prob: 0.5,
            rotation_degrees: [-10.0, 10.0],
            scale_range: [0.9, 1.1],
            shift_range: [-0.1, 0.1],
            max_displacement: 7.5,
            elastic_control_points: 7,
            noise_std_range: [0.0, 0.25],
            flip_axes: vec![0],
            prudent: true,
        }
    }
}

/// Model selection, optimizer, and learning-rate policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSection {
    /// Model family key, resolved against the model-type list
    pub model_type: String,

    /// Network architecture key, resolved against the architecture registry
    pub arch_type: String,

    /// Loss key, resolved against the criterion registry
    pub criterion: String,

    /// Optimizer name: "sgd" | "adam"
    #[serde(default = "default_optimizer")]
    pub optimizer: String,

    /// Initial learning rate
    pub learning_rate: f32,

    /// Learning-rate policy: "step" | "plateau"
    #[serde(default = "default_lr_policy")]
    pub lr_policy: String,

    /// Step policy: decay every N iterations
    #[serde(default = "default_lr_decay_iters")]
    pub lr_decay_iters: usize,

    /// Multiplicative decay factor
    #[serde(default = "default_lr_gamma")]
    pub lr_gamma: f32,

    /// Channel-width divisor of the architecture
    #[serde(default = "default_feature_scale")]
    pub feature_scale: usize,

    /// Additional channel divisor applied on top of `feature_scale`
    #[serde(default = "default_division_factor")]
    pub division_factor: usize,

    /// GPU device ids handed to the model collaborator
    #[serde(default)]
    pub gpu_ids: Vec<i64>,

    /// Whether this configuration drives a training run
    #[serde(
        default = "default_true",
        alias = "isTrain",
        deserialize_with = "deserialize_bool_lenient"
    )]
    pub is_train: bool,

    /// Resume from an existing checkpoint instead of starting fresh
    #[serde(default, deserialize_with = "deserialize_bool_lenient")]
    pub continue_train: bool,

    /// Epoch to resume from; `-1` selects the latest record
    #[serde(default = "default_which_epoch")]
    pub which_epoch: i64,
}

fn default_optimizer() -> String {
    "adam".to_string()
}

fn default_lr_policy() -> String {
    "step".to_string()
}

fn default_lr_decay_iters() -> usize {
    50
}

fn default_lr_gamma() -> f32 {
    0.1
}

fn default_feature_scale() -> usize {
    4
}

fn default_division_factor() -> usize {
    1
}

fn default_which_epoch() -> i64 {
    -1
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_json() -> &'static str {
        r#"{
            "name": "pct_infarct",
            "training": {
                "n_epochs": 200,
                "early_stop": {"direction": "min", "patience": 10, "min_epochs": 15}
            },
            "data_split": {"train_size": 0.7, "test_size": 0.15, "validation_size": 0.15, "seed": 42},
            "data_path": "/data/gsd_pCT",
            "data_opts": {"scale_size": [96, 96, 16], "n_channels": 4},
            "model": {
                "model_type": "seg",
                "arch_type": "unet_pct_multi_att_dsv",
                "criterion": "focal_tversky",
                "learning_rate": 0.0001,
                "gpu_ids": [0]
            }
        }"#
    }

    #[test]
    fn test_deserialize_minimal_config() {
        let cfg: Config = serde_json::from_str(minimal_json()).unwrap();
        assert_eq!(cfg.name, "pct_infarct");
        assert_eq!(cfg.training.n_epochs, 200);
        assert_eq!(cfg.training.early_stop.patience, 10);
        assert_eq!(cfg.training.early_stop.monitor, "seg_loss");
        assert_eq!(cfg.data_opts.scale_size, [96, 96, 16]);
        assert_eq!(cfg.data_opts.n_classes, 2);
        assert_eq!(cfg.model.which_epoch, -1);
        assert!(cfg.model.is_train);
        assert!(!cfg.model.continue_train);
        assert!(cfg.augmentation.prudent);
    }

    #[test]
    fn test_quoted_python_booleans_deserialize() {
        let json = r#"{
            "name": "exp",
            "training": {
                "n_epochs": 5,
                "early_stop": {"direction": "min", "patience": 3}
            },
            "data_split": {"train_size": 0.8, "test_size": 0.1, "validation_size": 0.1, "seed": 1},
            "data_path": ".",
            "data_opts": {"scale_size": [8, 8, 4], "n_channels": 1},
            "augmentation": {"prudent": "False"},
            "model": {
                "model_type": "seg",
                "arch_type": "unet",
                "criterion": "dice",
                "learning_rate": 0.001,
                "gpu_ids": [0],
                "isTrain": "True",
                "continue_train": "False"
            }
        }"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        assert!(cfg.model.is_train);
        assert!(!cfg.model.continue_train);
        assert!(!cfg.augmentation.prudent);
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let json = minimal_json().replacen(
            "\"name\": \"pct_infarct\",",
            "\"name\": \"pct_infarct\", \"legacy_flag\": 3,",
            1,
        );
        let cfg: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg.name, "pct_infarct");
    }

    #[test]
    fn test_missing_required_section_fails() {
        let json = minimal_json().replacen("\"data_split\"", "\"data_split_typo\"", 1);
        assert!(serde_json::from_str::<Config>(&json).is_err());
    }

    #[test]
    fn test_direction_is_required_and_explicit() {
        let json = minimal_json().replacen("\"direction\": \"min\", ", "", 1);
        assert!(serde_json::from_str::<Config>(&json).is_err());
    }

    #[test]
    fn test_direction_improves() {
        assert!(Direction::Min.improves(0.4, 0.5));
        assert!(!Direction::Min.improves(0.5, 0.5));
        assert!(Direction::Max.improves(0.6, 0.5));
        assert!(!Direction::Max.improves(0.5, 0.5));
    }

    #[test]
    fn test_direction_worst_seeds_tracking() {
        assert!(Direction::Min.improves(1e9, Direction::Min.worst()));
        assert!(Direction::Max.improves(-1e9, Direction::Max.worst()));
    }
}
