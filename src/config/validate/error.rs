//! Validation error types
//!
//! One variant per check; every message names the offending value and the
//! accepted range so startup failures are self-explanatory.

/// Validation error type
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid split ratio: {0} (must be in [0, 1])")]
    InvalidRatio(f64),

    #[error("Split ratios sum to {0} (must be 1 within 1e-6)")]
    RatioSum(f64),

    #[error("Invalid epochs: {0} (must be > 0)")]
    InvalidEpochs(usize),

    #[error("Invalid batch size: {0} (must be > 0)")]
    InvalidBatchSize(usize),

    #[error("Invalid save frequency: {0} (must be > 0)")]
    InvalidSaveFreq(usize),

    #[error("Invalid patience: {0} (must be > 0)")]
    InvalidPatience(usize),

    #[error("Unknown monitored metric: {0}")]
    UnknownMetric(String),

    #[error("Invalid learning rate: {0} (must be > 0.0 and <= 1.0)")]
    InvalidLearningRate(f32),

    #[error("Invalid optimizer: {0} (must be one of: sgd, adam)")]
    InvalidOptimizer(String),

    #[error("Invalid LR policy: {0} (must be one of: step, plateau)")]
    InvalidLrPolicy(String),

    #[error("Invalid lr_decay_iters: {0} (must be > 0)")]
    InvalidDecayIters(usize),

    #[error("Invalid lr_gamma: {0} (must be in (0, 1])")]
    InvalidGamma(f32),

    #[error("Unknown model type: {0}")]
    UnknownModelType(String),

    #[error("Unknown architecture: {0} (not registered)")]
    UnknownArch(String),

    #[error("Unknown criterion: {0} (not registered)")]
    UnknownCriterion(String),

    #[error("gpu_ids must be non-empty when is_train is true")]
    EmptyGpuIds,

    #[error("Invalid scale_size: every extent must be > 0")]
    InvalidScaleSize,

    #[error("Invalid n_channels: {0} (must be > 0)")]
    InvalidChannels(usize),

    #[error("Invalid n_classes: {0} (must be >= 2)")]
    InvalidClasses(usize),

    #[error("Invalid {name} probability: {value} (must be in [0, 1])")]
    InvalidProbability { name: &'static str, value: f64 },

    #[error("Invalid {0} range: low bound must not exceed high bound")]
    InvalidRange(&'static str),

    #[error("Invalid scale range: bounds must be > 0")]
    NonPositiveScale,

    #[error("Invalid shift range: |{0}| exceeds 0.5 of the extent")]
    ShiftTooLarge(f32),

    #[error("Invalid max_displacement: {0} (must be >= 0 and finite)")]
    InvalidDisplacement(f32),

    #[error("Invalid elastic_control_points: {0} (must be >= 4)")]
    InvalidControlPoints(usize),

    #[error("Invalid noise std range: bounds must be >= 0")]
    NegativeNoiseStd,

    #[error("flip_axes must be non-empty")]
    EmptyFlipAxes,

    #[error("Invalid flip axis: {0} (must be 0, 1 or 2)")]
    InvalidFlipAxis(usize),

    #[error("Invalid which_epoch: {0} (must be >= -1)")]
    InvalidWhichEpoch(i64),

    #[error("Invalid feature_scale/division_factor: must be > 0")]
    InvalidWidthDivisor,
}
