//! Configuration validation logic
//!
//! Validates a parsed [`Config`] for correctness before any training state is
//! built. Registry keys (`arch_type`, `criterion`) are resolved against the
//! live registries rather than hardcoded lists, so externally registered
//! implementations validate the same way as built-ins.

use super::error::ValidationError;
use crate::config::schema::Config;
use crate::model::{CriterionRegistry, ModelRegistry};

/// Tolerance for the split-ratio sum check
pub const RATIO_TOLERANCE: f64 = 1e-6;

/// Model family keys understood by the orchestrator
const VALID_MODEL_TYPES: &[&str] = &["seg"];

/// Metrics the validation pass can produce for monitoring
const VALID_METRICS: &[&str] = &["seg_loss"];

/// Validate a training configuration
///
/// Checks, in order: split ratios, epoch-loop parameters, volume geometry,
/// augmentation parameter ranges, and model/optimizer/scheduler selection.
/// The first failing check is returned.
pub fn validate_config(
    cfg: &Config,
    models: &ModelRegistry,
    criteria: &CriterionRegistry,
) -> Result<(), ValidationError> {
    validate_split(cfg)?;
    validate_training(cfg)?;
    validate_data_opts(cfg)?;
    validate_augmentation(&cfg.augmentation)?;
    validate_model(cfg, models, criteria)?;
    Ok(())
}

fn validate_split(cfg: &Config) -> Result<(), ValidationError> {
    let s = &cfg.data_split;
    for ratio in [s.train_size, s.test_size, s.validation_size] {
        if !(0.0..=1.0).contains(&ratio) || !ratio.is_finite() {
            return Err(ValidationError::InvalidRatio(ratio));
        }
    }
    let sum = s.train_size + s.test_size + s.validation_size;
    if (sum - 1.0).abs() > RATIO_TOLERANCE {
        return Err(ValidationError::RatioSum(sum));
    }
    Ok(())
}

fn validate_training(cfg: &Config) -> Result<(), ValidationError> {
    let t = &cfg.training;
    if t.n_epochs == 0 {
        return Err(ValidationError::InvalidEpochs(t.n_epochs));
    }
    if t.batch_size == 0 {
        return Err(ValidationError::InvalidBatchSize(t.batch_size));
    }
    if t.save_epoch_freq == 0 {
        return Err(ValidationError::InvalidSaveFreq(t.save_epoch_freq));
    }
    if t.early_stop.patience == 0 {
        return Err(ValidationError::InvalidPatience(t.early_stop.patience));
    }
    if !VALID_METRICS.contains(&t.early_stop.monitor.as_str()) {
        return Err(ValidationError::UnknownMetric(t.early_stop.monitor.clone()));
    }
    Ok(())
}

fn validate_data_opts(cfg: &Config) -> Result<(), ValidationError> {
    let d = &cfg.data_opts;
    if d.scale_size.iter().any(|&e| e == 0) {
        return Err(ValidationError::InvalidScaleSize);
    }
    if d.n_channels == 0 {
        return Err(ValidationError::InvalidChannels(d.n_channels));
    }
    if d.n_classes < 2 {
        return Err(ValidationError::InvalidClasses(d.n_classes));
    }
    Ok(())
}

/// Range checks for the augmentation section
///
/// Also invoked by `AugmentSpec::from_config` so parameter errors surface at
/// spec-load time, never during `apply`.
pub(crate) fn validate_augmentation(
    a: &crate::config::AugmentationSection,
) -> Result<(), ValidationError> {
    for (name, value) in [
        ("flip", a.flip_prob),
        ("affine", a.affine_prob),
        ("elastic", a.elastic_prob),
        ("noise", a.noise_prob),
    ] {
        if !(0.0..=1.0).contains(&value) || !value.is_finite() {
            return Err(ValidationError::InvalidProbability { name, value });
        }
    }

    if a.rotation_degrees[0] > a.rotation_degrees[1] {
        return Err(ValidationError::InvalidRange("rotation"));
    }
    if a.scale_range[0] > a.scale_range[1] {
        return Err(ValidationError::InvalidRange("scale"));
    }
    if a.scale_range[0] <= 0.0 {
        return Err(ValidationError::NonPositiveScale);
    }
    if a.shift_range[0] > a.shift_range[1] {
        return Err(ValidationError::InvalidRange("shift"));
    }
    for bound in a.shift_range {
        if bound.abs() > 0.5 {
            return Err(ValidationError::ShiftTooLarge(bound));
        }
    }
    if !a.max_displacement.is_finite() || a.max_displacement < 0.0 {
        return Err(ValidationError::InvalidDisplacement(a.max_displacement));
    }
    if a.elastic_control_points < 4 {
        return Err(ValidationError::InvalidControlPoints(a.elastic_control_points));
    }
    if a.noise_std_range[0] > a.noise_std_range[1] {
        return Err(ValidationError::InvalidRange("noise std"));
    }
    if a.noise_std_range[0] < 0.0 {
        return Err(ValidationError::NegativeNoiseStd);
    }
    if a.flip_axes.is_empty() {
        return Err(ValidationError::EmptyFlipAxes);
    }
    if let Some(&axis) = a.flip_axes.iter().find(|&&ax| ax > 2) {
        return Err(ValidationError::InvalidFlipAxis(axis));
    }
    Ok(())
}

fn validate_model(
    cfg: &Config,
    models: &ModelRegistry,
    criteria: &CriterionRegistry,
) -> Result<(), ValidationError> {
    let m = &cfg.model;
    if !VALID_MODEL_TYPES.contains(&m.model_type.as_str()) {
        return Err(ValidationError::UnknownModelType(m.model_type.clone()));
    }
    if !models.contains(&m.arch_type) {
        return Err(ValidationError::UnknownArch(m.arch_type.clone()));
    }
    if !criteria.contains(&m.criterion) {
        return Err(ValidationError::UnknownCriterion(m.criterion.clone()));
    }
    if m.learning_rate <= 0.0 || m.learning_rate > 1.0 {
        return Err(ValidationError::InvalidLearningRate(m.learning_rate));
    }
    let valid_optimizers = ["sgd", "adam"];
    if !valid_optimizers.contains(&m.optimizer.as_str()) {
        return Err(ValidationError::InvalidOptimizer(m.optimizer.clone()));
    }
    let valid_policies = ["step", "plateau"];
    if !valid_policies.contains(&m.lr_policy.as_str()) {
        return Err(ValidationError::InvalidLrPolicy(m.lr_policy.clone()));
    }
    if m.lr_policy == "step" && m.lr_decay_iters == 0 {
        return Err(ValidationError::InvalidDecayIters(m.lr_decay_iters));
    }
    if m.lr_gamma <= 0.0 || m.lr_gamma > 1.0 {
        return Err(ValidationError::InvalidGamma(m.lr_gamma));
    }
    if m.feature_scale == 0 || m.division_factor == 0 {
        return Err(ValidationError::InvalidWidthDivisor);
    }
    if m.is_train && m.gpu_ids.is_empty() {
        return Err(ValidationError::EmptyGpuIds);
    }
    if m.which_epoch < -1 {
        return Err(ValidationError::InvalidWhichEpoch(m.which_epoch));
    }
    Ok(())
}
