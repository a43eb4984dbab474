//! Validated augmentation parameters
//!
//! An [`AugmentSpec`] is built once from the configuration, revalidating the
//! parameter ranges so an invalid range can never reach `apply`. It is reused
//! unchanged for every sample of the run.

use crate::config::{
    validate_augmentation, AugmentationSection, DataOptsSection, ValidationError,
};

/// Immutable per-run augmentation parameters
#[derive(Debug, Clone, PartialEq)]
pub struct AugmentSpec {
    pub flip_prob: f64,
    pub affine_prob: f64,
    pub elastic_prob: f64,
    pub noise_prob: f64,

    pub rotation_degrees: [f32; 2],
    pub scale_range: [f32; 2],
    pub shift_range: [f32; 2],
    pub noise_std_range: [f32; 2],
    pub max_displacement: f32,
    pub control_points: usize,
    pub flip_axes: Vec<usize>,
    pub prudent: bool,

    /// Fixed output spatial shape
    pub scale_size: [usize; 3],
}

impl AugmentSpec {
    /// Build a spec from the validated configuration sections
    ///
    /// # Errors
    ///
    /// `ValidationError` for any out-of-range parameter; this is the only
    /// point where augmentation parameters can fail.
    pub fn from_config(
        augmentation: &AugmentationSection,
        data_opts: &DataOptsSection,
    ) -> Result<Self, ValidationError> {
        validate_augmentation(augmentation)?;
        if data_opts.scale_size.iter().any(|&e| e == 0) {
            return Err(ValidationError::InvalidScaleSize);
        }

        Ok(Self {
            flip_prob: augmentation.flip_prob,
            affine_prob: augmentation.affine_prob,
            elastic_prob: augmentation.elastic_prob,
            noise_prob: augmentation.noise_prob,
            rotation_degrees: augmentation.rotation_degrees,
            scale_range: augmentation.scale_range,
            shift_range: augmentation.shift_range,
            noise_std_range: augmentation.noise_std_range,
            max_displacement: augmentation.max_displacement,
            control_points: augmentation.elastic_control_points,
            flip_axes: augmentation.flip_axes.clone(),
            prudent: augmentation.prudent,
            scale_size: data_opts.scale_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_opts() -> DataOptsSection {
        serde_json::from_str(r#"{"scale_size": [16, 16, 8], "n_channels": 2}"#).unwrap()
    }

    #[test]
    fn test_default_section_builds() {
        let spec = AugmentSpec::from_config(&AugmentationSection::default(), &data_opts()).unwrap();
        assert_eq!(spec.scale_size, [16, 16, 8]);
        assert!(spec.prudent);
    }

    #[test]
    fn test_negative_scale_fails_at_spec_load() {
        let mut section = AugmentationSection::default();
        section.scale_range = [-0.2, 1.1];
        assert!(matches!(
            AugmentSpec::from_config(&section, &data_opts()),
            Err(ValidationError::NonPositiveScale)
        ));
    }

    #[test]
    fn test_bad_probability_fails_at_spec_load() {
        let mut section = AugmentationSection::default();
        section.noise_prob = -0.5;
        assert!(AugmentSpec::from_config(&section, &data_opts()).is_err());
    }

    #[test]
    fn test_zero_scale_size_fails() {
        let mut opts = data_opts();
        opts.scale_size = [16, 0, 8];
        assert!(matches!(
            AugmentSpec::from_config(&AugmentationSection::default(), &opts),
            Err(ValidationError::InvalidScaleSize)
        ));
    }
}
