//! Volume sample container
//!
//! A sample pairs a multi-channel image volume with its label mask. Images
//! are stored channels-first (`[c, x, y, z]`), labels as a single spatial
//! volume of class ids.

use ndarray::{Array3, Array4};

/// One perfusion-CT sample: image channels plus segmentation label
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Image volume, `[channels, x, y, z]`
    pub image: Array4<f32>,
    /// Label mask, `[x, y, z]`, class ids starting at 0 (background)
    pub label: Array3<u8>,
}

impl Sample {
    /// Construct a sample; image and label spatial shapes must agree
    pub fn new(image: Array4<f32>, label: Array3<u8>) -> Self {
        let (_, x, y, z) = image.dim();
        debug_assert_eq!((x, y, z), label.dim());
        Self { image, label }
    }

    /// Spatial shape `[x, y, z]`
    pub fn spatial_shape(&self) -> [usize; 3] {
        let (x, y, z) = self.label.dim();
        [x, y, z]
    }

    /// Number of image channels
    pub fn channels(&self) -> usize {
        self.image.dim().0
    }

    /// Normalize each image channel to zero mean and unit standard deviation
    ///
    /// The label is never touched. Channels with zero variance are left
    /// mean-centered only.
    pub fn standardize(&mut self) {
        let channels = self.channels();
        for c in 0..channels {
            let mut channel = self.image.index_axis_mut(ndarray::Axis(0), c);
            let n = channel.len() as f32;
            if n == 0.0 {
                continue;
            }
            let mean = channel.sum() / n;
            channel.mapv_inplace(|v| v - mean);
            let var = channel.iter().map(|v| v * v).sum::<f32>() / n;
            let std = var.sqrt();
            if std > 0.0 {
                channel.mapv_inplace(|v| v / std);
            }
        }
    }

    /// Count of non-background label voxels
    pub fn foreground_voxels(&self) -> usize {
        self.label.iter().filter(|&&v| v > 0).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{Array3, Array4};

    fn sample_with_values(base: f32) -> Sample {
        let image = Array4::from_shape_fn((2, 4, 4, 2), |(c, x, _, _)| {
            base + c as f32 * 10.0 + x as f32
        });
        let label = Array3::zeros((4, 4, 2));
        Sample::new(image, label)
    }

    #[test]
    fn test_standardize_zero_mean_unit_std() {
        let mut s = sample_with_values(5.0);
        s.standardize();
        for c in 0..2 {
            let channel = s.image.index_axis(ndarray::Axis(0), c);
            let n = channel.len() as f32;
            let mean = channel.sum() / n;
            let var = channel.iter().map(|v| v * v).sum::<f32>() / n;
            assert_abs_diff_eq!(mean, 0.0, epsilon = 1e-5);
            assert_abs_diff_eq!(var, 1.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_standardize_constant_channel_is_centered() {
        let image = Array4::from_elem((1, 3, 3, 3), 7.0);
        let mut s = Sample::new(image, Array3::zeros((3, 3, 3)));
        s.standardize();
        assert!(s.image.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_standardize_leaves_label_untouched() {
        let mut s = sample_with_values(1.0);
        s.label[[1, 1, 1]] = 1;
        s.standardize();
        assert_eq!(s.label[[1, 1, 1]], 1);
        assert_eq!(s.foreground_voxels(), 1);
    }

    #[test]
    fn test_shape_accessors() {
        let s = sample_with_values(0.0);
        assert_eq!(s.spatial_shape(), [4, 4, 2]);
        assert_eq!(s.channels(), 2);
    }
}
