//! Affine transform: in-plane rotation, isotropic scale, translation
//!
//! Implemented as an inverse mapping: every output voxel is pulled from its
//! source coordinate, so the result has no holes. Rotation acts in the x-y
//! plane about the volume centre (axial slices of a CT stack); scale and
//! shift act on all three axes.

use ndarray::{Array3, Array4};

use super::interp::{sample_image, sample_label};
use crate::data::Sample;

/// Parameters of one affine application
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineParams {
    /// In-plane rotation angle, degrees
    pub angle_deg: f32,
    /// Isotropic scale factor (> 0)
    pub scale: f32,
    /// Translation per axis, voxels
    pub shift: [f32; 3],
}

/// Apply an affine transform to a sample
pub fn affine(sample: &Sample, params: &AffineParams) -> Sample {
    let (c, sx, sy, sz) = sample.image.dim();
    let cx = (sx as f32 - 1.0) / 2.0;
    let cy = (sy as f32 - 1.0) / 2.0;
    let cz = (sz as f32 - 1.0) / 2.0;

    let theta = params.angle_deg.to_radians();
    let (sin, cos) = theta.sin_cos();
    let inv_scale = 1.0 / params.scale;

    // Inverse map: undo shift, undo rotation, undo scale, recentre
    let source = |x: usize, y: usize, z: usize| -> (f32, f32, f32) {
        let dx = x as f32 - cx - params.shift[0];
        let dy = y as f32 - cy - params.shift[1];
        let dz = z as f32 - cz - params.shift[2];
        let rx = cos * dx + sin * dy;
        let ry = -sin * dx + cos * dy;
        (rx * inv_scale + cx, ry * inv_scale + cy, dz * inv_scale + cz)
    };

    let image = Array4::from_shape_fn((c, sx, sy, sz), |(ci, x, y, z)| {
        let (px, py, pz) = source(x, y, z);
        sample_image(&sample.image, ci, px, py, pz)
    });
    let label = Array3::from_shape_fn((sx, sy, sz), |(x, y, z)| {
        let (px, py, pz) = source(x, y, z);
        sample_label(&sample.label, px, py, pz)
    });

    Sample::new(image, label)
}
