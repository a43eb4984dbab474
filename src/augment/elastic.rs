//! Elastic deformation driven by a control-point lattice
//!
//! A coarse lattice of control points spans the volume; each interior point
//! carries a random displacement vector, border points are pinned so the
//! volume boundary stays fixed. The dense field is the trilinear
//! interpolation of the lattice, and the volume is warped by inverse mapping
//! through it.

use ndarray::{Array3, Array4};
use rand::rngs::StdRng;
use rand::Rng;

use super::interp::{sample_image, sample_label};
use crate::data::Sample;

/// Smooth random displacement field over a control-point lattice
#[derive(Debug, Clone, PartialEq)]
pub struct DeformationField {
    /// Control points per axis
    points: usize,
    /// Displacement vectors, `points^3` entries in x-major order
    displacements: Vec<[f32; 3]>,
}

impl DeformationField {
    /// Draw a random field; every interior control point gets a displacement
    /// uniform in `[-max_displacement, max_displacement]` per component
    ///
    /// Draws happen in a fixed lattice order, so the field is a pure function
    /// of the stream state.
    pub fn random(points: usize, max_displacement: f32, rng: &mut StdRng) -> Self {
        debug_assert!(points >= 4);
        let mut displacements = vec![[0.0f32; 3]; points * points * points];
        if max_displacement > 0.0 {
            let border = |i: usize| i == 0 || i == points - 1;
            for i in 0..points {
                for j in 0..points {
                    for k in 0..points {
                        if border(i) || border(j) || border(k) {
                            continue;
                        }
                        let v = [
                            rng.random_range(-max_displacement..=max_displacement),
                            rng.random_range(-max_displacement..=max_displacement),
                            rng.random_range(-max_displacement..=max_displacement),
                        ];
                        displacements[(i * points + j) * points + k] = v;
                    }
                }
            }
        }
        Self { points, displacements }
    }

    /// Largest displacement component magnitude in the field
    pub fn max_component(&self) -> f32 {
        self.displacements
            .iter()
            .flat_map(|v| v.iter())
            .fold(0.0f32, |acc, &c| acc.max(c.abs()))
    }

    fn at_lattice(&self, i: usize, j: usize, k: usize) -> [f32; 3] {
        self.displacements[(i * self.points + j) * self.points + k]
    }

    /// Dense displacement at a voxel, trilinear over the lattice
    fn displacement_at(&self, shape: [usize; 3], x: usize, y: usize, z: usize) -> [f32; 3] {
        let n = self.points;
        let coord = |v: usize, extent: usize| -> (usize, f32) {
            if extent <= 1 {
                return (0, 0.0);
            }
            let t = v as f32 / (extent as f32 - 1.0) * (n as f32 - 1.0);
            let i0 = (t.floor() as usize).min(n - 2);
            (i0, t - i0 as f32)
        };
        let (i0, fi) = coord(x, shape[0]);
        let (j0, fj) = coord(y, shape[1]);
        let (k0, fk) = coord(z, shape[2]);

        let mut out = [0.0f32; 3];
        for (di, wi) in [(0, 1.0 - fi), (1, fi)] {
            for (dj, wj) in [(0, 1.0 - fj), (1, fj)] {
                for (dk, wk) in [(0, 1.0 - fk), (1, fk)] {
                    let w = wi * wj * wk;
                    if w == 0.0 {
                        continue;
                    }
                    let v = self.at_lattice(i0 + di, j0 + dj, k0 + dk);
                    out[0] += w * v[0];
                    out[1] += w * v[1];
                    out[2] += w * v[2];
                }
            }
        }
        out
    }
}

/// Warp a sample through a deformation field
pub fn elastic(sample: &Sample, field: &DeformationField) -> Sample {
    let (c, sx, sy, sz) = sample.image.dim();
    let shape = [sx, sy, sz];

    let image = Array4::from_shape_fn((c, sx, sy, sz), |(ci, x, y, z)| {
        let d = field.displacement_at(shape, x, y, z);
        sample_image(&sample.image, ci, x as f32 + d[0], y as f32 + d[1], z as f32 + d[2])
    });
    let label = Array3::from_shape_fn((sx, sy, sz), |(x, y, z)| {
        let d = field.displacement_at(shape, x, y, z);
        sample_label(&sample.label, x as f32 + d[0], y as f32 + d[1], z as f32 + d[2])
    });

    Sample::new(image, label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array3, Array4};
    use rand::SeedableRng;

    fn smooth_sample() -> Sample {
        let image = Array4::from_shape_fn((1, 12, 12, 6), |(_, x, y, z)| {
            (x + y + z) as f32 * 0.1
        });
        let mut label = Array3::zeros((12, 12, 6));
        label[[6, 6, 3]] = 1;
        Sample::new(image, label)
    }

    #[test]
    fn test_zero_displacement_is_identity() {
        let mut rng = StdRng::seed_from_u64(0);
        let field = DeformationField::random(5, 0.0, &mut rng);
        let s = smooth_sample();
        assert_eq!(elastic(&s, &field), s);
    }

    #[test]
    fn test_field_respects_max_displacement() {
        let mut rng = StdRng::seed_from_u64(7);
        let field = DeformationField::random(6, 2.5, &mut rng);
        assert!(field.max_component() <= 2.5);
        assert!(field.max_component() > 0.0);
    }

    #[test]
    fn test_border_control_points_are_pinned() {
        let mut rng = StdRng::seed_from_u64(7);
        let field = DeformationField::random(5, 3.0, &mut rng);
        let n = 5;
        for j in 0..n {
            for k in 0..n {
                assert_eq!(field.at_lattice(0, j, k), [0.0; 3]);
                assert_eq!(field.at_lattice(n - 1, j, k), [0.0; 3]);
            }
        }
    }

    #[test]
    fn test_same_stream_state_same_field() {
        let a = DeformationField::random(6, 4.0, &mut StdRng::seed_from_u64(11));
        let b = DeformationField::random(6, 4.0, &mut StdRng::seed_from_u64(11));
        assert_eq!(a, b);
    }

    #[test]
    fn test_warp_moves_voxels() {
        let mut rng = StdRng::seed_from_u64(3);
        let field = DeformationField::random(6, 3.0, &mut rng);
        let s = smooth_sample();
        let warped = elastic(&s, &field);
        assert_ne!(warped.image, s.image);
    }
}
