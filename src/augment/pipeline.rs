//! The augmentation pipeline
//!
//! Transforms run in a fixed order (flip, affine, elastic, noise), each
//! independently gated by its activation probability; the gate draw and any
//! magnitude draws come from the single stream passed by the caller, so the
//! output is a pure function of `(sample, spec, stream state)`. The final
//! conformance to `scale_size` is unconditional.
//!
//! `apply` takes `&self` and the pipeline holds no mutable state, so one
//! pipeline may be shared across parallel loader workers as long as each
//! worker owns its own stream (see `train::SeedPlan`).

use ndarray::Array3;
use rand::rngs::StdRng;
use rand::Rng;

use super::affine::{affine, AffineParams};
use super::conform::conform;
use super::elastic::{elastic, DeformationField};
use super::flip::flip;
use super::noise::add_gaussian_noise;
use super::spec::AugmentSpec;
use crate::data::Sample;

/// Stateless augmentation pipeline; all randomness is caller-provided
#[derive(Debug, Clone)]
pub struct Pipeline {
    spec: AugmentSpec,
}

/// Axis-aligned bounding box of the labeled foreground
#[derive(Debug, Clone, Copy)]
struct ForegroundBounds {
    lo: [usize; 3],
    hi: [usize; 3],
}

impl Pipeline {
    pub fn new(spec: AugmentSpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &AugmentSpec {
        &self.spec
    }

    /// Apply the stochastic transforms and conform to the output shape
    pub fn apply(&self, sample: &Sample, rng: &mut StdRng) -> Sample {
        let spec = &self.spec;
        let mut out = sample.clone();

        if rng.random::<f64>() < spec.flip_prob {
            let axis = spec.flip_axes[rng.random_range(0..spec.flip_axes.len())];
            out = flip(&out, axis);
        }

        if rng.random::<f64>() < spec.affine_prob {
            let angle_deg = draw(rng, spec.rotation_degrees);
            let scale = draw(rng, spec.scale_range);
            let dims = out.spatial_shape();
            let shift = [
                draw(rng, spec.shift_range) * dims[0] as f32,
                draw(rng, spec.shift_range) * dims[1] as f32,
                draw(rng, spec.shift_range) * dims[2] as f32,
            ];
            let mut params = AffineParams { angle_deg, scale, shift };
            if spec.prudent {
                if let Some(b) = foreground_bounds(&out.label) {
                    params = clamp_affine(params, b, dims);
                }
            }
            out = affine(&out, &params);
        }

        if rng.random::<f64>() < spec.elastic_prob {
            let mut max_disp = spec.max_displacement;
            if spec.prudent {
                if let Some(b) = foreground_bounds(&out.label) {
                    max_disp = max_disp.min(min_margin(b, out.spatial_shape()));
                }
            }
            let field = DeformationField::random(spec.control_points, max_disp, rng);
            out = elastic(&out, &field);
        }

        if rng.random::<f64>() < spec.noise_prob {
            let std = draw(rng, spec.noise_std_range);
            add_gaussian_noise(&mut out.image, std, rng);
        }

        conform(&out, spec.scale_size)
    }

    /// Shape conformance without any stochastic transform, for validation and
    /// test passes
    pub fn conform_only(&self, sample: &Sample) -> Sample {
        conform(sample, self.spec.scale_size)
    }
}

/// Uniform draw from an inclusive range
fn draw(rng: &mut StdRng, range: [f32; 2]) -> f32 {
    if range[0] == range[1] {
        range[0]
    } else {
        rng.random_range(range[0]..=range[1])
    }
}

fn foreground_bounds(label: &Array3<u8>) -> Option<ForegroundBounds> {
    let mut lo = [usize::MAX; 3];
    let mut hi = [0usize; 3];
    let mut any = false;
    for ((x, y, z), &v) in label.indexed_iter() {
        if v > 0 {
            any = true;
            let idx = [x, y, z];
            for a in 0..3 {
                lo[a] = lo[a].min(idx[a]);
                hi[a] = hi[a].max(idx[a]);
            }
        }
    }
    any.then_some(ForegroundBounds { lo, hi })
}

/// Smallest distance from the foreground box to any volume face, voxels
fn min_margin(b: ForegroundBounds, dims: [usize; 3]) -> f32 {
    let mut margin = usize::MAX;
    for a in 0..3 {
        margin = margin.min(b.lo[a]).min(dims[a] - 1 - b.hi[a]);
    }
    margin as f32
}

/// Clamp scale and shift so the foreground box cannot leave the volume
///
/// The in-plane axes are bounded together through the box's rotation radius;
/// z only scales and shifts. Rotation itself is never clamped.
fn clamp_affine(mut p: AffineParams, b: ForegroundBounds, dims: [usize; 3]) -> AffineParams {
    let centre = [
        (dims[0] as f32 - 1.0) / 2.0,
        (dims[1] as f32 - 1.0) / 2.0,
        (dims[2] as f32 - 1.0) / 2.0,
    ];
    let extent = |a: usize| -> f32 {
        (b.lo[a] as f32 - centre[a]).abs().max((b.hi[a] as f32 - centre[a]).abs())
    };

    for (a, shift) in p.shift.iter_mut().enumerate() {
        let margin = (b.lo[a]).min(dims[a] - 1 - b.hi[a]) as f32;
        *shift = shift.clamp(-margin, margin);
    }

    let r_xy = (extent(0).powi(2) + extent(1).powi(2)).sqrt();
    let mut cap = f32::INFINITY;
    if r_xy > 0.0 {
        let room = centre[0].min(centre[1]) - p.shift[0].abs().max(p.shift[1].abs());
        cap = cap.min(room / r_xy);
    }
    let e_z = extent(2);
    if e_z > 0.0 {
        cap = cap.min((centre[2] - p.shift[2].abs()) / e_z);
    }
    if cap.is_finite() {
        p.scale = p.scale.min(cap.max(0.05));
    }
    p
}
