//! Shape conformance: pad and centre-crop to the configured output shape
//!
//! This is the pipeline's only unconditional step: whatever the preceding
//! transforms produced, the sample leaves at exactly `scale_size`. Padding is
//! zero-filled (background); cropping keeps the centre region. When the size
//! difference is odd, the extra voxel of padding goes before the volume and
//! the extra cropped voxel is taken from the front, matching the centred
//! split used by the original preprocessing.

use ndarray::{Array3, Array4};

use crate::data::Sample;

/// Conform a sample to `target` spatial shape
pub fn conform(sample: &Sample, target: [usize; 3]) -> Sample {
    let (c, sx, sy, sz) = sample.image.dim();
    if [sx, sy, sz] == target {
        return sample.clone();
    }

    // Per-axis source offset: positive when cropping, negative when padding
    let offset = |input: usize, out: usize| -> isize {
        (input as isize - out as isize).div_euclid(2)
    };
    let off = [offset(sx, target[0]), offset(sy, target[1]), offset(sz, target[2])];

    let src = |o: [usize; 3]| -> Option<[usize; 3]> {
        let mut s = [0usize; 3];
        let dims = [sx, sy, sz];
        for a in 0..3 {
            let v = o[a] as isize + off[a];
            if v < 0 || v as usize >= dims[a] {
                return None;
            }
            s[a] = v as usize;
        }
        Some(s)
    };

    let image = Array4::from_shape_fn((c, target[0], target[1], target[2]), |(ci, x, y, z)| {
        match src([x, y, z]) {
            Some([px, py, pz]) => sample.image[[ci, px, py, pz]],
            None => 0.0,
        }
    });
    let label = Array3::from_shape_fn((target[0], target[1], target[2]), |(x, y, z)| {
        match src([x, y, z]) {
            Some([px, py, pz]) => sample.label[[px, py, pz]],
            None => 0,
        }
    });

    Sample::new(image, label)
}
