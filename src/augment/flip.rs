//! Axis flip

use ndarray::{Array3, Array4};

use crate::data::Sample;

/// Mirror a sample along one spatial axis (0 = x, 1 = y, 2 = z)
pub fn flip(sample: &Sample, axis: usize) -> Sample {
    debug_assert!(axis < 3);
    let (c, sx, sy, sz) = sample.image.dim();
    let dims = [sx, sy, sz];

    let mirror = |idx: [usize; 3]| -> [usize; 3] {
        let mut m = idx;
        m[axis] = dims[axis] - 1 - idx[axis];
        m
    };

    let image = Array4::from_shape_fn((c, sx, sy, sz), |(ci, x, y, z)| {
        let [mx, my, mz] = mirror([x, y, z]);
        sample.image[[ci, mx, my, mz]]
    });
    let label = Array3::from_shape_fn((sx, sy, sz), |(x, y, z)| {
        let [mx, my, mz] = mirror([x, y, z]);
        sample.label[[mx, my, mz]]
    });

    Sample::new(image, label)
}
