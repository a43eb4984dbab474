//! Resampling helpers shared by the spatial transforms
//!
//! Image channels are resampled with trilinear interpolation; labels use
//! nearest-neighbor so class ids are never blended. Coordinates outside the
//! source volume read as background (zero).

use ndarray::{Array3, Array4};

/// Trilinear sample of one image channel at a continuous coordinate
pub(crate) fn sample_image(image: &Array4<f32>, c: usize, x: f32, y: f32, z: f32) -> f32 {
    let (_, sx, sy, sz) = image.dim();

    let x0 = x.floor();
    let y0 = y.floor();
    let z0 = z.floor();
    let fx = x - x0;
    let fy = y - y0;
    let fz = z - z0;

    let mut acc = 0.0;
    for (dx, wx) in [(0, 1.0 - fx), (1, fx)] {
        for (dy, wy) in [(0, 1.0 - fy), (1, fy)] {
            for (dz, wz) in [(0, 1.0 - fz), (1, fz)] {
                let w = wx * wy * wz;
                if w == 0.0 {
                    continue;
                }
                let xi = x0 as isize + dx;
                let yi = y0 as isize + dy;
                let zi = z0 as isize + dz;
                if xi >= 0
                    && yi >= 0
                    && zi >= 0
                    && (xi as usize) < sx
                    && (yi as usize) < sy
                    && (zi as usize) < sz
                {
                    acc += w * image[[c, xi as usize, yi as usize, zi as usize]];
                }
            }
        }
    }
    acc
}

/// Nearest-neighbor sample of the label mask at a continuous coordinate
pub(crate) fn sample_label(label: &Array3<u8>, x: f32, y: f32, z: f32) -> u8 {
    let (sx, sy, sz) = label.dim();
    let xi = x.round() as isize;
    let yi = y.round() as isize;
    let zi = z.round() as isize;
    if xi >= 0
        && yi >= 0
        && zi >= 0
        && (xi as usize) < sx
        && (yi as usize) < sy
        && (zi as usize) < sz
    {
        label[[xi as usize, yi as usize, zi as usize]]
    } else {
        0
    }
}
