//! Additive gaussian noise
//!
//! Applied to image channels only; the label mask never receives noise.

use ndarray::Array4;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

/// Add zero-mean gaussian noise with the given standard deviation in place
///
/// Voxels are visited in a fixed order so the result is a pure function of
/// the stream state. A zero std is a no-op.
pub fn add_gaussian_noise(image: &mut Array4<f32>, std: f32, rng: &mut StdRng) {
    if std <= 0.0 {
        return;
    }
    let Ok(normal) = Normal::new(0.0f32, std) else {
        // Unreachable for validated specs; a malformed std becomes a no-op
        return;
    };
    for v in image.iter_mut() {
        *v += normal.sample(rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array4;
    use rand::SeedableRng;

    #[test]
    fn test_zero_std_is_noop() {
        let mut image = Array4::from_elem((1, 4, 4, 4), 1.0);
        let clean = image.clone();
        add_gaussian_noise(&mut image, 0.0, &mut StdRng::seed_from_u64(0));
        assert_eq!(image, clean);
    }

    #[test]
    fn test_noise_perturbs_voxels() {
        let mut image = Array4::from_elem((1, 4, 4, 4), 1.0);
        add_gaussian_noise(&mut image, 0.5, &mut StdRng::seed_from_u64(1));
        assert!(image.iter().any(|&v| v != 1.0));
    }

    #[test]
    fn test_noise_is_reproducible() {
        let mut a = Array4::from_elem((2, 4, 4, 2), 0.0);
        let mut b = a.clone();
        add_gaussian_noise(&mut a, 0.25, &mut StdRng::seed_from_u64(9));
        add_gaussian_noise(&mut b, 0.25, &mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
    }

    #[test]
    fn test_noise_magnitude_tracks_std() {
        let mut small = Array4::from_elem((1, 8, 8, 8), 0.0);
        let mut large = small.clone();
        add_gaussian_noise(&mut small, 0.01, &mut StdRng::seed_from_u64(4));
        add_gaussian_noise(&mut large, 1.0, &mut StdRng::seed_from_u64(4));
        let rms = |a: &Array4<f32>| {
            (a.iter().map(|v| v * v).sum::<f32>() / a.len() as f32).sqrt()
        };
        assert!(rms(&large) > rms(&small) * 10.0);
    }
}
