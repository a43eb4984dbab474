//! Sample loading seam
//!
//! The real dataset reader lives outside this core; the orchestrator only
//! needs [`SampleSource`]. A deterministic synthetic source is provided for
//! demo runs and tests, following the same fallback discipline the rest of
//! the crate uses when real data is absent.

use ndarray::{Array3, Array4};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::sample::Sample;
use crate::train::mix_seed;

/// Dataset-level errors
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    /// A single sample could not be read; retried once, then skipped
    #[error("sample {index} unreadable: {reason}")]
    Unreadable { index: usize, reason: String },

    /// Every sample of the train split failed to load
    #[error("train split is empty after skipping unreadable samples")]
    EmptyTrainSplit,
}

/// Source of raw (un-augmented) samples
///
/// Implementations must be callable from parallel loader workers.
pub trait SampleSource: Send + Sync {
    /// Number of samples in the full index set
    fn len(&self) -> usize;

    /// True when the source holds no samples
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load the sample at `index`
    fn load(&self, index: usize) -> Result<Sample, DataError>;
}

/// Deterministic synthetic perfusion volumes
///
/// Each index maps to a fixed pseudo-random volume with an ellipsoidal
/// lesion: the label marks the lesion, the image channels carry background
/// noise plus an intensity shift inside it. Two sources built with the same
/// parameters produce byte-identical samples.
pub struct SyntheticSource {
    count: usize,
    shape: [usize; 3],
    channels: usize,
    seed: u64,
}

impl SyntheticSource {
    pub fn new(count: usize, shape: [usize; 3], channels: usize, seed: u64) -> Self {
        Self { count, shape, channels, seed }
    }
}

impl SampleSource for SyntheticSource {
    fn len(&self) -> usize {
        self.count
    }

    fn load(&self, index: usize) -> Result<Sample, DataError> {
        if index >= self.count {
            return Err(DataError::Unreadable {
                index,
                reason: format!("index out of range (source holds {})", self.count),
            });
        }

        let [sx, sy, sz] = self.shape;
        let mut rng = StdRng::seed_from_u64(mix_seed(self.seed, &[0x5a17, index as u64]));

        // Lesion centre kept away from the borders so augmentation has room
        let cx = rng.random_range(sx as f32 * 0.3..sx as f32 * 0.7);
        let cy = rng.random_range(sy as f32 * 0.3..sy as f32 * 0.7);
        let cz = rng.random_range(sz as f32 * 0.3..sz as f32 * 0.7);
        let radius = rng.random_range(1.0..(sx.min(sy) as f32 * 0.2).max(1.5));

        let label = Array3::from_shape_fn((sx, sy, sz), |(x, y, z)| {
            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            let dz = (z as f32 - cz) * 2.0;
            if (dx * dx + dy * dy + dz * dz).sqrt() <= radius {
                1
            } else {
                0
            }
        });

        let mut image = Array4::zeros((self.channels, sx, sy, sz));
        for c in 0..self.channels {
            let contrast = 1.0 + c as f32 * 0.5;
            for x in 0..sx {
                for y in 0..sy {
                    for z in 0..sz {
                        let noise: f32 = rng.random_range(-0.5..0.5);
                        let lesion = if label[[x, y, z]] > 0 { contrast } else { 0.0 };
                        image[[c, x, y, z]] = 10.0 + noise + lesion;
                    }
                }
            }
        }

        Ok(Sample::new(image, label))
    }
}
