//! Deterministic dataset partitioning
//!
//! A split is produced exactly once per run from `(sample_count, ratios,
//! seed)` and persisted in every checkpoint; resuming restores it instead of
//! recomputing, so train/val/test assignment can never drift across
//! interruptions.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::config::{DataSplitSection, ValidationError, RATIO_TOLERANCE};

/// The three partition ratios, seed excluded
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitRatios {
    pub train: f64,
    pub test: f64,
    pub validation: f64,
}

impl From<&DataSplitSection> for SplitRatios {
    fn from(section: &DataSplitSection) -> Self {
        Self {
            train: section.train_size,
            test: section.test_size,
            validation: section.validation_size,
        }
    }
}

/// Disjoint, exhaustive partition of the sample index range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSplit {
    pub train: Vec<usize>,
    pub val: Vec<usize>,
    pub test: Vec<usize>,
}

impl DatasetSplit {
    /// Total number of indices across all three partitions
    pub fn total(&self) -> usize {
        self.train.len() + self.val.len() + self.test.len()
    }
}

/// Partition `[0, sample_count)` into train/val/test index sequences
///
/// The index range is permuted with a generator seeded from `seed` alone,
/// then cut into contiguous blocks: validation and test blocks are sized
/// `round(ratio * sample_count)`, the rounding remainder goes to train so the
/// union is exact. Identical inputs always yield identical output.
///
/// # Errors
///
/// `ValidationError` when a ratio is outside `[0, 1]` or the three do not sum
/// to 1 within [`RATIO_TOLERANCE`].
pub fn split(
    sample_count: usize,
    ratios: &SplitRatios,
    seed: u64,
) -> Result<DatasetSplit, ValidationError> {
    for ratio in [ratios.train, ratios.test, ratios.validation] {
        if !(0.0..=1.0).contains(&ratio) || !ratio.is_finite() {
            return Err(ValidationError::InvalidRatio(ratio));
        }
    }
    let sum = ratios.train + ratios.test + ratios.validation;
    if (sum - 1.0).abs() > RATIO_TOLERANCE {
        return Err(ValidationError::RatioSum(sum));
    }

    let mut indices: Vec<usize> = (0..sample_count).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let n_val = (ratios.validation * sample_count as f64).round() as usize;
    let n_test = ((ratios.test * sample_count as f64).round() as usize)
        .min(sample_count.saturating_sub(n_val));
    let n_train = sample_count - n_val - n_test;

    let test = indices.split_off(n_train + n_val);
    let val = indices.split_off(n_train);
    debug_assert_eq!(test.len(), n_test);

    Ok(DatasetSplit { train: indices, val, test })
}
