//! Segmentation criteria
//!
//! Each criterion evaluates a predicted probability volume against the label
//! mask and returns both the scalar loss and its gradient with respect to the
//! prediction, so the opaque model only ever sees `dL/dpred`. All built-ins
//! report the monitored metric `seg_loss`.

use ndarray::Array3;
use std::collections::HashMap;

/// Probability clamp keeping logs and divisions finite
const EPS: f32 = 1e-6;

/// Smoothing constant of the Tversky index
const SMOOTH: f32 = 1.0;

/// Scalar loss plus its gradient w.r.t. the prediction
#[derive(Debug, Clone)]
pub struct LossOutput {
    pub value: f32,
    pub grad: Array3<f32>,
}

/// Loss function over a predicted probability volume
pub trait Criterion: Send + Sync {
    /// Registry key of this criterion
    fn name(&self) -> &'static str;

    /// Name of the validation metric this criterion produces
    fn metric_name(&self) -> &'static str {
        "seg_loss"
    }

    /// Evaluate loss and gradient for one sample
    fn evaluate(&self, pred: &Array3<f32>, label: &Array3<u8>) -> LossOutput;
}

/// Binary cross-entropy, averaged over voxels
#[derive(Debug, Clone, Copy, Default)]
pub struct Bce;

impl Criterion for Bce {
    fn name(&self) -> &'static str {
        "cross_entropy"
    }

    fn evaluate(&self, pred: &Array3<f32>, label: &Array3<u8>) -> LossOutput {
        debug_assert_eq!(pred.dim(), label.dim());
        let n = pred.len().max(1) as f32;
        let mut value = 0.0;
        let mut grad = Array3::zeros(pred.dim());
        for ((idx, &p_raw), &y_raw) in pred.indexed_iter().zip(label.iter()) {
            let p = p_raw.clamp(EPS, 1.0 - EPS);
            let y = f32::from(y_raw.min(1));
            value -= y * p.ln() + (1.0 - y) * (1.0 - p).ln();
            grad[idx] = (p - y) / (p * (1.0 - p) * n);
        }
        LossOutput { value: value / n, grad }
    }
}

/// Focal Tversky loss: `(1 - T)^gamma` over the smoothed Tversky index
///
/// `alpha` weighs false negatives, `beta` false positives; `gamma > 1`
/// focuses the loss on hard, small foregrounds. With `alpha = beta = 0.5`
/// and `gamma = 1` this reduces to the Dice loss.
#[derive(Debug, Clone, Copy)]
pub struct FocalTversky {
    alpha: f32,
    beta: f32,
    gamma: f32,
    key: &'static str,
}

impl FocalTversky {
    pub fn new(alpha: f32, beta: f32, gamma: f32) -> Self {
        Self { alpha, beta, gamma, key: "focal_tversky" }
    }
}

impl Default for FocalTversky {
    fn default() -> Self {
        // Class-imbalance weighting used for small infarct cores
        Self::new(0.7, 0.3, 4.0 / 3.0)
    }
}

/// Dice loss as the symmetric Tversky special case
#[derive(Debug, Clone, Copy)]
pub struct Dice(FocalTversky);

impl Default for Dice {
    fn default() -> Self {
        Dice(FocalTversky { alpha: 0.5, beta: 0.5, gamma: 1.0, key: "dice" })
    }
}

impl Criterion for Dice {
    fn name(&self) -> &'static str {
        "dice"
    }

    fn evaluate(&self, pred: &Array3<f32>, label: &Array3<u8>) -> LossOutput {
        self.0.evaluate(pred, label)
    }
}

impl Criterion for FocalTversky {
    fn name(&self) -> &'static str {
        self.key
    }

    fn evaluate(&self, pred: &Array3<f32>, label: &Array3<u8>) -> LossOutput {
        debug_assert_eq!(pred.dim(), label.dim());

        let mut tp = 0.0f32;
        let mut fne = 0.0f32;
        let mut fpe = 0.0f32;
        for (&p_raw, &y_raw) in pred.iter().zip(label.iter()) {
            let p = p_raw.clamp(0.0, 1.0);
            let y = f32::from(y_raw.min(1));
            tp += p * y;
            fne += (1.0 - p) * y;
            fpe += p * (1.0 - y);
        }
        let numer = tp + SMOOTH;
        let denom = tp + self.alpha * fne + self.beta * fpe + SMOOTH;
        let index = numer / denom;
        let one_minus = (1.0 - index).max(0.0);
        let value = one_minus.powf(self.gamma);

        // d(1-T)^g/dp = -g (1-T)^(g-1) dT/dp
        let outer = if one_minus == 0.0 && self.gamma < 1.0 {
            0.0
        } else {
            self.gamma * one_minus.powf(self.gamma - 1.0)
        };
        let mut grad = Array3::zeros(pred.dim());
        for (idx, &y_raw) in label.indexed_iter() {
            let y = f32::from(y_raw.min(1));
            let d_denom = y + self.alpha * (-y) + self.beta * (1.0 - y);
            let d_index = (y * denom - numer * d_denom) / (denom * denom);
            grad[idx] = -outer * d_index;
        }
        LossOutput { value, grad }
    }
}

/// String-keyed factory for criteria
pub struct CriterionRegistry {
    builders: HashMap<String, fn() -> Box<dyn Criterion>>,
}

impl CriterionRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self { builders: HashMap::new() }
    }

    /// Registry preloaded with the built-in criteria
    pub fn with_builtins() -> Self {
        let mut reg = Self::new();
        reg.builders.insert("focal_tversky".to_string(), || Box::new(FocalTversky::default()));
        reg.builders.insert("dice".to_string(), || Box::new(Dice::default()));
        reg.builders.insert("cross_entropy".to_string(), || Box::new(Bce));
        reg
    }

    /// Whether `name` resolves
    pub fn contains(&self, name: &str) -> bool {
        self.builders.contains_key(name)
    }

    /// Build the criterion registered under `name`
    pub fn build(&self, name: &str) -> Option<Box<dyn Criterion>> {
        self.builders.get(name).map(|b| b())
    }
}

impl Default for CriterionRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::Array3;

    fn perfect_pair() -> (Array3<f32>, Array3<u8>) {
        let mut label = Array3::zeros((4, 4, 2));
        label[[1, 1, 0]] = 1;
        label[[2, 2, 1]] = 1;
        let pred = label.mapv(f32::from);
        (pred, label)
    }

    #[test]
    fn test_bce_is_low_for_perfect_prediction() {
        let (pred, label) = perfect_pair();
        let out = Bce.evaluate(&pred, &label);
        assert!(out.value < 1e-4);
    }

    #[test]
    fn test_bce_gradient_sign() {
        let label = Array3::zeros((2, 2, 2));
        let pred = Array3::from_elem((2, 2, 2), 0.8);
        let out = Bce.evaluate(&pred, &label);
        // Overshooting a background voxel pushes the prediction down
        assert!(out.grad.iter().all(|&g| g > 0.0));
        assert!(out.value > 0.0);
    }

    #[test]
    fn test_focal_tversky_perfect_prediction_near_zero() {
        let (pred, label) = perfect_pair();
        let out = FocalTversky::default().evaluate(&pred, &label);
        assert!(out.value < 1e-3, "loss {}", out.value);
    }

    #[test]
    fn test_focal_tversky_worst_prediction_near_one() {
        let (pred, label) = perfect_pair();
        let inverted = pred.mapv(|p| 1.0 - p);
        let out = FocalTversky::default().evaluate(&inverted, &label);
        assert!(out.value > 0.5);
    }

    #[test]
    fn test_tversky_gradient_matches_finite_difference() {
        let loss = FocalTversky::default();
        let mut label = Array3::zeros((3, 3, 1));
        label[[1, 1, 0]] = 1;
        let pred = Array3::from_elem((3, 3, 1), 0.4);

        let out = loss.evaluate(&pred, &label);
        let h = 1e-3;
        for idx in [[0usize, 0, 0], [1, 1, 0]] {
            let mut bumped = pred.clone();
            bumped[idx] += h;
            let plus = loss.evaluate(&bumped, &label).value;
            bumped[idx] -= 2.0 * h;
            let minus = loss.evaluate(&bumped, &label).value;
            let numeric = (plus - minus) / (2.0 * h);
            assert_abs_diff_eq!(out.grad[idx], numeric, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_dice_is_symmetric_tversky() {
        let (pred, label) = perfect_pair();
        let noisy = pred.mapv(|p| (p * 0.8 + 0.1).clamp(0.0, 1.0));
        let dice = Dice::default().evaluate(&noisy, &label).value;
        let sym = FocalTversky::new(0.5, 0.5, 1.0).evaluate(&noisy, &label).value;
        assert_abs_diff_eq!(dice, sym, epsilon = 1e-6);
    }

    #[test]
    fn test_registry_resolves_builtins() {
        let reg = CriterionRegistry::with_builtins();
        for name in ["focal_tversky", "dice", "cross_entropy"] {
            assert!(reg.contains(name));
            assert_eq!(reg.build(name).unwrap().metric_name(), "seg_loss");
        }
        assert!(!reg.contains("hinge"));
        assert!(reg.build("hinge").is_none());
    }
}
