//! Reference model collaborator
//!
//! A per-voxel logistic classifier on the image channels: small enough to
//! keep the core exercisable end-to-end without a tensor backend, yet a real
//! learner with analytic gradients and a faithful state round-trip. Demo
//! runs and tests train this model; production networks implement [`Model`]
//! externally and register themselves under their architecture name.

use ndarray::{Array3, Array4};
use serde::{Deserialize, Serialize};

use super::{Model, StateError};
use crate::data::Sample;

/// Per-voxel logistic regression over image channels
pub struct VoxelLogistic {
    /// One weight per channel followed by the bias
    params: Vec<f32>,
    grads: Vec<f32>,
    /// Inputs and probabilities cached by the last `forward`
    cache: Option<(Array4<f32>, Array3<f32>)>,
}

#[derive(Serialize, Deserialize)]
struct VoxelLogisticState {
    arch: String,
    params: Vec<f32>,
}

impl VoxelLogistic {
    pub fn new(n_channels: usize) -> Self {
        Self {
            params: vec![0.0; n_channels + 1],
            grads: vec![0.0; n_channels + 1],
            cache: None,
        }
    }

    fn n_channels(&self) -> usize {
        self.params.len() - 1
    }
}

fn sigmoid(z: f32) -> f32 {
    1.0 / (1.0 + (-z).exp())
}

impl Model for VoxelLogistic {
    fn forward(&mut self, sample: &Sample) -> Array3<f32> {
        let (c, sx, sy, sz) = sample.image.dim();
        debug_assert_eq!(c, self.n_channels());
        let bias = self.params[c];

        let pred = Array3::from_shape_fn((sx, sy, sz), |(x, y, z)| {
            let mut z_lin = bias;
            for ci in 0..c {
                z_lin += self.params[ci] * sample.image[[ci, x, y, z]];
            }
            sigmoid(z_lin)
        });

        self.cache = Some((sample.image.clone(), pred.clone()));
        pred
    }

    fn backward(&mut self, grad: &Array3<f32>) {
        let Some((image, pred)) = &self.cache else {
            return;
        };
        let c = self.n_channels();
        for (idx, &g) in grad.indexed_iter() {
            let p = pred[idx];
            let dz = g * p * (1.0 - p);
            let (x, y, z) = idx;
            for ci in 0..c {
                self.grads[ci] += dz * image[[ci, x, y, z]];
            }
            self.grads[c] += dz;
        }
    }

    fn zero_grad(&mut self) {
        self.grads.iter_mut().for_each(|g| *g = 0.0);
    }

    fn parameters(&self) -> Vec<f32> {
        self.params.clone()
    }

    fn params_and_grads(&mut self) -> (&mut [f32], &[f32]) {
        (&mut self.params, &self.grads)
    }

    fn state(&self) -> serde_json::Value {
        serde_json::to_value(VoxelLogisticState {
            arch: "voxel_logistic".to_string(),
            params: self.params.clone(),
        })
        .unwrap_or(serde_json::Value::Null)
    }

    fn load_state(&mut self, state: &serde_json::Value) -> Result<(), StateError> {
        let parsed: VoxelLogisticState = serde_json::from_value(state.clone())
            .map_err(|e| StateError(format!("voxel_logistic state: {e}")))?;
        if parsed.arch != "voxel_logistic" {
            return Err(StateError(format!("architecture mismatch: {}", parsed.arch)));
        }
        if parsed.params.len() != self.params.len() {
            return Err(StateError(format!(
                "parameter count mismatch: {} vs {}",
                parsed.params.len(),
                self.params.len()
            )));
        }
        self.params = parsed.params;
        self.grads = vec![0.0; self.params.len()];
        self.cache = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Bce, Criterion, Optimizer, Sgd};
    use ndarray::Array4;

    /// Sample whose foreground voxels carry higher intensity
    fn separable_sample() -> Sample {
        let mut label = Array3::zeros((4, 4, 2));
        label[[1, 1, 0]] = 1;
        label[[2, 2, 1]] = 1;
        let image = Array4::from_shape_fn((1, 4, 4, 2), |(_, x, y, z)| {
            if label[[x, y, z]] > 0 {
                2.0
            } else {
                -2.0
            }
        });
        Sample::new(image, label)
    }

    #[test]
    fn test_fresh_model_predicts_half() {
        let mut model = VoxelLogistic::new(1);
        let s = separable_sample();
        let pred = model.forward(&s);
        assert!(pred.iter().all(|&p| (p - 0.5).abs() < 1e-6));
    }

    #[test]
    fn test_training_reduces_loss() {
        let mut model = VoxelLogistic::new(1);
        let mut opt = Sgd::new(0.5, 0.0);
        let s = separable_sample();

        let initial = Bce.evaluate(&model.forward(&s), &s.label).value;
        for _ in 0..50 {
            model.zero_grad();
            let pred = model.forward(&s);
            let out = Bce.evaluate(&pred, &s.label);
            model.backward(&out.grad);
            let (params, grads) = model.params_and_grads();
            let grads = grads.to_vec();
            opt.step(params, &grads);
        }
        let trained = Bce.evaluate(&model.forward(&s), &s.label).value;
        assert!(trained < initial * 0.5, "{trained} vs {initial}");
    }

    #[test]
    fn test_state_roundtrip_restores_predictions() {
        let mut a = VoxelLogistic::new(2);
        a.params = vec![0.3, -0.2, 0.1];
        let mut b = VoxelLogistic::new(2);
        b.load_state(&a.state()).unwrap();

        let image = Array4::from_shape_fn((2, 3, 3, 2), |(c, x, y, z)| {
            (c + x + y + z) as f32 * 0.1
        });
        let s = Sample::new(image, Array3::zeros((3, 3, 2)));
        assert_eq!(a.forward(&s), b.forward(&s));
    }

    #[test]
    fn test_load_state_rejects_wrong_shape() {
        let mut model = VoxelLogistic::new(4);
        let other = VoxelLogistic::new(2);
        assert!(model.load_state(&other.state()).is_err());
    }

    #[test]
    fn test_load_state_rejects_wrong_arch() {
        let mut model = VoxelLogistic::new(1);
        let state = serde_json::json!({"arch": "unet", "params": [0.0, 0.0]});
        assert!(model.load_state(&state).is_err());
    }

    #[test]
    fn test_backward_without_forward_is_noop() {
        let mut model = VoxelLogistic::new(1);
        model.backward(&Array3::zeros((2, 2, 2)));
        assert!(model.parameters().iter().all(|&p| p == 0.0));
    }
}
