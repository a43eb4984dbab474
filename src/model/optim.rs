//! Optimizer collaborators
//!
//! Plain SGD with momentum and Adam with bias-corrected moments. Both expose
//! serializable state so a resumed run continues with identical moment
//! buffers.

use serde::{Deserialize, Serialize};

use super::StateError;

/// Optimizer over a flat parameter vector
pub trait Optimizer: Send {
    /// Apply one update step
    fn step(&mut self, params: &mut [f32], grads: &[f32]);

    /// Current learning rate
    fn lr(&self) -> f32;

    /// Set learning rate (applied by the scheduler)
    fn set_lr(&mut self, lr: f32);

    /// Serializable optimizer state for checkpointing
    fn state(&self) -> serde_json::Value;

    /// Restore from a checkpointed state
    fn load_state(&mut self, state: &serde_json::Value) -> Result<(), StateError>;

    /// Optimizer name for logging
    fn name(&self) -> &'static str;
}

/// Build an optimizer from its configuration key
pub fn optimizer_from_name(name: &str, lr: f32) -> Option<Box<dyn Optimizer>> {
    match name {
        "sgd" => Some(Box::new(Sgd::new(lr, 0.9))),
        "adam" => Some(Box::new(Adam::new(lr, 0.9, 0.999, 1e-8))),
        _ => None,
    }
}

/// Stochastic gradient descent with momentum
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sgd {
    lr: f32,
    momentum: f32,
    velocity: Vec<f32>,
}

impl Sgd {
    pub fn new(lr: f32, momentum: f32) -> Self {
        Self { lr, momentum, velocity: Vec::new() }
    }
}

impl Optimizer for Sgd {
    fn step(&mut self, params: &mut [f32], grads: &[f32]) {
        if self.velocity.len() != params.len() {
            self.velocity = vec![0.0; params.len()];
        }
        for ((p, &g), v) in params.iter_mut().zip(grads).zip(&mut self.velocity) {
            *v = self.momentum * *v + g;
            *p -= self.lr * *v;
        }
    }

    fn lr(&self) -> f32 {
        self.lr
    }

    fn set_lr(&mut self, lr: f32) {
        self.lr = lr;
    }

    fn state(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    fn load_state(&mut self, state: &serde_json::Value) -> Result<(), StateError> {
        *self = serde_json::from_value(state.clone())
            .map_err(|e| StateError(format!("sgd state: {e}")))?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "sgd"
    }
}

/// Adam with bias-corrected first and second moments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Adam {
    lr: f32,
    beta1: f32,
    beta2: f32,
    eps: f32,
    t: u64,
    m: Vec<f32>,
    v: Vec<f32>,
}

impl Adam {
    pub fn new(lr: f32, beta1: f32, beta2: f32, eps: f32) -> Self {
        Self { lr, beta1, beta2, eps, t: 0, m: Vec::new(), v: Vec::new() }
    }
}

impl Optimizer for Adam {
    fn step(&mut self, params: &mut [f32], grads: &[f32]) {
        if self.m.len() != params.len() {
            self.m = vec![0.0; params.len()];
            self.v = vec![0.0; params.len()];
        }
        self.t += 1;
        let bc1 = 1.0 - self.beta1.powi(self.t as i32);
        let bc2 = 1.0 - self.beta2.powi(self.t as i32);

        for i in 0..params.len() {
            let g = grads[i];
            self.m[i] = self.beta1 * self.m[i] + (1.0 - self.beta1) * g;
            self.v[i] = self.beta2 * self.v[i] + (1.0 - self.beta2) * g * g;
            let m_hat = self.m[i] / bc1;
            let v_hat = self.v[i] / bc2;
            params[i] -= self.lr * m_hat / (v_hat.sqrt() + self.eps);
        }
    }

    fn lr(&self) -> f32 {
        self.lr
    }

    fn set_lr(&mut self, lr: f32) {
        self.lr = lr;
    }

    fn state(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    fn load_state(&mut self, state: &serde_json::Value) -> Result<(), StateError> {
        *self = serde_json::from_value(state.clone())
            .map_err(|e| StateError(format!("adam state: {e}")))?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "adam"
    }
}
