//! Step decay learning rate policy

use serde::{Deserialize, Serialize};

use super::LrScheduler;

/// Multiply the initial rate by gamma every `decay_iters` iterations
///
/// Formula: `rate = initial * gamma^(iteration / decay_iters)`. The policy is
/// a pure function of the iteration count and never consults the metric, so a
/// resumed run only needs the restored iteration counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDecay {
    initial: f32,
    decay_iters: usize,
    gamma: f32,
}

impl StepDecay {
    pub fn new(initial: f32, decay_iters: usize, gamma: f32) -> Self {
        Self { initial, decay_iters, gamma }
    }
}

impl LrScheduler for StepDecay {
    fn next_rate(&mut self, iteration: usize, _current_rate: f32) -> f32 {
        if self.decay_iters == 0 {
            return self.initial;
        }
        let num_decays = iteration / self.decay_iters;
        self.initial * self.gamma.powi(num_decays as i32)
    }
}
