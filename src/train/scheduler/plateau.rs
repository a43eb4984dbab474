//! Plateau learning rate policy

use serde::{Deserialize, Serialize};

use super::LrScheduler;
use crate::config::Direction;

/// Reduce the rate by gamma when the metric stops improving
///
/// Each epoch's monitored value arrives through `observe_metric`; after
/// `patience` consecutive non-improving epochs a reduction is queued and
/// applied on the next `next_rate` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plateau {
    gamma: f32,
    patience: usize,
    direction: Direction,
    best: Option<f64>,
    epochs_since_improvement: usize,
    pending_drops: u32,
}

impl Plateau {
    pub fn new(gamma: f32, patience: usize, direction: Direction) -> Self {
        Self {
            gamma,
            patience,
            direction,
            best: None,
            epochs_since_improvement: 0,
            pending_drops: 0,
        }
    }
}

impl LrScheduler for Plateau {
    fn next_rate(&mut self, _iteration: usize, current_rate: f32) -> f32 {
        if self.pending_drops == 0 {
            return current_rate;
        }
        let rate = current_rate * self.gamma.powi(self.pending_drops as i32);
        self.pending_drops = 0;
        rate
    }

    fn observe_metric(&mut self, value: f64) {
        let best = self.best.unwrap_or_else(|| self.direction.worst());
        if self.direction.improves(value, best) {
            self.best = Some(value);
            self.epochs_since_improvement = 0;
        } else {
            self.epochs_since_improvement += 1;
            if self.epochs_since_improvement >= self.patience {
                self.pending_drops += 1;
                self.epochs_since_improvement = 0;
            }
        }
    }
}
