//! Learning rate scheduling policies
//!
//! - `StepDecay` - multiply by gamma every N iterations, metric-blind
//! - `Plateau` - multiply by gamma when the monitored metric stalls
//!
//! The orchestrator calls `next_rate` after each optimizer step and applies
//! the result to the optimizer; plateau policies additionally receive the
//! validation metric once per epoch through `observe_metric`.

mod plateau;
mod step_decay;

#[cfg(test)]
mod tests;

pub use plateau::Plateau;
pub use step_decay::StepDecay;

use serde::{Deserialize, Serialize};

use crate::config::{Direction, ModelSection};

/// Learning rate policy
pub trait LrScheduler {
    /// Rate to use after `iteration` completed optimizer steps
    fn next_rate(&mut self, iteration: usize, current_rate: f32) -> f32;

    /// Feed the per-epoch monitored metric; ignored by metric-blind policies
    fn observe_metric(&mut self, _value: f64) {}
}

/// Serializable policy selection, checkpointed with the run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "lowercase")]
pub enum Scheduler {
    Step(StepDecay),
    Plateau(Plateau),
}

impl Scheduler {
    /// Build the policy selected by `lr_policy`
    pub fn from_config(model: &ModelSection, direction: Direction) -> Option<Self> {
        match model.lr_policy.as_str() {
            "step" => Some(Scheduler::Step(StepDecay::new(
                model.learning_rate,
                model.lr_decay_iters,
                model.lr_gamma,
            ))),
            "plateau" => Some(Scheduler::Plateau(Plateau::new(
                model.lr_gamma,
                model.lr_decay_iters.max(1),
                direction,
            ))),
            _ => None,
        }
    }
}

impl LrScheduler for Scheduler {
    fn next_rate(&mut self, iteration: usize, current_rate: f32) -> f32 {
        match self {
            Scheduler::Step(s) => s.next_rate(iteration, current_rate),
            Scheduler::Plateau(p) => p.next_rate(iteration, current_rate),
        }
    }

    fn observe_metric(&mut self, value: f64) {
        match self {
            Scheduler::Step(s) => s.observe_metric(value),
            Scheduler::Plateau(p) => p.observe_metric(value),
        }
    }
}
