//! Model, optimizer and criterion seams
//!
//! The training core treats the network as an opaque collaborator behind the
//! [`Model`] trait; tensor computation lives on the other side. String keys
//! from the configuration resolve to implementations through the registries
//! in this module rather than through branching in the orchestrator.

mod criterion;
mod demo;
mod optim;
mod registry;

pub use criterion::{Bce, Criterion, CriterionRegistry, Dice, FocalTversky, LossOutput};
pub use demo::VoxelLogistic;
pub use optim::{optimizer_from_name, Adam, Optimizer, Sgd};
pub use registry::{ModelOpts, ModelRegistry};

use ndarray::Array3;

use crate::data::Sample;

/// Failure to restore a collaborator from its serialized state
#[derive(Debug, thiserror::Error)]
#[error("invalid state: {0}")]
pub struct StateError(pub String);

/// Opaque segmentation model collaborator
///
/// `forward` produces a per-voxel foreground probability volume for one
/// sample; `backward` consumes the loss gradient with respect to that
/// prediction and accumulates parameter gradients until `zero_grad`.
pub trait Model: Send {
    /// Predict foreground probabilities, `[x, y, z]`
    fn forward(&mut self, sample: &Sample) -> Array3<f32>;

    /// Accumulate parameter gradients from `dL/dprediction`
    fn backward(&mut self, grad: &Array3<f32>);

    /// Clear accumulated gradients
    fn zero_grad(&mut self);

    /// Snapshot of the parameter vector
    fn parameters(&self) -> Vec<f32>;

    /// Split borrow of parameters and their accumulated gradients
    fn params_and_grads(&mut self) -> (&mut [f32], &[f32]);

    /// Serializable model state for checkpointing
    fn state(&self) -> serde_json::Value;

    /// Restore from a checkpointed state
    ///
    /// # Errors
    ///
    /// `StateError` when the value does not match this model's schema.
    fn load_state(&mut self, state: &serde_json::Value) -> Result<(), StateError>;
}
