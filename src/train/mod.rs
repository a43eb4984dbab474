//! The training loop and its bookkeeping
//!
//! This module provides the orchestration core:
//! - `Session` - the epoch loop wiring all components together
//! - `EarlyStoppingMonitor` - improvement tracking with a terminal stop state
//! - `CheckpointManager` - crash-safe tagged persistence and resume
//! - `Scheduler` - learning-rate policies (step decay, plateau)
//! - `SeedPlan` - derived, non-overlapping random streams

mod checkpoint;
mod early_stopping;
mod rng;
mod scheduler;
mod session;

pub use checkpoint::{CheckpointError, CheckpointManager, CheckpointRecord, CHECKPOINT_VERSION};
pub use early_stopping::{EarlyStoppingMonitor, MonitorState, Verdict};
pub use rng::{mix_seed, SeedPlan};
pub use scheduler::{LrScheduler, Plateau, Scheduler, StepDecay};
pub use session::{Session, TrainOutcome};
