//! Segmentar: training core for perfusion-CT infarct segmentation
//!
//! The crate implements the subsystems of a segmentation training run that
//! carry real invariants:
//! - Deterministic, seeded dataset partitioning (`data`)
//! - A stochastic, replayable augmentation pipeline (`augment`)
//! - Early stopping as an explicit state machine (`train`)
//! - Crash-safe checkpoint/resume bookkeeping (`train`)
//! - Learning-rate policies and the orchestrating epoch loop (`train`)
//!
//! The network itself is an opaque collaborator behind `model::Model`;
//! architectures and criteria resolve through string-keyed registries.
//!
//! # Example
//!
//! ```no_run
//! use segmentar::config::load_config;
//! use segmentar::data::SyntheticSource;
//! use segmentar::model::{CriterionRegistry, ModelRegistry};
//! use segmentar::train::Session;
//!
//! let cfg = load_config("experiment.json")?;
//! let source = SyntheticSource::new(24, cfg.data_opts.scale_size, cfg.data_opts.n_channels, 42);
//! let models = ModelRegistry::with_builtins();
//! let criteria = CriterionRegistry::with_builtins();
//!
//! let mut session = Session::prepare(&cfg, 24, &models, &criteria)?;
//! let outcome = session.run(&source)?;
//! println!("best: {:?}", outcome.best_value);
//! # Ok::<(), segmentar::Error>(())
//! ```

pub mod augment;
pub mod cli;
pub mod config;
pub mod data;
mod error;
pub mod model;
pub mod train;

pub use error::{Error, Result};
