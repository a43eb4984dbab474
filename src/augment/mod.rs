//! Stochastic, reproducible augmentation of volume samples
//!
//! Transform order is fixed (flip, affine, elastic, noise, conformance);
//! activation and magnitudes are drawn from a caller-owned stream so every
//! application is replayable. Parameters validate once at spec load.

mod affine;
mod conform;
mod elastic;
mod flip;
mod interp;
mod noise;
mod pipeline;
mod spec;

pub use affine::{affine, AffineParams};
pub use conform::conform;
pub use elastic::{elastic, DeformationField};
pub use flip::flip;
pub use noise::add_gaussian_noise;
pub use pipeline::Pipeline;
pub use spec::AugmentSpec;
