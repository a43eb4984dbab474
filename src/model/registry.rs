//! Architecture registry
//!
//! `arch_type` strings resolve here to model builders. The built-in names
//! cover the perfusion-CT U-Net family; each maps to the reference
//! collaborator so a configuration can validate and run end-to-end. Embedding
//! systems register their real networks under the same keys.

use std::collections::HashMap;

use super::demo::VoxelLogistic;
use super::Model;

/// Architecture-sizing options handed to a model builder
#[derive(Debug, Clone)]
pub struct ModelOpts {
    pub n_channels: usize,
    pub n_classes: usize,
    pub feature_scale: usize,
    pub division_factor: usize,
    pub gpu_ids: Vec<i64>,
}

type ModelBuilder = Box<dyn Fn(&ModelOpts) -> Box<dyn Model> + Send + Sync>;

/// String-keyed factory for model architectures
pub struct ModelRegistry {
    builders: HashMap<String, ModelBuilder>,
}

/// Architectures of the perfusion-CT segmentation family
const BUILTIN_ARCHS: &[&str] = &[
    "unet",
    "unet_nonlocal",
    "unet_grid_gating",
    "unet_pct_multi_att_dsv",
    "unet_pct_multi_att_dsv_25d_poolz",
    "unet_pct_multi_att_dsv_25d_convz",
];

impl ModelRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self { builders: HashMap::new() }
    }

    /// Registry with every built-in architecture name resolvable
    pub fn with_builtins() -> Self {
        let mut reg = Self::new();
        for &arch in BUILTIN_ARCHS {
            reg.register(arch, |opts| Box::new(VoxelLogistic::new(opts.n_channels)));
        }
        reg
    }

    /// Register (or replace) a builder under `name`
    pub fn register<F>(&mut self, name: &str, builder: F)
    where
        F: Fn(&ModelOpts) -> Box<dyn Model> + Send + Sync + 'static,
    {
        self.builders.insert(name.to_string(), Box::new(builder));
    }

    /// Whether `name` resolves
    pub fn contains(&self, name: &str) -> bool {
        self.builders.contains_key(name)
    }

    /// Build the model registered under `name`
    pub fn build(&self, name: &str, opts: &ModelOpts) -> Option<Box<dyn Model>> {
        self.builders.get(name).map(|b| b(opts))
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
