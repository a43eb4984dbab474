//! Training orchestration
//!
//! The session owns the epoch loop and wires the core components together:
//! split once (or restore on resume), augment-train-validate per epoch, feed
//! the monitored metric to the early-stopping monitor and the scheduler, and
//! checkpoint. Model computation stays behind the collaborator traits. The
//! loop itself is single-threaded; only augmentation is designed for
//! parallel workers.

use crate::augment::{AugmentSpec, Pipeline};
use crate::config::{Config, ValidationError};
use crate::data::{split, DataError, DatasetSplit, Sample, SampleSource, SplitRatios};
use crate::error::Result;
use crate::model::{
    optimizer_from_name, Criterion, CriterionRegistry, Model, ModelOpts, ModelRegistry, Optimizer,
};
use crate::train::checkpoint::{CheckpointError, CheckpointManager, CheckpointRecord};
use crate::train::early_stopping::EarlyStoppingMonitor;
use crate::train::rng::SeedPlan;
use crate::train::scheduler::{LrScheduler, Scheduler};

/// Result of a completed (or early-stopped) run
#[derive(Debug, Clone)]
pub struct TrainOutcome {
    /// Total completed epochs, including those before a resume
    pub epochs_completed: usize,
    /// Whether the early-stopping monitor ended the run
    pub stopped_early: bool,
    /// Best monitored value seen
    pub best_value: Option<f64>,
    /// Monitored metric per epoch run by this session
    pub history: Vec<f64>,
}

/// One training run: components wired per the configuration
pub struct Session {
    cfg: Config,
    model: Box<dyn Model>,
    optimizer: Box<dyn Optimizer>,
    criterion: Box<dyn Criterion>,
    pipeline: Pipeline,
    split: DatasetSplit,
    monitor: EarlyStoppingMonitor,
    scheduler: Scheduler,
    seeds: SeedPlan,
    checkpoints: CheckpointManager,
    start_epoch: usize,
    iterations: usize,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("split", &self.split)
            .field("start_epoch", &self.start_epoch)
            .field("iterations", &self.iterations)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Build a session for a validated configuration
    ///
    /// A fresh run computes the dataset split from `(sample_count, ratios,
    /// seed)`; a continuation (`continue_train`) restores every piece of
    /// state from the record resolved by `which_epoch` and never recomputes
    /// the split.
    ///
    /// # Errors
    ///
    /// `Error::Validation` when a registry key fails to resolve,
    /// `Error::Checkpoint` when continuation was requested and the record is
    /// missing or fails its integrity checks.
    pub fn prepare(
        cfg: &Config,
        sample_count: usize,
        models: &ModelRegistry,
        criteria: &CriterionRegistry,
    ) -> Result<Self> {
        let opts = ModelOpts {
            n_channels: cfg.data_opts.n_channels,
            n_classes: cfg.data_opts.n_classes,
            feature_scale: cfg.model.feature_scale,
            division_factor: cfg.model.division_factor,
            gpu_ids: cfg.model.gpu_ids.clone(),
        };
        let mut model = models
            .build(&cfg.model.arch_type, &opts)
            .ok_or_else(|| ValidationError::UnknownArch(cfg.model.arch_type.clone()))?;
        let mut optimizer = optimizer_from_name(&cfg.model.optimizer, cfg.model.learning_rate)
            .ok_or_else(|| ValidationError::InvalidOptimizer(cfg.model.optimizer.clone()))?;
        let criterion = criteria
            .build(&cfg.model.criterion)
            .ok_or_else(|| ValidationError::UnknownCriterion(cfg.model.criterion.clone()))?;

        let pipeline = Pipeline::new(AugmentSpec::from_config(&cfg.augmentation, &cfg.data_opts)?);
        let checkpoints = CheckpointManager::new(&cfg.checkpoints_dir, &cfg.name);
        let direction = cfg.training.early_stop.direction;

        if cfg.model.continue_train {
            let tag = CheckpointManager::resolve_tag(cfg.model.which_epoch);
            let record = checkpoints.load(&tag)?;
            model.load_state(&record.model_state).map_err(CheckpointError::from)?;
            optimizer.load_state(&record.optimizer_state).map_err(CheckpointError::from)?;
            optimizer.set_lr(record.learning_rate);

            Ok(Self {
                cfg: cfg.clone(),
                model,
                optimizer,
                criterion,
                pipeline,
                split: record.dataset_split,
                monitor: record.early_stopping,
                scheduler: record.scheduler,
                seeds: SeedPlan::new(record.run_seed),
                checkpoints,
                start_epoch: record.epoch,
                iterations: record.iterations,
            })
        } else {
            let ratios = SplitRatios::from(&cfg.data_split);
            let dataset_split = split(sample_count, &ratios, cfg.data_split.seed)?;
            let monitor = EarlyStoppingMonitor::from_config(&cfg.training.early_stop);
            let scheduler = Scheduler::from_config(&cfg.model, direction)
                .ok_or_else(|| ValidationError::InvalidLrPolicy(cfg.model.lr_policy.clone()))?;

            Ok(Self {
                cfg: cfg.clone(),
                model,
                optimizer,
                criterion,
                pipeline,
                split: dataset_split,
                monitor,
                scheduler,
                seeds: SeedPlan::new(cfg.data_split.seed),
                checkpoints,
                start_epoch: 0,
                iterations: 0,
            })
        }
    }

    /// The run's dataset partition
    pub fn split(&self) -> &DatasetSplit {
        &self.split
    }

    /// Epoch index the next `run` starts at
    pub fn start_epoch(&self) -> usize {
        self.start_epoch
    }

    /// GPU devices from the configuration, for the model collaborator
    pub fn device_ids(&self) -> &[i64] {
        &self.cfg.model.gpu_ids
    }

    /// Drive the epoch loop to completion or early stop
    ///
    /// # Errors
    ///
    /// `Error::Data` when the train split becomes empty, `Error::Checkpoint`
    /// when a record cannot be saved (fatal: a silently lost best record
    /// would make the run irreproducible).
    pub fn run(&mut self, source: &dyn SampleSource) -> Result<TrainOutcome> {
        let n_epochs = self.cfg.training.n_epochs;
        let mut history = Vec::new();
        let mut stopped_early = false;
        let mut epochs_completed = self.start_epoch;

        for epoch in self.start_epoch..n_epochs {
            let train_loss = self.train_epoch(source, epoch)?;
            let metric = self.validate_epoch(source, train_loss)?;
            history.push(metric);

            self.scheduler.observe_metric(metric);
            let verdict = self.monitor.observe(epoch, metric);

            println!(
                "epoch {}/{}: train_loss={:.6} {}={:.6} lr={:.3e}{}",
                epoch + 1,
                n_epochs,
                train_loss,
                self.monitor.metric(),
                metric,
                self.optimizer.lr(),
                if verdict.improved { " *" } else { "" },
            );

            self.save_checkpoints(epoch, verdict.improved)?;
            epochs_completed = epoch + 1;

            if verdict.stopped {
                println!(
                    "early stop after epoch {}: no {} improvement for {} epochs",
                    epoch + 1,
                    self.monitor.metric(),
                    self.monitor.patience(),
                );
                stopped_early = true;
                break;
            }
        }

        Ok(TrainOutcome {
            epochs_completed,
            stopped_early,
            best_value: self.monitor.best_value(),
            history,
        })
    }

    /// One pass over the train split with augmentation and optimization
    fn train_epoch(&mut self, source: &dyn SampleSource, epoch: usize) -> Result<f64> {
        let indices = self.split.train.clone();
        let batch_size = self.cfg.training.batch_size.max(1);
        let mut total = 0.0f64;
        let mut seen = 0usize;

        for chunk in indices.chunks(batch_size) {
            self.model.zero_grad();
            let mut in_chunk = 0usize;

            for &index in chunk {
                let Some(mut sample) = load_with_retry(source, index) else {
                    continue;
                };
                sample.standardize();
                let mut rng = self.seeds.sample_rng(epoch, index);
                let sample = self.pipeline.apply(&sample, &mut rng);

                let pred = self.model.forward(&sample);
                let out = self.criterion.evaluate(&pred, &sample.label);
                self.model.backward(&out.grad);

                total += f64::from(out.value);
                seen += 1;
                in_chunk += 1;
            }

            if in_chunk == 0 {
                continue;
            }

            // Average accumulated gradients over the chunk, then step once
            let (params, grads) = self.model.params_and_grads();
            let scaled: Vec<f32> = grads.iter().map(|g| g / in_chunk as f32).collect();
            self.optimizer.step(params, &scaled);
            self.iterations += 1;

            let rate = self.scheduler.next_rate(self.iterations, self.optimizer.lr());
            self.optimizer.set_lr(rate);
        }

        if seen == 0 {
            return Err(DataError::EmptyTrainSplit.into());
        }
        Ok(total / seen as f64)
    }

    /// One pass over the validation split, no augmentation
    ///
    /// Falls back to the train loss when the validation split is empty so the
    /// monitor always receives a value.
    fn validate_epoch(&mut self, source: &dyn SampleSource, fallback: f64) -> Result<f64> {
        let indices = self.split.val.clone();
        let mut total = 0.0f64;
        let mut seen = 0usize;

        for &index in &indices {
            let Some(mut sample) = load_with_retry(source, index) else {
                continue;
            };
            sample.standardize();
            let sample = self.pipeline.conform_only(&sample);
            let pred = self.model.forward(&sample);
            total += f64::from(self.criterion.evaluate(&pred, &sample.label).value);
            seen += 1;
        }

        if seen == 0 {
            Ok(fallback)
        } else {
            Ok(total / seen as f64)
        }
    }

    fn save_checkpoints(&self, epoch: usize, improved: bool) -> Result<()> {
        let record = self.make_record(epoch);
        self.checkpoints.save(&record, "latest")?;
        if (epoch + 1) % self.cfg.training.save_epoch_freq == 0 {
            self.checkpoints.save(&record, &CheckpointManager::epoch_tag(epoch + 1))?;
        }
        if improved {
            self.checkpoints.save(&record, "best")?;
        }
        Ok(())
    }

    fn make_record(&self, epoch: usize) -> CheckpointRecord {
        CheckpointRecord {
            epoch: epoch + 1,
            iterations: self.iterations,
            learning_rate: self.optimizer.lr(),
            model_state: self.model.state(),
            optimizer_state: self.optimizer.state(),
            dataset_split: self.split.clone(),
            early_stopping: self.monitor.clone(),
            run_seed: self.seeds.run_seed(),
            scheduler: self.scheduler.clone(),
        }
    }
}

/// Load a sample, retrying once before skipping it with a warning
fn load_with_retry(source: &dyn SampleSource, index: usize) -> Option<Sample> {
    match source.load(index) {
        Ok(sample) => Some(sample),
        Err(first) => {
            eprintln!("Warning: retrying sample {index}: {first}");
            match source.load(index) {
                Ok(sample) => Some(sample),
                Err(second) => {
                    eprintln!("Warning: skipping sample {index}: {second}");
                    None
                }
            }
        }
    }
}
