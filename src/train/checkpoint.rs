//! Crash-safe checkpoint persistence
//!
//! One JSON record per tag under `checkpoints_dir/<experiment>/`. Records are
//! written to a temp file and atomically renamed into place, so an interrupted
//! save can never corrupt a previously valid record. Each file carries a
//! schema version and a sha256 digest of its payload, both verified on load.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use super::early_stopping::EarlyStoppingMonitor;
use super::scheduler::Scheduler;
use crate::data::DatasetSplit;
use crate::model::StateError;

/// Record schema version; bumped on incompatible layout changes
pub const CHECKPOINT_VERSION: u32 = 1;

/// Checkpoint persistence and restore failures
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("checkpoint '{0}' not found")]
    Missing(String),

    #[error("checkpoint '{tag}' is corrupt: {reason}")]
    Corrupt { tag: String, reason: String },

    #[error("checkpoint '{tag}' failed its digest check")]
    DigestMismatch { tag: String },

    #[error("checkpoint '{tag}' has schema version {found}, expected {expected}")]
    VersionMismatch { tag: String, found: u32, expected: u32 },

    #[error("failed to write checkpoint '{tag}': {source}")]
    Write {
        tag: String,
        #[source]
        source: std::io::Error,
    },

    #[error("collaborator state rejected: {0}")]
    State(String),
}

impl From<StateError> for CheckpointError {
    fn from(err: StateError) -> Self {
        CheckpointError::State(err.0)
    }
}

/// Everything needed to continue a run as if uninterrupted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    /// Completed epoch count; the resumed run starts at this epoch index
    pub epoch: usize,
    /// Completed optimizer steps, driving the step LR policy
    pub iterations: usize,
    /// Learning rate in effect when the record was written
    pub learning_rate: f32,
    /// Opaque model collaborator state
    pub model_state: serde_json::Value,
    /// Opaque optimizer collaborator state
    pub optimizer_state: serde_json::Value,
    /// The run's partition; restored, never recomputed
    pub dataset_split: DatasetSplit,
    /// Early-stopping state machine
    pub early_stopping: EarlyStoppingMonitor,
    /// Root seed of the derived random streams
    pub run_seed: u64,
    /// Learning-rate policy state
    pub scheduler: Scheduler,
}

/// On-disk envelope around the serialized record
#[derive(Serialize, Deserialize)]
struct Envelope {
    version: u32,
    digest: String,
    written_at: String,
    payload: String,
}

/// Tagged checkpoint storage for one experiment
#[derive(Debug, Clone)]
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Manager rooted at `checkpoints_dir/<experiment>`
    pub fn new(checkpoints_dir: impl AsRef<Path>, experiment: &str) -> Self {
        Self { dir: checkpoints_dir.as_ref().join(experiment) }
    }

    /// Storage directory of this experiment
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Tag naming for completed-epoch records
    pub fn epoch_tag(epoch: usize) -> String {
        format!("epoch_{epoch}")
    }

    /// Resolve a `which_epoch` selector to a tag; `-1` means "latest"
    pub fn resolve_tag(which_epoch: i64) -> String {
        if which_epoch < 0 {
            "latest".to_string()
        } else {
            Self::epoch_tag(which_epoch as usize)
        }
    }

    fn path_for(&self, tag: &str) -> PathBuf {
        self.dir.join(format!("{tag}.json"))
    }

    /// Whether a record exists under `tag`
    pub fn exists(&self, tag: &str) -> bool {
        self.path_for(tag).is_file()
    }

    /// Atomically persist `record` under `tag`
    ///
    /// # Errors
    ///
    /// `CheckpointError::Write` on any filesystem failure; the previously
    /// stored record for `tag`, if any, is left intact in that case.
    pub fn save(&self, record: &CheckpointRecord, tag: &str) -> Result<(), CheckpointError> {
        let write_err = |source| CheckpointError::Write { tag: tag.to_string(), source };

        fs::create_dir_all(&self.dir).map_err(write_err)?;

        let payload = serde_json::to_string(record)
            .map_err(|e| write_err(std::io::Error::other(e)))?;
        let envelope = Envelope {
            version: CHECKPOINT_VERSION,
            digest: hex_digest(&payload),
            written_at: chrono::Utc::now().to_rfc3339(),
            payload,
        };
        let body = serde_json::to_string_pretty(&envelope)
            .map_err(|e| write_err(std::io::Error::other(e)))?;

        let tmp = self.dir.join(format!(".{tag}.json.tmp"));
        fs::write(&tmp, body).map_err(write_err)?;
        fs::rename(&tmp, self.path_for(tag)).map_err(write_err)?;
        Ok(())
    }

    /// Load and verify the record stored under `tag`
    ///
    /// # Errors
    ///
    /// `Missing` when no record exists, `VersionMismatch`/`DigestMismatch`/
    /// `Corrupt` when the stored file fails its integrity or schema checks.
    pub fn load(&self, tag: &str) -> Result<CheckpointRecord, CheckpointError> {
        let path = self.path_for(tag);
        let body = match fs::read_to_string(&path) {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CheckpointError::Missing(tag.to_string()));
            }
            Err(e) => {
                return Err(CheckpointError::Corrupt {
                    tag: tag.to_string(),
                    reason: e.to_string(),
                });
            }
        };

        let envelope: Envelope = serde_json::from_str(&body).map_err(|e| {
            CheckpointError::Corrupt { tag: tag.to_string(), reason: e.to_string() }
        })?;

        if envelope.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::VersionMismatch {
                tag: tag.to_string(),
                found: envelope.version,
                expected: CHECKPOINT_VERSION,
            });
        }
        if hex_digest(&envelope.payload) != envelope.digest {
            return Err(CheckpointError::DigestMismatch { tag: tag.to_string() });
        }

        serde_json::from_str(&envelope.payload).map_err(|e| {
            CheckpointError::Corrupt { tag: tag.to_string(), reason: e.to_string() }
        })
    }
}

fn hex_digest(payload: &str) -> String {
    let digest = Sha256::digest(payload.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}
