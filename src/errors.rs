//! Typed error hierarchy for the waymark core.
//!
//! A single enum covers the checkpoint subsystem. Callers branch on the
//! variant to decide whether to fix input, retry, or surface the failure:
//! - input problems: `Validation`, `EmptyCheckpoint`, `MissingNextSteps`
//! - races: `SequenceConflict`, `Busy` (see [`WaymarkError::is_retryable`])
//! - misuse: `NotFinalized`, `AlreadyFinalized`
//! - lookups: `NotFound`, `CheckpointNotFound`, `ProjectExists`, `NoObjectives`
//! - pass-through: `VersionControl`

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WaymarkError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Checkpoint #{sequence_number} already exists for project '{project}'")]
    SequenceConflict {
        project: String,
        sequence_number: u64,
    },

    #[error("Checkpoint is not finalized")]
    NotFinalized,

    #[error("Checkpoint #{sequence_number} is already finalized")]
    AlreadyFinalized { sequence_number: u64 },

    #[error("Project '{project}' is busy (lock not acquired after {waited_ms} ms)")]
    Busy { project: String, waited_ms: u64 },

    #[error("Project '{project}' not found")]
    NotFound { project: String },

    #[error("Checkpoint #{sequence_number} not found for project '{project}'")]
    CheckpointNotFound {
        project: String,
        sequence_number: u64,
    },

    #[error("Project '{project}' already exists")]
    ProjectExists { project: String },

    #[error("Checkpoint is empty: add work_completed, key_decisions or next_steps")]
    EmptyCheckpoint,

    #[error("Checkpoint has no next_steps: at least one next step is required")]
    MissingNextSteps,

    #[error("Project '{project}' has no objectives")]
    NoObjectives { project: String },

    #[error("Version control failure: {0}")]
    VersionControl(String),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl WaymarkError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        WaymarkError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for failures that can succeed on a later attempt without
    /// changing the input (lock contention and sequence races).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WaymarkError::SequenceConflict { .. } | WaymarkError::Busy { .. }
        )
    }
}

pub type Result<T, E = WaymarkError> = std::result::Result<T, E>;
