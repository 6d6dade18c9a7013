use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::FailureContext;

/// Build scheduling events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BuildEvent {
    /// A build pass over a target set started
    PassStarted { operation: String, targets: usize },

    TargetStarted { target: PathBuf },

    /// Build procedure spawned in the target directory
    ProcedureStarted { target: PathBuf, command: String },

    /// First attempt failed; toolchain reset before the single retry
    RecoveryAttempted { target: PathBuf, message: String },

    BuildMetadataWritten { target: PathBuf, path: PathBuf },

    RecordWritten { target: PathBuf, path: PathBuf },

    /// Artifacts of the previous run still match; no build was run
    ArtifactsReused { target: PathBuf, artifacts: usize },

    TargetCompleted {
        target: PathBuf,
        artifacts: usize,
        fetched: bool,
        duration: Duration,
    },

    TargetFailed {
        target: PathBuf,
        failure: FailureContext,
    },

    PassCompleted {
        operation: String,
        succeeded: usize,
        failed: usize,
    },
}
