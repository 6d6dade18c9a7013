use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Artifact signing events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SigningEvent {
    Started { root: PathBuf, artifacts: usize },

    ArtifactSigned { path: PathBuf },

    ArtifactSkipped { path: PathBuf },

    ArtifactFailed { path: PathBuf, message: String },

    /// Counts emitted once per signing pass
    Summary {
        already_signed: usize,
        signed: usize,
        failed: usize,
        duration: Duration,
    },
}
