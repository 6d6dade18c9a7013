use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Artifact repository population events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RepositoryEvent {
    RecordLoaded { path: PathBuf, artifacts: usize },

    ArtifactCopied { from: PathBuf, to: PathBuf },

    /// Unsigned source package skipped beside a signed binary
    SourceSkipped { path: PathBuf },

    Populated { binaries: usize, sources: usize },
}
