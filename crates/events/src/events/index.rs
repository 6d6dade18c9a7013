use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::FailureContext;

/// Package index and download events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum IndexEvent {
    /// Index document loaded from the remote or the local cache
    Loaded { source: String, packages: usize },

    FetchStarted { package: String, identifier: String },

    /// Artifact already present in the output directory
    FetchSkipped { package: String, path: PathBuf },

    FetchRetry {
        package: String,
        attempt: u32,
        max_attempts: u32,
        message: String,
    },

    FetchCompleted { package: String, path: PathBuf },

    FetchFailed {
        package: String,
        failure: FailureContext,
    },
}
