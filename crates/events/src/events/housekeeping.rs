use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Clean and clobber sweep events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HousekeepingEvent {
    Started { task: String, directories: usize },

    DirectoryCompleted { task: String, directory: PathBuf },

    DirectoryFailed {
        task: String,
        directory: PathBuf,
        message: String,
    },

    /// Remaining work stopped after a sibling failure
    Cancelled { task: String, pending: usize },

    Completed { task: String, success: bool },
}
