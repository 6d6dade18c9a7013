use relbuild_types::{DecisionReason, TagAdvisory};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::FailureContext;

/// Rebuild decision events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DecisionEvent {
    /// Per-target detail, emitted only when verbose
    Details {
        target: PathBuf,
        package: String,
        version: String,
        release: String,
        origin: Option<String>,
    },

    /// Local package compared against the latest source-control tag
    TagChecked {
        target: PathBuf,
        package: String,
        advisory: TagAdvisory,
    },

    /// A package must be published from a local build
    PublishRequired {
        target: PathBuf,
        package: String,
        /// Published identifier, `None` for a new package
        published: Option<String>,
        reason: DecisionReason,
    },

    /// The published package is current
    RemoteCurrent {
        target: PathBuf,
        package: String,
        published: String,
    },

    /// Lookup failed; treated as not published
    LookupFailed {
        target: PathBuf,
        package: String,
        failure: FailureContext,
    },

    /// No package index; every target builds locally
    IndexUnavailable { message: String },

    Decided {
        target: PathBuf,
        must_build: bool,
        reason: DecisionReason,
    },
}
