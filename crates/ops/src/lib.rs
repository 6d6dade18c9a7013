#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! High-level operations orchestration for relbuild
//!
//! This crate sits between the CLI and the specialized crates. It resolves
//! configuration into explicit option structs once, wires the package index,
//! dependency rules and event channel into an [`OpsCtx`], and composes the
//! build, signing, population and housekeeping steps.

mod build;
mod check;
mod context;
mod housekeeping;
mod populate;
mod sign;
mod types;

pub use build::{build_release, build_single, build_targets, scheduler};
pub use check::check_published;
pub use context::{OpsContextBuilder, OpsCtx};
pub use housekeeping::{clean, clobber};
pub use populate::{populate, RPM_DIR_NAME};
pub use sign::sign_artifacts;
pub use types::{BuildReport, PopulateReport, PublishReport, PublishStatus, SignReport, SweepReport};

use relbuild_errors::{Error, OpsError};

/// Operation result that can be serialized for CLI output
#[derive(Clone, Debug, serde::Serialize)]
#[serde(tag = "type", content = "data")]
pub enum OperationResult {
    Build(BuildReport),
    Sign(SignReport),
    Populate(PopulateReport),
    Publish(PublishReport),
    Sweep(SweepReport),
}

impl OperationResult {
    /// Convert to JSON string
    ///
    /// # Errors
    ///
    /// Returns `OpsError::SerializationError` if serialization fails.
    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(self).map_err(|e| {
            OpsError::SerializationError {
                message: e.to_string(),
            }
            .into()
        })
    }
}
