//! Outcome of a signing pass

use relbuild_errors::{Error, SigningError};
use relbuild_types::{SigningStatus, SigningSummary};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Per-artifact status for every artifact under one root
#[derive(Debug, Clone)]
pub struct SigningReport {
    pub root: PathBuf,
    pub results: BTreeMap<PathBuf, SigningStatus>,
    pub duration: Duration,
}

impl SigningReport {
    #[must_use]
    pub fn summary(&self) -> SigningSummary {
        SigningSummary::from_results(&self.results)
    }

    /// Artifacts that ended unsigned, in path order
    #[must_use]
    pub fn failures(&self) -> Vec<PathBuf> {
        self.results
            .iter()
            .filter(|(_, status)| **status == SigningStatus::Unsigned)
            .map(|(path, _)| path.clone())
            .collect()
    }

    /// Translate the status map into a pass/fail outcome
    ///
    /// # Errors
    ///
    /// Returns `SigningError::TotalFailure` when every attempted artifact
    /// failed and `SigningError::PartialFailure` when only some did.
    pub fn into_result(self) -> Result<BTreeMap<PathBuf, SigningStatus>, Error> {
        let summary = self.summary();
        if summary.failed == 0 {
            return Ok(self.results);
        }

        let root = self.root.display().to_string();
        if summary.failed == summary.attempted() {
            return Err(SigningError::TotalFailure {
                root,
                attempted: summary.attempted(),
            }
            .into());
        }

        Err(SigningError::PartialFailure {
            root,
            failed: self
                .failures()
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
        }
        .into())
    }
}
