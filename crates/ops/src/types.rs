//! Types for operations and results

use relbuild_types::{BuildRecord, DecisionReason, SigningSummary, TagAdvisory};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome of a build pass or a full release build
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildReport {
    pub operation: String,
    pub records: Vec<BuildRecord>,
    /// Present when the release build populated the repository
    pub population: Option<PopulateReport>,
    /// Present when the release build signed its artifacts
    pub signing: Option<SignReport>,
    pub duration_ms: u64,
}

impl BuildReport {
    #[must_use]
    pub fn built(&self) -> usize {
        self.records.iter().filter(|r| !r.fetched).count()
    }

    #[must_use]
    pub fn fetched(&self) -> usize {
        self.records.iter().filter(|r| r.fetched).count()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignReport {
    pub root: PathBuf,
    pub summary: SigningSummary,
    pub duration_ms: u64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PopulateReport {
    pub rpm_dir: PathBuf,
    pub records: usize,
    pub binaries: usize,
    pub sources: usize,
    pub skipped_sources: usize,
}

/// Publication state of one target
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PublishStatus {
    pub target: PathBuf,
    pub package: String,
    pub version: String,
    pub release: String,
    /// The local package is not published yet
    pub publish_required: bool,
    pub reason: DecisionReason,
    pub tag: Option<TagAdvisory>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PublishReport {
    pub targets: Vec<PublishStatus>,
}

impl PublishReport {
    /// Targets that still need a release
    pub fn pending(&self) -> impl Iterator<Item = &PublishStatus> {
        self.targets.iter().filter(|t| t.publish_required)
    }

    /// Targets whose latest tag lags behind the package version
    pub fn tag_owed(&self) -> impl Iterator<Item = &PublishStatus> {
        self.targets
            .iter()
            .filter(|t| t.tag.as_ref().is_some_and(TagAdvisory::is_tag_owed))
    }
}

/// Housekeeping outcome
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SweepReport {
    pub task: String,
    pub directories: usize,
}
