//! Build record and signing report types

use crate::decision::DecisionReason;
use crate::package::PackageMetadata;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Binary or source package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Binary,
    Source,
}

/// One produced or fetched artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactDescriptor {
    /// Path relative to the target directory
    pub path: PathBuf,
    pub arch: String,
    pub signed: bool,
}

impl ArtifactDescriptor {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, arch: impl Into<String>, signed: bool) -> Self {
        Self {
            path: path.into(),
            arch: arch.into(),
            signed,
        }
    }

    #[must_use]
    pub fn file_name(&self) -> Option<&std::ffi::OsStr> {
        self.path.file_name()
    }
}

/// Per-target record persisted after a build or fetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRecord {
    pub target: PathBuf,
    pub package: String,
    pub version: String,
    pub release: String,
    pub reason: DecisionReason,
    /// True when the artifacts came from the package index
    #[serde(default)]
    pub fetched: bool,
    pub recorded_at: DateTime<Utc>,
    #[serde(default)]
    pub binary_packages: Vec<ArtifactDescriptor>,
    #[serde(default)]
    pub source_packages: Vec<ArtifactDescriptor>,
}

impl BuildRecord {
    #[must_use]
    pub fn has_signed_binary(&self) -> bool {
        self.binary_packages.iter().any(|a| a.signed)
    }

    #[must_use]
    pub fn artifact_count(&self) -> usize {
        self.binary_packages.len() + self.source_packages.len()
    }

    /// True for a local build of exactly this package, version and release
    #[must_use]
    pub fn built_from(&self, metadata: &PackageMetadata) -> bool {
        !self.fetched
            && self.package == metadata.name
            && self.version == metadata.version
            && self.release == metadata.release
    }

    /// Absolute location of an artifact descriptor
    #[must_use]
    pub fn resolve(&self, artifact: &ArtifactDescriptor) -> PathBuf {
        resolve_under(&self.target, &artifact.path)
    }
}

fn resolve_under(root: &Path, rel: &Path) -> PathBuf {
    if rel.is_absolute() {
        rel.to_path_buf()
    } else {
        root.join(rel)
    }
}

/// Outcome of signing one artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SigningStatus {
    Signed,
    SkippedAlreadySigned,
    /// The attempt failed or timed out
    Unsigned,
}

impl fmt::Display for SigningStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signed => write!(f, "signed"),
            Self::SkippedAlreadySigned => write!(f, "skipped_already_signed"),
            Self::Unsigned => write!(f, "unsigned"),
        }
    }
}

/// Counts over a signing status map
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningSummary {
    pub already_signed: usize,
    pub signed: usize,
    pub failed: usize,
}

impl SigningSummary {
    #[must_use]
    pub fn from_results(results: &BTreeMap<PathBuf, SigningStatus>) -> Self {
        results
            .values()
            .fold(Self::default(), |mut acc, status| {
                match status {
                    SigningStatus::Signed => acc.signed += 1,
                    SigningStatus::SkippedAlreadySigned => acc.already_signed += 1,
                    SigningStatus::Unsigned => acc.failed += 1,
                }
                acc
            })
    }

    /// Artifacts that needed a signature
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.signed + self.failed
    }
}
