//! Rebuild decision types

use crate::package::RemotePackage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a target must or need not build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    /// Rebuild override in effect
    Forced,
    /// At least one package is not published
    NewPackage,
    /// Local version/release exceeds the published one
    NewerLocalVersion,
    /// A published package could not be downloaded
    FetchFailed,
    /// Every package is published and current
    UpToDate,
    /// No package index is available
    IndexUnavailable,
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Forced => "forced",
            Self::NewPackage => "new_package",
            Self::NewerLocalVersion => "newer_local_version",
            Self::FetchFailed => "fetch_failed",
            Self::UpToDate => "up_to_date",
            Self::IndexUnavailable => "index_unavailable",
        };
        f.write_str(text)
    }
}

/// Source-control tag state of a target
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagInfo {
    /// Latest reachable tag; empty when none
    pub latest_tag: String,
    pub origin_url: Option<String>,
}

/// Outcome of comparing the local package against the latest tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TagAdvisory {
    NoTag,
    UpToDate { tag: String },
    TagOwed { tag: String },
    /// Versions tie, the package has a release and the tag does not
    Indeterminate { tag: String },
    Unparseable { tag: String },
}

impl TagAdvisory {
    #[must_use]
    pub fn is_tag_owed(&self) -> bool {
        matches!(self, Self::NoTag | Self::TagOwed { .. })
    }
}

/// Must-build / may-fetch determination for one target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebuildDecision {
    pub must_build: bool,
    /// Published packages to download, one per sub-package
    pub fetch_candidates: Vec<RemotePackage>,
    pub reason: DecisionReason,
    pub tag: Option<TagAdvisory>,
}

impl RebuildDecision {
    #[must_use]
    pub fn build(reason: DecisionReason) -> Self {
        Self {
            must_build: true,
            fetch_candidates: Vec::new(),
            reason,
            tag: None,
        }
    }

    #[must_use]
    pub fn skip(fetch_candidates: Vec<RemotePackage>) -> Self {
        Self {
            must_build: false,
            fetch_candidates,
            reason: DecisionReason::UpToDate,
            tag: None,
        }
    }

    #[must_use]
    pub fn with_tag(mut self, tag: Option<TagAdvisory>) -> Self {
        self.tag = tag;
        self
    }

    /// First fetch candidate, if any
    #[must_use]
    pub fn fetch_candidate(&self) -> Option<&RemotePackage> {
        self.fetch_candidates.first()
    }

    /// Fall back to a local build after a failed download
    #[must_use]
    pub fn into_fetch_failed(self) -> Self {
        Self {
            must_build: true,
            fetch_candidates: Vec::new(),
            reason: DecisionReason::FetchFailed,
            tag: self.tag,
        }
    }
}
