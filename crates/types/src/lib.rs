#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for relbuild
//!
//! This crate provides the data model shared by the decision engine, the
//! build scheduler, the signing engine and the repository populator.

pub mod decision;
pub mod package;
pub mod reports;
pub mod target;
pub mod version;

// Re-export commonly used types
pub use decision::{DecisionReason, RebuildDecision, TagAdvisory, TagInfo};
pub use package::{PackageMetadata, RemotePackage};
pub use reports::{ArtifactDescriptor, ArtifactKind, BuildRecord, SigningStatus, SigningSummary};
pub use semver::Version;
pub use target::{BuildStrategy, BuildTarget, TargetKind};
pub use version::{parse_version, release_number, split_version, TagNormalizer, VersionRelease};

use serde::{Deserialize, Serialize};

/// Environment-level rebuild override
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RebuildPolicy {
    /// Decide normally; equivalent to `Unset`
    Never,
    /// Every target builds locally
    Always,
    #[default]
    Unset,
}

impl RebuildPolicy {
    #[must_use]
    pub fn forces_rebuild(self) -> bool {
        matches!(self, Self::Always)
    }
}

impl std::str::FromStr for RebuildPolicy {
    type Err = relbuild_errors::ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "never" | "no" => Ok(Self::Never),
            "always" | "yes" => Ok(Self::Always),
            "" | "unset" => Ok(Self::Unset),
            other => Err(relbuild_errors::ConfigError::InvalidValue {
                field: "rebuild".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

impl clap::ValueEnum for RebuildPolicy {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Never, Self::Always, Self::Unset]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Never => clap::builder::PossibleValue::new("never"),
            Self::Always => clap::builder::PossibleValue::new("always"),
            Self::Unset => clap::builder::PossibleValue::new("unset"),
        })
    }
}

/// Whether published packages may satisfy a target instead of a local build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// Never download; up-to-date remote packages only skip the build
    Disabled,
    /// Download when possible, fall back to a local build
    #[default]
    Preferred,
    /// Download is mandatory; an unavailable index fails the operation
    Required,
}

impl FetchMode {
    #[must_use]
    pub fn fetch_requested(self) -> bool {
        !matches!(self, Self::Disabled)
    }
}

impl clap::ValueEnum for FetchMode {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Disabled, Self::Preferred, Self::Required]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Disabled => clap::builder::PossibleValue::new("disabled"),
            Self::Preferred => clap::builder::PossibleValue::new("preferred"),
            Self::Required => clap::builder::PossibleValue::new("required"),
        })
    }
}
