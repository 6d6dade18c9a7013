//! Package-related type definitions

use crate::version::{release_number, VersionRelease};
use relbuild_errors::{IndexError, VersionError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Metadata derived from a target's build descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageMetadata {
    /// Primary package name
    pub name: String,
    /// Every package the target produces, primary first
    pub packages: Vec<String>,
    pub version: String,
    pub release: String,
    pub arch: String,
    /// Source-control origin URL, when probed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

impl PackageMetadata {
    /// Numeric release used for tie-breaking
    #[must_use]
    pub fn release_number(&self) -> Option<u64> {
        release_number(&self.release)
    }

    /// # Errors
    ///
    /// Returns `VersionError` if the descriptor version is not comparable.
    pub fn version_release(&self) -> Result<VersionRelease, VersionError> {
        VersionRelease::parse(&self.version, &self.release)
    }

    /// Artifact file name a build of `package` produces
    #[must_use]
    pub fn artifact_name(&self, package: &str, extension: &str) -> String {
        format!(
            "{package}-{}-{}.{}.{extension}",
            self.version, self.release, self.arch
        )
    }
}

/// A published package as reported by the package index
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemotePackage {
    pub name: String,
    pub version: String,
    pub release: String,
    pub arch: String,
    /// Canonical file name, e.g. `pupmod-foo-1.2.3-1.el8.noarch.rpm`
    pub identifier: String,
}

impl RemotePackage {
    /// # Errors
    ///
    /// Returns `VersionError` if the published version is not comparable.
    pub fn version_release(&self) -> Result<VersionRelease, VersionError> {
        VersionRelease::parse(&self.version, &self.release)
    }
}

impl FromStr for RemotePackage {
    type Err = IndexError;

    /// Parse `name-version-release.arch[.ext]`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || IndexError::InvalidIdentifier {
            identifier: s.to_string(),
        };
        let identifier = s.trim();
        let stem = identifier.strip_suffix(".rpm").unwrap_or(identifier);
        let (nvr, arch) = stem.rsplit_once('.').ok_or_else(invalid)?;
        let mut parts = nvr.rsplitn(3, '-');
        let release = parts.next().ok_or_else(invalid)?;
        let version = parts.next().ok_or_else(invalid)?;
        let name = parts.next().ok_or_else(invalid)?;

        if [name, version, release, arch].iter().any(|p| p.is_empty()) {
            return Err(invalid());
        }

        Ok(Self {
            name: name.to_string(),
            version: version.to_string(),
            release: release.to_string(),
            arch: arch.to_string(),
            identifier: identifier.to_string(),
        })
    }
}

impl fmt::Display for RemotePackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier)
    }
}
