//! Version, release and source-control tag comparison
//!
//! Package versions are ordered by semantic version, never by string
//! comparison. Short versions such as `1.2` are padded to `1.2.0`. A release
//! string contributes only its leading number, which breaks ties between
//! equal versions.

use std::cmp::Ordering;

use relbuild_errors::VersionError;
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::TagAdvisory;

/// Tag prefixes stripped before comparison, applied in order
pub const LEGACY_TAG_PREFIXES: &[&str] = &["v", "simp-", "simp6.0.0-"];

/// Tag suffixes stripped before comparison
pub const LEGACY_TAG_SUFFIXES: &[&str] = &["-post1"];

/// Parse a package version, padding missing minor and patch components
///
/// # Errors
///
/// Returns `VersionError::InvalidVersion` if the core is not one to three
/// dot-separated numbers or the remainder is not a valid pre-release.
pub fn parse_version(input: &str) -> Result<Version, VersionError> {
    let (version, extra) = split_version(input)?;
    if extra.is_empty() {
        Ok(version)
    } else {
        Err(VersionError::InvalidVersion {
            input: input.to_string(),
        })
    }
}

/// Parse a version with any number of numeric segments
///
/// The first three segments form the semantic version; the rest are
/// returned separately, in order.
///
/// # Errors
///
/// Returns `VersionError::InvalidVersion` if a segment is not a number or
/// the remainder is not a valid pre-release.
pub fn split_version(input: &str) -> Result<(Version, Vec<u64>), VersionError> {
    let trimmed = input.trim();
    if let Ok(version) = Version::parse(trimmed) {
        return Ok((version, Vec::new()));
    }

    let invalid = || VersionError::InvalidVersion {
        input: input.to_string(),
    };

    let split = trimmed.find(|c| c == '-' || c == '+').unwrap_or(trimmed.len());
    let (core, rest) = trimmed.split_at(split);
    let mut parts = core
        .split('.')
        .map(|p| p.parse::<u64>().map_err(|_| invalid()))
        .collect::<Result<Vec<_>, _>>()?;
    if parts.is_empty() {
        return Err(invalid());
    }

    let extra = if parts.len() > 3 { parts.split_off(3) } else { Vec::new() };
    let major = parts[0];
    let minor = parts.get(1).copied().unwrap_or(0);
    let patch = parts.get(2).copied().unwrap_or(0);
    let version = Version::parse(&format!("{major}.{minor}.{patch}{rest}")).map_err(|_| invalid())?;
    Ok((version, extra))
}

/// Compare trailing segments, treating missing ones as zero
fn compare_extra(a: &[u64], b: &[u64]) -> Ordering {
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| {
            let left = a.get(i).copied().unwrap_or(0);
            let right = b.get(i).copied().unwrap_or(0);
            left.cmp(&right)
        })
        .find(|ord| ord.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Leading number of a release string (`"3.el8"` is 3)
#[must_use]
pub fn release_number(release: &str) -> Option<u64> {
    let digits: String = release
        .trim()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

/// A version paired with its numeric release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRelease {
    pub version: Version,
    /// Numeric segments past the patch (`1.2.3.4` keeps `[4]`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<u64>,
    pub release: Option<u64>,
}

impl VersionRelease {
    /// # Errors
    ///
    /// Returns `VersionError` if `version` cannot be parsed.
    pub fn parse(version: &str, release: &str) -> Result<Self, VersionError> {
        let (version, extra) = split_version(version)?;
        Ok(Self {
            version,
            extra,
            release: release_number(release),
        })
    }

    /// Version order alone, release ignored
    #[must_use]
    pub fn compare_version(&self, other: &Self) -> Ordering {
        self.version
            .cmp(&other.version)
            .then_with(|| compare_extra(&self.extra, &other.extra))
    }

    /// Compare by version first, then by release when versions tie
    ///
    /// A missing release on either side leaves equal versions equal.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Ordering {
        match self.compare_version(other) {
            Ordering::Equal => match (self.release, other.release) {
                (Some(a), Some(b)) => a.cmp(&b),
                _ => Ordering::Equal,
            },
            ord => ord,
        }
    }

    #[must_use]
    pub fn is_newer_than(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Greater
    }
}

/// Strips legacy tag decorations before a tag is compared
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagNormalizer {
    prefixes: Vec<String>,
    suffixes: Vec<String>,
}

impl Default for TagNormalizer {
    fn default() -> Self {
        Self::new(
            LEGACY_TAG_PREFIXES.iter().map(ToString::to_string),
            LEGACY_TAG_SUFFIXES.iter().map(ToString::to_string),
        )
    }
}

impl TagNormalizer {
    #[must_use]
    pub fn new(
        prefixes: impl IntoIterator<Item = String>,
        suffixes: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            prefixes: prefixes.into_iter().collect(),
            suffixes: suffixes.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn normalize(&self, tag: &str) -> String {
        let mut out = tag.trim();
        for prefix in &self.prefixes {
            if let Some(rest) = out.strip_prefix(prefix.as_str()) {
                out = rest;
            }
        }
        for suffix in &self.suffixes {
            if let Some(rest) = out.strip_suffix(suffix.as_str()) {
                out = rest;
            }
        }
        out.to_string()
    }

    /// Split a normalized tag into version and trailing `-N` release
    ///
    /// # Errors
    ///
    /// Returns `VersionError::InvalidTag` if the version part is not a
    /// comparable version.
    pub fn parse(&self, tag: &str) -> Result<VersionRelease, VersionError> {
        let normalized = self.normalize(tag);
        let (version, release) = match normalized.rsplit_once('-') {
            Some((head, tail))
                if !tail.is_empty() && tail.bytes().all(|b| b.is_ascii_digit()) =>
            {
                (head, tail.parse::<u64>().ok())
            }
            _ => (normalized.as_str(), None),
        };
        let (version, extra) = split_version(version).map_err(|_| VersionError::InvalidTag {
            tag: tag.to_string(),
        })?;
        Ok(VersionRelease {
            version,
            extra,
            release,
        })
    }

    /// Advisory comparison of a local package against the latest tag
    ///
    /// Never forces a rebuild; the caller only reports the outcome.
    #[must_use]
    pub fn advise(&self, local: &VersionRelease, latest_tag: &str) -> TagAdvisory {
        let tag = latest_tag.trim();
        if tag.is_empty() {
            return TagAdvisory::NoTag;
        }
        let Ok(tagged) = self.parse(tag) else {
            return TagAdvisory::Unparseable {
                tag: tag.to_string(),
            };
        };

        match local.compare_version(&tagged) {
            Ordering::Greater => TagAdvisory::TagOwed {
                tag: tag.to_string(),
            },
            Ordering::Less => TagAdvisory::UpToDate {
                tag: tag.to_string(),
            },
            Ordering::Equal => match (local.release, tagged.release) {
                (Some(local_rel), Some(tag_rel)) if local_rel > tag_rel => TagAdvisory::TagOwed {
                    tag: tag.to_string(),
                },
                (Some(_), None) => TagAdvisory::Indeterminate {
                    tag: tag.to_string(),
                },
                _ => TagAdvisory::UpToDate {
                    tag: tag.to_string(),
                },
            },
        }
    }
}
