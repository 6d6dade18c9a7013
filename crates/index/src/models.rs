//! Index data models

use chrono::{DateTime, Utc};
use relbuild_errors::{Error, IndexError};
use relbuild_types::RemotePackage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Published package index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Index {
    #[serde(flatten)]
    pub metadata: IndexMetadata,
    /// Package name to every published build of it
    #[serde(default)]
    pub packages: BTreeMap<String, Vec<IndexEntry>>,
}

/// Index metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMetadata {
    pub version: u32,
    pub timestamp: DateTime<Utc>,
}

/// One published artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Canonical file name, `name-version-release.arch.ext`
    pub file: String,
    /// Download location; relative locations resolve against the index URL.
    /// Defaults to `file`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl IndexEntry {
    #[must_use]
    pub fn location(&self) -> &str {
        self.url.as_deref().unwrap_or(&self.file)
    }
}

impl Default for Index {
    fn default() -> Self {
        Self::new()
    }
}

impl Index {
    /// Create a new empty index
    #[must_use]
    pub fn new() -> Self {
        Self {
            metadata: IndexMetadata {
                version: crate::SUPPORTED_INDEX_VERSION,
                timestamp: Utc::now(),
            },
            packages: BTreeMap::new(),
        }
    }

    /// Parse index from JSON
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or cannot be parsed.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json).map_err(|e| {
            IndexError::InvalidResponse {
                message: format!("invalid index JSON: {e}"),
            }
            .into()
        })
    }

    /// Serialize index to JSON
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be serialized to JSON.
    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(self).map_err(|e| {
            IndexError::InvalidResponse {
                message: format!("failed to serialize index: {e}"),
            }
            .into()
        })
    }

    /// Validate index format and version
    ///
    /// # Errors
    ///
    /// Returns an error if the index version is unsupported or an entry's
    /// file name does not parse to the package it is listed under.
    pub fn validate(&self) -> Result<(), Error> {
        if self.metadata.version > crate::SUPPORTED_INDEX_VERSION {
            return Err(IndexError::InvalidResponse {
                message: format!(
                    "index version {} is newer than supported version {}",
                    self.metadata.version,
                    crate::SUPPORTED_INDEX_VERSION
                ),
            }
            .into());
        }

        for (name, entries) in &self.packages {
            for entry in entries {
                let parsed: RemotePackage = entry.file.parse()?;
                if &parsed.name != name {
                    return Err(IndexError::InvalidResponse {
                        message: format!("entry {} listed under package {name}", entry.file),
                    }
                    .into());
                }
            }
        }

        Ok(())
    }

    /// Newest published build of `name`
    ///
    /// Entries whose version cannot be compared are ignored.
    #[must_use]
    pub fn latest(&self, name: &str) -> Option<(RemotePackage, &IndexEntry)> {
        self.packages
            .get(name)?
            .iter()
            .filter_map(|entry| {
                let pkg: RemotePackage = entry.file.parse().ok()?;
                let vr = pkg.version_release().ok()?;
                Some((vr, pkg, entry))
            })
            .max_by(|(a, _, _), (b, _, _)| a.compare(b))
            .map(|(_, pkg, entry)| (pkg, entry))
    }

    /// Add a published file under its parsed package name
    ///
    /// # Errors
    ///
    /// Returns an error if `file` is not a valid identifier.
    pub fn add(&mut self, file: &str, url: Option<String>) -> Result<(), Error> {
        let parsed: RemotePackage = file.parse()?;
        self.packages.entry(parsed.name).or_default().push(IndexEntry {
            file: file.to_string(),
            url,
        });
        Ok(())
    }

    /// Get total package count
    #[must_use]
    pub fn package_count(&self) -> usize {
        self.packages.len()
    }
}
