#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Dependency rules for relbuild
//!
//! The rules file maps a package name to its extra requirements, the
//! packages it obsoletes and an optional release override. It is loaded once
//! per run and only read afterwards.

mod metadata;

pub use metadata::{write_build_metadata, BuildMetadataFiles};

use relbuild_errors::{ConfigError, Error};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Rules for one package
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRules {
    #[serde(default)]
    pub requires: Vec<String>,
    #[serde(default)]
    pub obsoletes: Vec<String>,
    /// Release qualifier that replaces the descriptor's release
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
}

/// Package name to rules, as stored on disk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencyRules(pub BTreeMap<String, PackageRules>);

impl DependencyRules {
    /// # Errors
    ///
    /// Returns the YAML parse error message.
    pub fn from_yaml(content: &str) -> Result<Self, String> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yml::from_str(content).map_err(|e| e.to_string())
    }
}

/// Read-only view of the dependency rules for a run
#[derive(Debug, Clone, Default)]
pub struct DependencyMetadataStore {
    source: Option<PathBuf>,
    rules: DependencyRules,
}

impl DependencyMetadataStore {
    /// Load rules from `path`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::RulesNotFound` if the file is missing and
    /// `ConfigError::RulesInvalid` if it cannot be parsed.
    pub async fn load(path: &Path) -> Result<Self, Error> {
        let content = tokio::fs::read_to_string(path).await.map_err(|_| {
            ConfigError::RulesNotFound {
                path: path.display().to_string(),
            }
        })?;
        let rules = DependencyRules::from_yaml(&content).map_err(|message| {
            ConfigError::RulesInvalid {
                path: path.display().to_string(),
                message,
            }
        })?;
        Ok(Self {
            source: Some(path.to_path_buf()),
            rules,
        })
    }

    /// Load rules from `path`, falling back to empty rules if it is missing
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::RulesInvalid` if the file exists but cannot be
    /// parsed.
    pub async fn load_or_default(path: &Path) -> Result<Self, Error> {
        if tokio::fs::try_exists(path).await.unwrap_or(false) {
            Self::load(path).await
        } else {
            Ok(Self::default())
        }
    }

    #[must_use]
    pub fn from_rules(rules: DependencyRules) -> Self {
        Self {
            source: None,
            rules,
        }
    }

    /// Rules for `package`; absence means defaults apply
    #[must_use]
    pub fn lookup(&self, package: &str) -> Option<&PackageRules> {
        self.rules.0.get(package)
    }

    #[must_use]
    pub fn release_override(&self, package: &str) -> Option<&str> {
        self.lookup(package).and_then(|r| r.release.as_deref())
    }

    /// File the rules were read from, if any
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULES: &str = r"
pupmod-foo:
  requires:
    - pupmod-bar >= 1.0.0
  obsoletes:
    - pupmod-old-foo
  release: '2'
pupmod-bar: {}
";

    #[test]
    fn parses_rule_entries() {
        let rules = DependencyRules::from_yaml(RULES).unwrap();
        let store = DependencyMetadataStore::from_rules(rules);

        assert_eq!(store.len(), 2);
        assert_eq!(store.release_override("pupmod-foo"), Some("2"));
        assert_eq!(store.release_override("pupmod-bar"), None);
        assert_eq!(
            store.lookup("pupmod-foo").unwrap().requires,
            vec!["pupmod-bar >= 1.0.0"]
        );
        assert!(store.lookup("pupmod-baz").is_none());
    }

    #[test]
    fn empty_document_is_empty_rules() {
        assert!(DependencyRules::from_yaml("\n").unwrap().0.is_empty());
    }

    #[test]
    fn malformed_document_is_rejected() {
        assert!(DependencyRules::from_yaml("pupmod-foo: [unclosed").is_err());
    }
}
