#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for relbuild
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/relbuild/config.toml)
//! - Environment variables
//! - CLI flags
//!
//! The environment is read once, by the operation layer. Nothing below the
//! operation layer consults process-wide state.

pub mod constants;
pub mod sections;

pub use sections::{BuildConfig, GeneralConfig, IndexConfig, PathConfig, SigningConfig, TagConfig};

use relbuild_errors::{ConfigError, Error};
use relbuild_types::{FetchMode, RebuildPolicy, TagNormalizer};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub signing: SigningConfig,

    #[serde(default)]
    pub paths: PathConfig,

    #[serde(default)]
    pub tags: TagConfig,
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir.join("relbuild").join("config.toml"))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        let config: Self = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path).await
        } else {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with process environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        self.merge_env_from(|key| std::env::var(key).ok())
    }

    /// Merge overrides from an arbitrary variable source
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the offending variable.
    pub fn merge_env_from<F>(&mut self, lookup: F) -> Result<(), Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(verbose) = lookup("RELBUILD_VERBOSE") {
            self.general.verbose = parse_flag("RELBUILD_VERBOSE", &verbose)?;
        }

        if let Some(jobs) = lookup("RELBUILD_JOBS") {
            self.general.jobs = parse_number("RELBUILD_JOBS", &jobs)?;
        }

        if let Some(timeout) = lookup("RELBUILD_SIGN_TIMEOUT") {
            self.signing.timeout = parse_number("RELBUILD_SIGN_TIMEOUT", &timeout)?;
        }

        if let Some(rebuild) = lookup("RELBUILD_REQUIRE_REBUILD") {
            self.build.rebuild =
                rebuild
                    .parse::<RebuildPolicy>()
                    .map_err(|_| ConfigError::InvalidValue {
                        field: "RELBUILD_REQUIRE_REBUILD".to_string(),
                        value: rebuild.clone(),
                    })?;
        }

        if let Some(fetch) = lookup("RELBUILD_FETCH_PUBLISHED") {
            self.build.fetch = match fetch.trim().to_ascii_lowercase().as_str() {
                "yes" | "true" => FetchMode::Preferred,
                "required" => FetchMode::Required,
                _ => FetchMode::Disabled,
            };
        }

        if let Some(refresh) = lookup("RELBUILD_INDEX_REFRESH") {
            self.index.refresh = parse_flag("RELBUILD_INDEX_REFRESH", &refresh)?;
        }

        if let Some(retries) = lookup("RELBUILD_INDEX_RETRIES") {
            self.index.retries = parse_number("RELBUILD_INDEX_RETRIES", &retries)?;
        }

        if let Some(keys) = lookup("RELBUILD_KEYS_DIR") {
            self.paths.keys_dir = PathBuf::from(keys);
        }

        self.validate()
    }

    /// Reject values that can only fail later
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for the first offending field.
    pub fn validate(&self) -> Result<(), Error> {
        if self.build.build_command.is_empty() {
            return Err(invalid("build.build_command", "[]"));
        }
        if self.build.clean_command.is_empty() {
            return Err(invalid("build.clean_command", "[]"));
        }
        if self.build.clobber_command.is_empty() {
            return Err(invalid("build.clobber_command", "[]"));
        }
        if self.signing.timeout == 0 {
            return Err(invalid("signing.timeout", "0"));
        }
        if self.build.fetch == FetchMode::Required && self.index.url.is_none() {
            tracing::warn!("fetch mode is `required` but no index URL is configured");
        }
        Ok(())
    }

    /// Worker limit after auto-detection
    #[must_use]
    pub fn jobs(&self) -> usize {
        calculate_jobs(self.general.jobs)
    }

    /// Tag normalizer built from the `[tags]` table
    #[must_use]
    pub fn tag_normalizer(&self) -> TagNormalizer {
        TagNormalizer::new(
            self.tags.legacy_prefixes.iter().cloned(),
            self.tags.legacy_suffixes.iter().cloned(),
        )
    }

    /// Directory the index document is cached in
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.paths.cache_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("relbuild")
        })
    }

    /// Resolve a configured path against the release tree root
    #[must_use]
    pub fn resolve(root: &Path, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            root.join(path)
        }
    }
}

fn invalid(field: &str, value: &str) -> Error {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
    .into()
}

fn parse_flag(field: &str, value: &str) -> Result<bool, Error> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        _ => Err(invalid(field, value)),
    }
}

fn parse_number<T: std::str::FromStr>(field: &str, value: &str) -> Result<T, Error> {
    value.trim().parse().map_err(|_| invalid(field, value))
}

/// Calculate the worker limit
///
/// Zero means one worker per available core.
#[must_use]
pub fn calculate_jobs(config_value: usize) -> usize {
    if config_value > 0 {
        config_value
    } else {
        num_cpus::get().max(1)
    }
}
