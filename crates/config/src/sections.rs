//! Configuration sections

use crate::constants;
use relbuild_types::{FetchMode, RebuildPolicy};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// General application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default)]
    pub verbose: bool,
    /// Worker limit for builds, signing and housekeeping
    #[serde(default)]
    pub jobs: usize, // 0 = auto-detect
}

/// Build configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    #[serde(default)]
    pub rebuild: RebuildPolicy,
    #[serde(default)]
    pub fetch: FetchMode,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_record_file")]
    pub record_file: String,
    #[serde(default = "default_descriptor_file")]
    pub descriptor_file: String,
    #[serde(default = "default_generic_build_file")]
    pub generic_build_file: String,
    #[serde(default = "default_spec_dir")]
    pub spec_dir: String,
    #[serde(default = "default_module_package_prefix")]
    pub module_package_prefix: String,
    #[serde(default = "default_build_command")]
    pub build_command: Vec<String>,
    #[serde(default = "default_recovery_command")]
    pub recovery_command: Vec<String>,
    #[serde(default = "default_clean_command")]
    pub clean_command: Vec<String>,
    #[serde(default = "default_clobber_command")]
    pub clobber_command: Vec<String>,
    #[serde(default = "default_binary_extension")]
    pub binary_extension: String,
    #[serde(default = "default_source_suffix")]
    pub source_suffix: String,
    /// Tarballs are size-checked but never recorded
    #[serde(default = "default_tarball_suffix")]
    pub tarball_suffix: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            rebuild: RebuildPolicy::Unset,
            fetch: FetchMode::Preferred,
            output_dir: default_output_dir(),
            record_file: default_record_file(),
            descriptor_file: default_descriptor_file(),
            generic_build_file: default_generic_build_file(),
            spec_dir: default_spec_dir(),
            module_package_prefix: default_module_package_prefix(),
            build_command: default_build_command(),
            recovery_command: default_recovery_command(),
            clean_command: default_clean_command(),
            clobber_command: default_clobber_command(),
            binary_extension: default_binary_extension(),
            source_suffix: default_source_suffix(),
            tarball_suffix: default_tarball_suffix(),
        }
    }
}

/// Package index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Index document URL; `None` means no index is available
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_true")]
    pub refresh: bool,
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_timeout")]
    pub timeout: u64, // seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64, // seconds
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            url: None,
            refresh: true,
            retries: default_retries(),
            timeout: default_timeout(),
            connect_timeout: default_connect_timeout(),
        }
    }
}

/// Signing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigningConfig {
    /// Per-artifact limit in seconds
    #[serde(default = "default_sign_timeout")]
    pub timeout: u64,
    #[serde(default = "default_digest")]
    pub digest: String,
    #[serde(default)]
    pub force: bool,
    #[serde(default = "default_signature_suffix")]
    pub signature_suffix: String,
    /// External signing command; empty signs in-process
    #[serde(default)]
    pub command: Vec<String>,
    /// Exits zero when an artifact is already signed; used with `command`
    #[serde(default)]
    pub check_command: Vec<String>,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            timeout: default_sign_timeout(),
            digest: default_digest(),
            force: false,
            signature_suffix: default_signature_suffix(),
            command: Vec::new(),
            check_command: Vec::new(),
        }
    }
}

/// Path configuration, relative paths resolve against the tree root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathConfig {
    #[serde(default = "default_rules_file")]
    pub rules_file: PathBuf,
    #[serde(default = "default_keys_dir")]
    pub keys_dir: PathBuf,
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,
    #[serde(default = "default_modules_dir")]
    pub modules_dir: PathBuf,
    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,
    #[serde(default = "default_doc_dir")]
    pub doc_dir: PathBuf,
    /// Where the index document is cached; defaults to the user cache dir
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            rules_file: default_rules_file(),
            keys_dir: default_keys_dir(),
            artifact_dir: default_artifact_dir(),
            modules_dir: default_modules_dir(),
            assets_dir: default_assets_dir(),
            doc_dir: default_doc_dir(),
            cache_dir: None,
        }
    }
}

/// Tag normalization table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagConfig {
    #[serde(default = "default_legacy_prefixes")]
    pub legacy_prefixes: Vec<String>,
    #[serde(default = "default_legacy_suffixes")]
    pub legacy_suffixes: Vec<String>,
}

impl Default for TagConfig {
    fn default() -> Self {
        Self {
            legacy_prefixes: default_legacy_prefixes(),
            legacy_suffixes: default_legacy_suffixes(),
        }
    }
}

// Default value functions for serde
fn default_true() -> bool {
    true
}

fn default_output_dir() -> String {
    constants::OUTPUT_DIR.to_string()
}

fn default_record_file() -> String {
    constants::RECORD_FILE.to_string()
}

fn default_descriptor_file() -> String {
    constants::DESCRIPTOR_FILE.to_string()
}

fn default_generic_build_file() -> String {
    constants::GENERIC_BUILD_FILE.to_string()
}

fn default_spec_dir() -> String {
    constants::SPEC_DIR.to_string()
}

fn default_module_package_prefix() -> String {
    constants::MODULE_PACKAGE_PREFIX.to_string()
}

fn command(parts: &[&str]) -> Vec<String> {
    parts.iter().map(ToString::to_string).collect()
}

fn default_build_command() -> Vec<String> {
    command(&["rake", "pkg:rpm"])
}

fn default_recovery_command() -> Vec<String> {
    command(&["bundle", "install"])
}

fn default_clean_command() -> Vec<String> {
    command(&["rake", "clean"])
}

fn default_clobber_command() -> Vec<String> {
    command(&["rake", "clobber"])
}

fn default_binary_extension() -> String {
    "rpm".to_string()
}

fn default_source_suffix() -> String {
    ".src.rpm".to_string()
}

fn default_tarball_suffix() -> String {
    ".tar.gz".to_string()
}

fn default_retries() -> u32 {
    3
}

fn default_timeout() -> u64 {
    60
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_sign_timeout() -> u64 {
    60
}

fn default_digest() -> String {
    "sha256".to_string()
}

fn default_signature_suffix() -> String {
    ".minisig".to_string()
}

fn default_rules_file() -> PathBuf {
    PathBuf::from(constants::RULES_FILE)
}

fn default_keys_dir() -> PathBuf {
    PathBuf::from(constants::KEYS_DIR)
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from(constants::ARTIFACT_DIR)
}

fn default_modules_dir() -> PathBuf {
    PathBuf::from(constants::MODULES_DIR)
}

fn default_assets_dir() -> PathBuf {
    PathBuf::from(constants::ASSETS_DIR)
}

fn default_doc_dir() -> PathBuf {
    PathBuf::from(constants::DOC_DIR)
}

fn default_legacy_prefixes() -> Vec<String> {
    relbuild_types::version::LEGACY_TAG_PREFIXES
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn default_legacy_suffixes() -> Vec<String> {
    relbuild_types::version::LEGACY_TAG_SUFFIXES
        .iter()
        .map(ToString::to_string)
        .collect()
}
