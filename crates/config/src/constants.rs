//! Fixed names inside a release tree
//!
//! Everything here is relative to the tree root or to a target directory.

/// Per-target output directory
pub const OUTPUT_DIR: &str = "dist";

/// Per-target build record file, inside `OUTPUT_DIR`
pub const RECORD_FILE: &str = "last_build_record.yaml";

/// Module package descriptor
pub const DESCRIPTOR_FILE: &str = "metadata.json";

/// Build file that marks a generic target
pub const GENERIC_BUILD_FILE: &str = "Rakefile";

/// Directory holding spec files and generated build metadata
pub const SPEC_DIR: &str = "build";

/// Generated build metadata, under `SPEC_DIR`
pub const METADATA_DIR: &str = "rpm_metadata";
pub const REQUIRES_FILE: &str = "requires";
pub const RELEASE_FILE: &str = "release";

pub const MODULE_PACKAGE_PREFIX: &str = "pupmod-";

pub const RULES_FILE: &str = "build/rpm/dependencies.yaml";
pub const KEYS_DIR: &str = ".dev_keys";
pub const ARTIFACT_DIR: &str = "build/SIMP";

/// Index document cached when refresh is disabled
pub const INDEX_CACHE_FILE: &str = "index.json";

/// Tree layout searched by target discovery
pub const MODULES_DIR: &str = "src/puppet/modules";
pub const ASSETS_DIR: &str = "src/assets";
pub const DOC_DIR: &str = "src/doc";
