//! File names and commands shared by every target in a release tree

use relbuild_config::{constants, Config};
use relbuild_types::BuildStrategy;
use std::path::{Path, PathBuf};

/// Per-target file layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildLayout {
    pub output_dir: String,
    pub record_file: String,
    pub descriptor_file: String,
    pub generic_build_file: String,
    pub spec_dir: String,
    pub module_package_prefix: String,
    /// Artifact extension without the dot
    pub binary_extension: String,
    pub source_suffix: String,
    pub tarball_suffix: String,
    pub signature_suffix: String,
}

impl Default for BuildLayout {
    fn default() -> Self {
        Self {
            output_dir: constants::OUTPUT_DIR.to_string(),
            record_file: constants::RECORD_FILE.to_string(),
            descriptor_file: constants::DESCRIPTOR_FILE.to_string(),
            generic_build_file: constants::GENERIC_BUILD_FILE.to_string(),
            spec_dir: constants::SPEC_DIR.to_string(),
            module_package_prefix: constants::MODULE_PACKAGE_PREFIX.to_string(),
            binary_extension: "rpm".to_string(),
            source_suffix: ".src.rpm".to_string(),
            tarball_suffix: ".tar.gz".to_string(),
            signature_suffix: ".minisig".to_string(),
        }
    }
}

impl BuildLayout {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            output_dir: config.build.output_dir.clone(),
            record_file: config.build.record_file.clone(),
            descriptor_file: config.build.descriptor_file.clone(),
            generic_build_file: config.build.generic_build_file.clone(),
            spec_dir: config.build.spec_dir.clone(),
            module_package_prefix: config.build.module_package_prefix.clone(),
            binary_extension: config.build.binary_extension.clone(),
            source_suffix: config.build.source_suffix.clone(),
            tarball_suffix: config.build.tarball_suffix.clone(),
            signature_suffix: config.signing.signature_suffix.clone(),
        }
    }

    #[must_use]
    pub fn output_dir(&self, target: &Path) -> PathBuf {
        target.join(&self.output_dir)
    }

    #[must_use]
    pub fn record_path(&self, target: &Path) -> PathBuf {
        self.output_dir(target).join(&self.record_file)
    }

    #[must_use]
    pub fn spec_dir(&self, target: &Path) -> PathBuf {
        target.join(&self.spec_dir)
    }

    /// A descriptor wins over a build file; neither means unbuildable
    #[must_use]
    pub fn detect_strategy(&self, target: &Path) -> Option<BuildStrategy> {
        if target.join(&self.descriptor_file).is_file() {
            Some(BuildStrategy::Descriptor)
        } else if target.join(&self.generic_build_file).is_file() {
            Some(BuildStrategy::GenericBuildFile)
        } else {
            None
        }
    }

    /// `.rpm`, with the leading dot
    #[must_use]
    pub fn artifact_suffix(&self) -> String {
        format!(".{}", self.binary_extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn descriptor_wins_over_build_file() {
        let temp = tempdir().unwrap();
        let layout = BuildLayout::default();
        assert_eq!(layout.detect_strategy(temp.path()), None);

        std::fs::write(temp.path().join("Rakefile"), "").unwrap();
        assert_eq!(
            layout.detect_strategy(temp.path()),
            Some(BuildStrategy::GenericBuildFile)
        );

        std::fs::write(temp.path().join("metadata.json"), "{}").unwrap();
        assert_eq!(
            layout.detect_strategy(temp.path()),
            Some(BuildStrategy::Descriptor)
        );
    }

    #[test]
    fn paths_hang_off_the_target() {
        let layout = BuildLayout::default();
        let target = Path::new("/tree/src/assets/foo");
        assert_eq!(
            layout.record_path(target),
            PathBuf::from("/tree/src/assets/foo/dist/last_build_record.yaml")
        );
        assert_eq!(layout.artifact_suffix(), ".rpm");
    }
}
