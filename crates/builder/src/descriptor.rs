//! Package metadata derived from a target's descriptor or spec file

use crate::layout::BuildLayout;
use crate::spec::parse_spec;
use relbuild_errors::{BuildError, Error};
use relbuild_rules::DependencyMetadataStore;
use relbuild_types::{BuildStrategy, BuildTarget, PackageMetadata};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Release used when neither the descriptor nor the rules supply one
pub const DEFAULT_RELEASE: &str = "0";

/// Arch of every module package
pub const MODULE_ARCH: &str = "noarch";

/// The fields of a module descriptor that matter here
#[derive(Debug, Deserialize)]
struct ModuleDescriptor {
    name: String,
    version: String,
    #[serde(default)]
    release: Option<String>,
}

/// Derive metadata for `target`
///
/// A release override in `rules` replaces whatever the descriptor states;
/// a package without rules keeps its own release.
///
/// # Errors
///
/// Returns `BuildError::NoBuildStrategy` for unbuildable targets,
/// `BuildError::DescriptorInvalid` for unreadable descriptors and
/// `BuildError::SpecNotFound` for generic targets without a spec file.
pub async fn read_metadata(
    target: &BuildTarget,
    layout: &BuildLayout,
    rules: &DependencyMetadataStore,
) -> Result<PackageMetadata, Error> {
    let mut metadata = match target.strategy {
        Some(BuildStrategy::Descriptor) => read_module_descriptor(target.path(), layout).await?,
        Some(BuildStrategy::GenericBuildFile) => read_spec(target.path(), layout).await?,
        None => {
            return Err(BuildError::NoBuildStrategy {
                path: target.path().display().to_string(),
            }
            .into())
        }
    };

    if let Some(release) = rules.release_override(&metadata.name) {
        metadata.release = release.to_string();
    }
    Ok(metadata)
}

async fn read_module_descriptor(dir: &Path, layout: &BuildLayout) -> Result<PackageMetadata, Error> {
    let path = dir.join(&layout.descriptor_file);
    let invalid = |message: String| BuildError::DescriptorInvalid {
        path: path.display().to_string(),
        message,
    };

    let content = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| invalid(e.to_string()))?;
    let descriptor: ModuleDescriptor =
        serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))?;
    if descriptor.name.trim().is_empty() || descriptor.version.trim().is_empty() {
        return Err(invalid("name and version must not be empty".to_string()).into());
    }

    let name = format!("{}{}", layout.module_package_prefix, descriptor.name.trim());
    Ok(PackageMetadata {
        packages: vec![name.clone()],
        name,
        version: descriptor.version.trim().to_string(),
        release: descriptor
            .release
            .unwrap_or_else(|| DEFAULT_RELEASE.to_string()),
        arch: MODULE_ARCH.to_string(),
        origin: None,
    })
}

async fn read_spec(dir: &Path, layout: &BuildLayout) -> Result<PackageMetadata, Error> {
    let spec_path = find_spec(&layout.spec_dir(dir))
        .await
        .ok_or_else(|| BuildError::SpecNotFound {
            path: layout.spec_dir(dir).display().to_string(),
        })?;

    let content = tokio::fs::read_to_string(&spec_path)
        .await
        .map_err(|e| Error::io_with_path(&e, &spec_path))?;
    let info = parse_spec(&content).map_err(|message| BuildError::DescriptorInvalid {
        path: spec_path.display().to_string(),
        message,
    })?;

    Ok(PackageMetadata {
        name: info.name,
        packages: info.packages,
        version: info.version,
        release: info.release,
        arch: info
            .arch
            .unwrap_or_else(|| std::env::consts::ARCH.to_string()),
        origin: None,
    })
}

/// First `*.spec` file in `spec_dir`, in name order
pub async fn find_spec(spec_dir: &Path) -> Option<PathBuf> {
    let mut entries = tokio::fs::read_dir(spec_dir).await.ok()?;
    let mut specs = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "spec") && path.is_file() {
            specs.push(path);
        }
    }
    specs.sort();
    specs.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use relbuild_rules::{DependencyRules, PackageRules};
    use relbuild_types::TargetKind;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn module(dir: &Path) -> BuildTarget {
        BuildTarget::new(dir, TargetKind::Module, Some(BuildStrategy::Descriptor))
    }

    #[tokio::test]
    async fn module_descriptor_gets_prefix_and_defaults() {
        let temp = tempdir().unwrap();
        std::fs::write(
            temp.path().join("metadata.json"),
            r#"{"name": "simp-foo", "version": "1.2.3", "dependencies": []}"#,
        )
        .unwrap();

        let metadata = read_metadata(
            &module(temp.path()),
            &BuildLayout::default(),
            &DependencyMetadataStore::default(),
        )
        .await
        .unwrap();

        assert_eq!(metadata.name, "pupmod-simp-foo");
        assert_eq!(metadata.packages, vec!["pupmod-simp-foo"]);
        assert_eq!(metadata.release, DEFAULT_RELEASE);
        assert_eq!(metadata.arch, "noarch");
    }

    #[tokio::test]
    async fn release_override_wins() {
        let temp = tempdir().unwrap();
        std::fs::write(
            temp.path().join("metadata.json"),
            r#"{"name": "simp-foo", "version": "1.2.3", "release": "1"}"#,
        )
        .unwrap();
        let rules = DependencyMetadataStore::from_rules(DependencyRules(BTreeMap::from([(
            "pupmod-simp-foo".to_string(),
            PackageRules {
                release: Some("4".into()),
                ..PackageRules::default()
            },
        )])));

        let metadata = read_metadata(&module(temp.path()), &BuildLayout::default(), &rules)
            .await
            .unwrap();
        assert_eq!(metadata.release, "4");
    }

    #[tokio::test]
    async fn generic_target_needs_a_spec() {
        let temp = tempdir().unwrap();
        let target = BuildTarget::new(
            temp.path(),
            TargetKind::Auxiliary,
            Some(BuildStrategy::GenericBuildFile),
        );
        let err = read_metadata(&target, &BuildLayout::default(), &DependencyMetadataStore::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Build(BuildError::SpecNotFound { .. })));

        std::fs::create_dir_all(temp.path().join("build")).unwrap();
        std::fs::write(
            temp.path().join("build/utils.spec"),
            "Name: simp-utils\nVersion: 6.0.0\nRelease: 2\nBuildArch: noarch\n",
        )
        .unwrap();
        let metadata =
            read_metadata(&target, &BuildLayout::default(), &DependencyMetadataStore::default())
                .await
                .unwrap();
        assert_eq!(metadata.name, "simp-utils");
        assert_eq!(metadata.release, "2");
    }

    #[tokio::test]
    async fn unbuildable_target_is_rejected() {
        let temp = tempdir().unwrap();
        let target = BuildTarget::new(temp.path(), TargetKind::Auxiliary, None);
        let err = read_metadata(&target, &BuildLayout::default(), &DependencyMetadataStore::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Build(BuildError::NoBuildStrategy { .. })));
    }
}
