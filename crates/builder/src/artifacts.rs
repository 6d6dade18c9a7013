//! Produced artifact scanning and validation

use crate::layout::BuildLayout;
use relbuild_errors::{BuildError, Error};
use relbuild_types::{ArtifactDescriptor, BuildRecord, BuildTarget, PackageMetadata};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Artifacts found in a target's output directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactSet {
    pub binaries: Vec<ArtifactDescriptor>,
    pub sources: Vec<ArtifactDescriptor>,
}

impl ArtifactSet {
    #[must_use]
    pub fn len(&self) -> usize {
        self.binaries.len() + self.sources.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.binaries.is_empty() && self.sources.is_empty()
    }
}

/// Architecture segment of `name-version-release.arch.rpm`
#[must_use]
pub fn arch_from_file_name(file_name: &str, suffix: &str) -> Option<String> {
    let stem = file_name.strip_suffix(suffix)?;
    let (_, arch) = stem.rsplit_once('.')?;
    (!arch.is_empty()).then(|| arch.to_string())
}

/// Scan `files` (absolute, under the output directory) into descriptors
///
/// Paths are stored relative to the target directory.
///
/// # Errors
///
/// Returns `BuildError::EmptyArtifact` for a zero-byte package or tarball and
/// `BuildError::NoArtifacts` when no binary package is present.
pub async fn collect(
    target: &BuildTarget,
    metadata: &PackageMetadata,
    layout: &BuildLayout,
    files: &[PathBuf],
) -> Result<ArtifactSet, Error> {
    let suffix = layout.artifact_suffix();
    let mut set = ArtifactSet::default();

    for file in files {
        let Some(name) = file.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.ends_with(&layout.tarball_suffix) {
            ensure_not_empty(target, file, name).await?;
            continue;
        }
        if !name.ends_with(&suffix) {
            continue;
        }
        ensure_not_empty(target, file, name).await?;

        let signed = has_signature(file, &layout.signature_suffix);
        let relative = file
            .strip_prefix(&target.path)
            .map_or_else(|_| file.clone(), Path::to_path_buf);

        if name.ends_with(&layout.source_suffix) {
            set.sources
                .push(ArtifactDescriptor::new(relative, metadata.arch.clone(), signed));
        } else {
            let arch = arch_from_file_name(name, &suffix).unwrap_or_else(|| metadata.arch.clone());
            set.binaries.push(ArtifactDescriptor::new(relative, arch, signed));
        }
    }

    if set.binaries.is_empty() {
        return Err(BuildError::NoArtifacts {
            target: target.path.display().to_string(),
        }
        .into());
    }
    Ok(set)
}

/// Scan the whole output directory of `target`
///
/// # Errors
///
/// Returns the errors of [`collect`], and `BuildError::NoArtifacts` when the
/// output directory does not exist.
pub async fn scan_output(
    target: &BuildTarget,
    metadata: &PackageMetadata,
    layout: &BuildLayout,
) -> Result<ArtifactSet, Error> {
    let dir = layout.output_dir(&target.path);
    let mut entries = match fs::read_dir(&dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(BuildError::NoArtifacts {
                target: target.path.display().to_string(),
            }
            .into());
        }
        Err(e) => return Err(Error::io_with_path(&e, &dir)),
    };

    let mut files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| Error::io_with_path(&e, &dir))?
    {
        if entry.file_type().await.is_ok_and(|t| t.is_file()) {
            files.push(entry.path());
        }
    }
    files.sort();
    collect(target, metadata, layout, &files).await
}

/// Artifacts of an earlier record, if every file is still present and non-empty
///
/// Signature flags are read again from disk; signing happens after the
/// record is written.
pub async fn reuse_recorded(
    target: &BuildTarget,
    layout: &BuildLayout,
    record: &BuildRecord,
) -> Option<ArtifactSet> {
    if record.binary_packages.is_empty() {
        return None;
    }
    Some(ArtifactSet {
        binaries: still_present(target, layout, &record.binary_packages).await?,
        sources: still_present(target, layout, &record.source_packages).await?,
    })
}

async fn still_present(
    target: &BuildTarget,
    layout: &BuildLayout,
    recorded: &[ArtifactDescriptor],
) -> Option<Vec<ArtifactDescriptor>> {
    let mut present = Vec::with_capacity(recorded.len());
    for artifact in recorded {
        let file = target.path.join(&artifact.path);
        let meta = fs::metadata(&file).await.ok()?;
        if !meta.is_file() || meta.len() == 0 {
            return None;
        }
        let signed = has_signature(&file, &layout.signature_suffix);
        present.push(ArtifactDescriptor::new(
            artifact.path.clone(),
            artifact.arch.clone(),
            signed,
        ));
    }
    Some(present)
}

async fn ensure_not_empty(target: &BuildTarget, file: &Path, name: &str) -> Result<(), Error> {
    let meta = fs::metadata(file)
        .await
        .map_err(|e| Error::io_with_path(&e, file))?;
    if meta.len() == 0 {
        return Err(BuildError::EmptyArtifact {
            target: target.path.display().to_string(),
            artifact: name.to_string(),
        }
        .into());
    }
    Ok(())
}

fn has_signature(artifact: &Path, suffix: &str) -> bool {
    let mut sidecar = artifact.as_os_str().to_os_string();
    sidecar.push(suffix);
    Path::new(&sidecar).is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use relbuild_types::{BuildStrategy, TargetKind};
    use tempfile::tempdir;

    fn metadata() -> PackageMetadata {
        PackageMetadata {
            name: "foo".into(),
            packages: vec!["foo".into()],
            version: "1.0.0".into(),
            release: "1".into(),
            arch: "noarch".into(),
            origin: None,
        }
    }

    #[test]
    fn arch_comes_from_the_file_name() {
        assert_eq!(
            arch_from_file_name("foo-1.0.0-1.x86_64.rpm", ".rpm").as_deref(),
            Some("x86_64")
        );
        assert_eq!(arch_from_file_name("foo.rpm", ".rpm"), None);
        assert_eq!(arch_from_file_name("foo.tar.gz", ".rpm"), None);
    }

    #[tokio::test]
    async fn partitions_binaries_and_sources() {
        let temp = tempdir().unwrap();
        let dist = temp.path().join("dist");
        std::fs::create_dir_all(&dist).unwrap();
        std::fs::write(dist.join("foo-1.0.0-1.noarch.rpm"), "bin").unwrap();
        std::fs::write(dist.join("foo-1.0.0-1.noarch.rpm.minisig"), "sig").unwrap();
        std::fs::write(dist.join("foo-1.0.0-1.src.rpm"), "src").unwrap();
        std::fs::write(dist.join("foo-1.0.0.tar.gz"), "tarball").unwrap();

        let target = BuildTarget::new(temp.path(), TargetKind::Module, Some(BuildStrategy::Descriptor));
        let set = scan_output(&target, &metadata(), &BuildLayout::default())
            .await
            .unwrap();

        assert_eq!(set.binaries.len(), 1);
        assert_eq!(set.sources.len(), 1);
        assert!(set.binaries[0].signed);
        assert!(!set.sources[0].signed);
        assert_eq!(set.binaries[0].path, PathBuf::from("dist/foo-1.0.0-1.noarch.rpm"));
        assert_eq!(set.binaries[0].arch, "noarch");
    }

    #[tokio::test]
    async fn empty_package_is_fatal() {
        let temp = tempdir().unwrap();
        let dist = temp.path().join("dist");
        std::fs::create_dir_all(&dist).unwrap();
        std::fs::write(dist.join("foo-1.0.0-1.noarch.rpm"), "").unwrap();

        let target = BuildTarget::new(temp.path(), TargetKind::Module, Some(BuildStrategy::Descriptor));
        let err = scan_output(&target, &metadata(), &BuildLayout::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Build(BuildError::EmptyArtifact { .. })));
    }

    #[tokio::test]
    async fn empty_tarball_is_fatal() {
        let temp = tempdir().unwrap();
        let dist = temp.path().join("dist");
        std::fs::create_dir_all(&dist).unwrap();
        std::fs::write(dist.join("foo-1.0.0-1.noarch.rpm"), "bin").unwrap();
        std::fs::write(dist.join("foo-1.0.0.tar.gz"), "").unwrap();

        let target = BuildTarget::new(temp.path(), TargetKind::Module, Some(BuildStrategy::Descriptor));
        let err = scan_output(&target, &metadata(), &BuildLayout::default())
            .await
            .unwrap_err();
        let Error::Build(BuildError::EmptyArtifact { artifact, .. }) = err else {
            panic!("expected an empty artifact error, got {err}");
        };
        assert_eq!(artifact, "foo-1.0.0.tar.gz");
    }

    fn recorded(target: &BuildTarget) -> BuildRecord {
        BuildRecord {
            target: target.path.clone(),
            package: "foo".into(),
            version: "1.0.0".into(),
            release: "1".into(),
            reason: relbuild_types::DecisionReason::NewPackage,
            fetched: false,
            recorded_at: chrono::Utc::now(),
            binary_packages: vec![ArtifactDescriptor::new(
                "dist/foo-1.0.0-1.noarch.rpm",
                "noarch",
                false,
            )],
            source_packages: Vec::new(),
        }
    }

    #[tokio::test]
    async fn recorded_artifacts_are_reused_while_present() {
        let temp = tempdir().unwrap();
        let dist = temp.path().join("dist");
        std::fs::create_dir_all(&dist).unwrap();
        std::fs::write(dist.join("foo-1.0.0-1.noarch.rpm"), "bin").unwrap();
        std::fs::write(dist.join("foo-1.0.0-1.noarch.rpm.minisig"), "sig").unwrap();

        let target = BuildTarget::new(temp.path(), TargetKind::Module, Some(BuildStrategy::Descriptor));
        let layout = BuildLayout::default();
        let record = recorded(&target);

        let set = reuse_recorded(&target, &layout, &record).await.unwrap();
        assert_eq!(set.binaries.len(), 1);
        assert!(set.binaries[0].signed);

        std::fs::write(dist.join("foo-1.0.0-1.noarch.rpm"), "").unwrap();
        assert!(reuse_recorded(&target, &layout, &record).await.is_none());

        std::fs::remove_file(dist.join("foo-1.0.0-1.noarch.rpm")).unwrap();
        assert!(reuse_recorded(&target, &layout, &record).await.is_none());
    }

    #[tokio::test]
    async fn sources_alone_are_not_enough() {
        let temp = tempdir().unwrap();
        let dist = temp.path().join("dist");
        std::fs::create_dir_all(&dist).unwrap();
        std::fs::write(dist.join("foo-1.0.0-1.src.rpm"), "src").unwrap();

        let target = BuildTarget::new(temp.path(), TargetKind::Module, Some(BuildStrategy::Descriptor));
        let err = scan_output(&target, &metadata(), &BuildLayout::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Build(BuildError::NoArtifacts { .. })));
    }
}
