//! Integration tests for repository population

use chrono::Utc;
use relbuild_builder::write_record;
use relbuild_errors::{BuildError, Error};
use relbuild_repository::ArtifactRepositoryPopulator;
use relbuild_types::{ArtifactDescriptor, BuildRecord, DecisionReason};
use std::path::Path;
use tempfile::tempdir;

const RECORD: &str = "last_build_record.yaml";

async fn built_target(
    root: &Path,
    name: &str,
    binaries: &[(&str, &str, bool)],
    sources: &[(&str, bool)],
) {
    let target = root.join(name);
    let dist = target.join("dist");
    std::fs::create_dir_all(&dist).unwrap();

    let describe = |file: &str, arch: &str, signed: bool| {
        std::fs::write(dist.join(file), file).unwrap();
        ArtifactDescriptor::new(Path::new("dist").join(file), arch, signed)
    };
    let record = BuildRecord {
        target: target.clone(),
        package: name.to_string(),
        version: "1.0.0".into(),
        release: "1".into(),
        reason: DecisionReason::NewPackage,
        fetched: false,
        recorded_at: Utc::now(),
        binary_packages: binaries
            .iter()
            .map(|(file, arch, signed)| describe(file, arch, *signed))
            .collect(),
        source_packages: sources
            .iter()
            .map(|(file, signed)| describe(file, "noarch", *signed))
            .collect(),
    };
    write_record(&dist.join(RECORD), &record).await.unwrap();
}

#[tokio::test]
async fn copies_into_arch_directories() {
    let temp = tempdir().unwrap();
    let src = temp.path().join("src");
    built_target(
        &src,
        "foo",
        &[("foo-1.0.0-1.noarch.rpm", "noarch", false)],
        &[("foo-1.0.0-1.src.rpm", false)],
    )
    .await;
    built_target(
        &src,
        "tool",
        &[("tool-1.0.0-1.x86_64.rpm", "x86_64", false)],
        &[],
    )
    .await;

    let rpm_dir = temp.path().join("build/SIMP/RPMS");
    let summary = ArtifactRepositoryPopulator::new(RECORD)
        .populate(&src, &rpm_dir)
        .await
        .unwrap();

    assert_eq!(summary.records, 2);
    assert_eq!(summary.binaries, 2);
    assert_eq!(summary.sources, 1);
    assert!(rpm_dir.join("noarch/foo-1.0.0-1.noarch.rpm").exists());
    assert!(rpm_dir.join("x86_64/tool-1.0.0-1.x86_64.rpm").exists());
    assert!(temp
        .path()
        .join("build/SIMP/SRPMS/noarch/foo-1.0.0-1.src.rpm")
        .exists());
}

#[tokio::test]
async fn unsigned_sources_are_skipped_next_to_signed_binaries() {
    let temp = tempdir().unwrap();
    let src = temp.path().join("src");
    built_target(
        &src,
        "foo",
        &[("foo-1.0.0-1.noarch.rpm", "noarch", true)],
        &[("foo-1.0.0-1.src.rpm", false)],
    )
    .await;

    let rpm_dir = temp.path().join("RPMS");
    let summary = ArtifactRepositoryPopulator::new(RECORD)
        .populate(&src, &rpm_dir)
        .await
        .unwrap();

    assert_eq!(summary.sources, 0);
    assert_eq!(summary.skipped_sources, 1);
    assert!(!temp.path().join("SRPMS/noarch/foo-1.0.0-1.src.rpm").exists());
}

#[tokio::test]
async fn missing_records_are_fatal() {
    let temp = tempdir().unwrap();
    let err = ArtifactRepositoryPopulator::new(RECORD)
        .populate(temp.path(), &temp.path().join("RPMS"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Build(BuildError::NoRecords { .. })));
}

#[tokio::test]
async fn record_without_binaries_is_fatal() {
    let temp = tempdir().unwrap();
    let src = temp.path().join("src");
    built_target(&src, "foo", &[], &[("foo-1.0.0-1.src.rpm", false)]).await;

    let err = ArtifactRepositoryPopulator::new(RECORD)
        .populate(&src, &temp.path().join("RPMS"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Build(BuildError::NoArtifacts { .. })));
}
