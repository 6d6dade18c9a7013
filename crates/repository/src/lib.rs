#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Arch-partitioned artifact repository for relbuild
//!
//! The populator reads every build record under a source tree and copies the
//! recorded packages into `<rpm_dir>/<arch>`, with source packages going to a
//! sibling `SRPMS/<arch>` directory.

use relbuild_builder::{find_records, read_record};
use relbuild_errors::{BuildError, Error, StorageError};
use relbuild_events::{AppEvent, EventEmitter, EventSender, RepositoryEvent};
use relbuild_types::{ArtifactDescriptor, BuildRecord};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Name of the source package directory next to the binary one
pub const SOURCE_DIR_NAME: &str = "SRPMS";

/// Counts over one population pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PopulationSummary {
    pub records: usize,
    pub binaries: usize,
    pub sources: usize,
    /// Unsigned source packages left out next to signed binaries
    pub skipped_sources: usize,
}

/// Copies recorded artifacts into the repository layout
pub struct ArtifactRepositoryPopulator {
    record_file: String,
    tx: Option<EventSender>,
}

impl EventEmitter for ArtifactRepositoryPopulator {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}

impl ArtifactRepositoryPopulator {
    #[must_use]
    pub fn new(record_file: impl Into<String>) -> Self {
        Self {
            record_file: record_file.into(),
            tx: None,
        }
    }

    #[must_use]
    pub fn with_event_sender(mut self, tx: Option<EventSender>) -> Self {
        self.tx = tx;
        self
    }

    /// `SRPMS` next to `rpm_dir`
    #[must_use]
    pub fn source_dir(rpm_dir: &Path) -> PathBuf {
        rpm_dir
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(SOURCE_DIR_NAME)
    }

    /// Copy the artifacts of every record under `src_root` into `rpm_dir`
    ///
    /// Records are processed in path order. When any binary package of a
    /// record is signed, the record's unsigned source packages are skipped.
    ///
    /// # Errors
    ///
    /// Returns `BuildError::NoRecords` when `src_root` holds no record,
    /// `BuildError::NoArtifacts` for a record without binary packages, and
    /// a storage error if a copy fails.
    pub async fn populate(&self, src_root: &Path, rpm_dir: &Path) -> Result<PopulationSummary, Error> {
        let srpm_dir = Self::source_dir(rpm_dir);
        for dir in [rpm_dir, srpm_dir.as_path()] {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| StorageError::from_io_with_path(&e, dir))?;
        }

        let records = find_records(src_root, &self.record_file);
        if records.is_empty() {
            return Err(BuildError::NoRecords {
                root: src_root.display().to_string(),
                file: self.record_file.clone(),
            }
            .into());
        }

        let mut summary = PopulationSummary::default();
        for path in &records {
            let record = read_record(path).await?;
            self.emit(AppEvent::Repository(RepositoryEvent::RecordLoaded {
                path: path.clone(),
                artifacts: record.artifact_count(),
            }));
            self.populate_record(&record, rpm_dir, &srpm_dir, &mut summary)
                .await?;
            summary.records += 1;
        }

        self.emit(AppEvent::Repository(RepositoryEvent::Populated {
            binaries: summary.binaries,
            sources: summary.sources,
        }));
        Ok(summary)
    }

    async fn populate_record(
        &self,
        record: &BuildRecord,
        rpm_dir: &Path,
        srpm_dir: &Path,
        summary: &mut PopulationSummary,
    ) -> Result<(), Error> {
        if record.binary_packages.is_empty() {
            return Err(BuildError::NoArtifacts {
                target: record.target.display().to_string(),
            }
            .into());
        }

        for artifact in &record.binary_packages {
            self.copy(record, artifact, rpm_dir).await?;
            summary.binaries += 1;
        }

        let signed_binaries = record.has_signed_binary();
        for artifact in &record.source_packages {
            if signed_binaries && !artifact.signed {
                self.emit(AppEvent::Repository(RepositoryEvent::SourceSkipped {
                    path: record.resolve(artifact),
                }));
                summary.skipped_sources += 1;
                continue;
            }
            self.copy(record, artifact, srpm_dir).await?;
            summary.sources += 1;
        }
        Ok(())
    }

    async fn copy(
        &self,
        record: &BuildRecord,
        artifact: &ArtifactDescriptor,
        dest_root: &Path,
    ) -> Result<(), Error> {
        let from = record.resolve(artifact);
        let dir = dest_root.join(&artifact.arch);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| StorageError::from_io_with_path(&e, &dir))?;

        let name = from.file_name().ok_or_else(|| StorageError::InvalidPath {
            path: from.display().to_string(),
        })?;
        let to = dir.join(name);
        fs::copy(&from, &to)
            .await
            .map_err(|e| StorageError::from_io_with_path(&e, &from))?;

        self.emit(AppEvent::Repository(RepositoryEvent::ArtifactCopied { from, to }));
        Ok(())
    }
}
