//! Build record persistence
//!
//! One YAML record per target, overwritten after every build or fetch.

use relbuild_errors::{BuildError, Error};
use relbuild_types::BuildRecord;
use std::path::{Path, PathBuf};
use tokio::fs;
use walkdir::WalkDir;

/// Write `record` to `path`, replacing any earlier record
///
/// # Errors
///
/// Returns `BuildError::RecordWriteFailed` if the record cannot be
/// serialized or written.
pub async fn write_record(path: &Path, record: &BuildRecord) -> Result<(), Error> {
    let failed = |message: String| BuildError::RecordWriteFailed {
        path: path.display().to_string(),
        message,
    };

    let yaml = serde_yml::to_string(record).map_err(|e| failed(e.to_string()))?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| failed(e.to_string()))?;
    }

    let tmp = path.with_extension("yaml.tmp");
    fs::write(&tmp, yaml)
        .await
        .map_err(|e| failed(e.to_string()))?;
    fs::rename(&tmp, path)
        .await
        .map_err(|e| failed(e.to_string()))?;
    Ok(())
}

/// # Errors
///
/// Returns `BuildError::RecordReadFailed` if the file is missing or is not
/// a valid record.
pub async fn read_record(path: &Path) -> Result<BuildRecord, Error> {
    let failed = |message: String| BuildError::RecordReadFailed {
        path: path.display().to_string(),
        message,
    };
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| failed(e.to_string()))?;
    let record = serde_yml::from_str(&content).map_err(|e| failed(e.to_string()))?;
    Ok(record)
}

/// Remove the record at `path`, returning it if it was readable
///
/// A target that fails this run must not keep the record of an earlier one.
///
/// # Errors
///
/// Returns an I/O error if an existing record cannot be removed.
pub async fn take_record(path: &Path) -> Result<Option<BuildRecord>, Error> {
    let previous = read_record(path).await.ok();
    match fs::remove_file(path).await {
        Ok(()) => Ok(previous),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::io_with_path(&e, path)),
    }
}

/// Every file named `file_name` below `root`, sorted
#[must_use]
pub fn find_records(root: &Path, file_name: &str) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file() && e.file_name() == file_name)
        .map(walkdir::DirEntry::into_path)
        .collect();
    found.sort();
    found
}
