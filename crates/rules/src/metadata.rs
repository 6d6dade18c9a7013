//! Build metadata files generated before a module build

use crate::PackageRules;
use relbuild_config::constants::{METADATA_DIR, RELEASE_FILE, REQUIRES_FILE};
use relbuild_errors::{Error, StorageError};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Files written by [`write_build_metadata`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildMetadataFiles {
    pub requires: PathBuf,
    /// Present only when a release override exists
    pub release: Option<PathBuf>,
}

/// Write `<spec_dir>/rpm_metadata/requires` and, when the rules override the
/// release, `<spec_dir>/rpm_metadata/release`
///
/// The requires file is always written, empty when there are no rules. A
/// stale release file is removed when the override no longer exists.
///
/// # Errors
///
/// Returns a `StorageError` if the directory or files cannot be written.
pub async fn write_build_metadata(
    spec_dir: &Path,
    rules: Option<&PackageRules>,
) -> Result<BuildMetadataFiles, Error> {
    let dir = spec_dir.join(METADATA_DIR);
    fs::create_dir_all(&dir)
        .await
        .map_err(|e| StorageError::from_io_with_path(&e, &dir))?;

    let mut requires = String::new();
    if let Some(rules) = rules {
        for entry in &rules.requires {
            let _ = writeln!(requires, "Requires: {entry}");
        }
        for entry in &rules.obsoletes {
            let _ = writeln!(requires, "Obsoletes: {entry}");
        }
    }

    let requires_path = dir.join(REQUIRES_FILE);
    fs::write(&requires_path, requires)
        .await
        .map_err(|e| StorageError::from_io_with_path(&e, &requires_path))?;

    let release_path = dir.join(RELEASE_FILE);
    let release = match rules.and_then(|r| r.release.as_deref()) {
        Some(release) => {
            fs::write(&release_path, format!("{release}\n"))
                .await
                .map_err(|e| StorageError::from_io_with_path(&e, &release_path))?;
            Some(release_path)
        }
        None => {
            let _ = fs::remove_file(&release_path).await;
            None
        }
    };

    Ok(BuildMetadataFiles {
        requires: requires_path,
        release,
    })
}
