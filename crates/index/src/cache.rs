//! On-disk copy of the last downloaded index document
//!
//! Reused instead of the remote document when refresh is turned off.

use crate::models::Index;
use relbuild_errors::{Error, StorageError};
use std::path::{Path, PathBuf};
use tokio::fs;

const CACHE_FILE: &str = "index.json";

#[derive(Debug, Clone)]
pub struct IndexCache {
    dir: PathBuf,
}

impl IndexCache {
    #[must_use]
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    #[must_use]
    pub fn index_path(&self) -> PathBuf {
        self.dir.join(CACHE_FILE)
    }

    /// # Errors
    ///
    /// Returns an error if there is no cached document or it does not parse.
    pub async fn load(&self) -> Result<Index, Error> {
        let path = self.index_path();
        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| StorageError::from_io_with_path(&e, &path))?;
        Index::from_json(&content)
    }

    /// Replace the cached document; readers never see a partial file
    ///
    /// # Errors
    ///
    /// Returns an error if the cache directory or file cannot be written.
    pub async fn save(&self, index: &Index) -> Result<(), Error> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| StorageError::from_io_with_path(&e, &self.dir))?;

        let path = self.index_path();
        let staged = path.with_extension("json.tmp");
        fs::write(&staged, index.to_json()?)
            .await
            .map_err(|e| StorageError::from_io_with_path(&e, &staged))?;
        fs::rename(&staged, &path)
            .await
            .map_err(|e| StorageError::from_io_with_path(&e, &path))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn saved_document_is_reloaded() {
        let temp = tempdir().unwrap();
        let cache = IndexCache::new(temp.path().join("nested"));
        assert!(cache.load().await.is_err());

        let mut index = Index::new();
        index.add("foo-1.0.0-1.noarch.rpm", None).unwrap();
        cache.save(&index).await.unwrap();

        assert_eq!(cache.load().await.unwrap().package_count(), 1);
        assert!(!temp.path().join("nested/index.json.tmp").exists());
    }

    #[tokio::test]
    async fn corrupt_document_is_an_error() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join("index.json"), "not json").unwrap();
        assert!(IndexCache::new(temp.path()).load().await.is_err());
    }
}
