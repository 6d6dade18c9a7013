//! Signing key directory

use relbuild_errors::{Error, SigningError};
use std::path::{Path, PathBuf};

/// A validated key directory holding one secret and one public key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningKey {
    pub dir: PathBuf,
    pub secret_key: PathBuf,
    pub public_key: PathBuf,
}

impl SigningKey {
    /// Validate `dir` and pick its `*.key` and `*.pub` files
    ///
    /// When several candidates exist the first in name order is used.
    ///
    /// # Errors
    ///
    /// Returns `SigningError::KeyNotFound` if the directory is missing and
    /// `SigningError::InvalidKey` if either key file is absent.
    pub fn load(dir: &Path) -> Result<Self, Error> {
        if !dir.is_dir() {
            return Err(SigningError::KeyNotFound {
                path: dir.display().to_string(),
            }
            .into());
        }

        let mut entries = std::fs::read_dir(dir)
            .map_err(|e| Error::io_with_path(&e, dir))?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect::<Vec<_>>();
        entries.sort();

        let find = |ext: &str| {
            entries
                .iter()
                .find(|p| p.extension().is_some_and(|e| e == ext))
                .cloned()
        };

        let secret_key = find("key").ok_or_else(|| SigningError::InvalidKey {
            path: dir.display().to_string(),
            message: "no secret key (*.key)".to_string(),
        })?;
        let public_key = find("pub").ok_or_else(|| SigningError::InvalidKey {
            path: dir.display().to_string(),
            message: "no public key (*.pub)".to_string(),
        })?;

        Ok(Self {
            dir: dir.to_path_buf(),
            secret_key,
            public_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_directory_is_key_not_found() {
        let temp = tempdir().unwrap();
        let err = SigningKey::load(&temp.path().join("absent")).unwrap_err();
        assert!(matches!(err, Error::Signing(SigningError::KeyNotFound { .. })));
    }

    #[test]
    fn both_halves_are_required() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join("release.key"), "sk").unwrap();
        let err = SigningKey::load(temp.path()).unwrap_err();
        assert!(matches!(err, Error::Signing(SigningError::InvalidKey { .. })));

        std::fs::write(temp.path().join("release.pub"), "pk").unwrap();
        let key = SigningKey::load(temp.path()).unwrap();
        assert_eq!(key.secret_key, temp.path().join("release.key"));
        assert_eq!(key.public_key, temp.path().join("release.pub"));
    }
}
