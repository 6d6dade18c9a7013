//! Filesystem error types for the release tree and artifact repository

use std::borrow::Cow;
use std::path::Path;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("permission denied: {path}")]
    PermissionDenied { path: String },

    #[error("path not found: {path}")]
    PathNotFound { path: String },

    #[error("invalid path: {path}")]
    InvalidPath { path: String },

    #[error("IO error: {message}")]
    IoError { message: String },
}

impl StorageError {
    /// Classify an `io::Error` raised on `path`
    #[must_use]
    pub fn from_io_with_path(err: &std::io::Error, path: &Path) -> Self {
        let shown = path.display().to_string();
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path: shown },
            std::io::ErrorKind::NotFound => Self::PathNotFound { path: shown },
            _ => Self::IoError {
                message: format!("{shown}: {err}"),
            },
        }
    }
}

impl UserFacingError for StorageError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::PermissionDenied { .. } => {
                Some("Adjust permissions on the release tree and retry.")
            }
            Self::InvalidPath { .. } => Some("Artifact paths must stay inside their target."),
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::IoError { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::PermissionDenied { .. } => "storage.permission_denied",
            Self::PathNotFound { .. } => "storage.path_not_found",
            Self::InvalidPath { .. } => "storage.invalid_path",
            Self::IoError { .. } => "storage.io_error",
        };
        Some(code)
    }
}
