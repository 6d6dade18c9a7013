#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Error types for relbuild
//!
//! One error enum per domain, folded into [`Error`] at crate boundaries.
//! Every type is `Clone`: a build pass collects failures from concurrent
//! workers and reports them together.

use std::borrow::Cow;
use std::path::PathBuf;

use thiserror::Error;

pub mod build;
pub mod config;
pub mod index;
pub mod ops;
pub mod signing;
pub mod storage;
pub mod version;

pub use build::{BuildError, TargetFailure};
pub use config::ConfigError;
pub use index::IndexError;
pub use ops::OpsError;
pub use signing::SigningError;
pub use storage::StorageError;
pub use version::VersionError;

/// Error crossing crate boundaries
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("index error: {0}")]
    Index(#[from] IndexError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("version error: {0}")]
    Version(#[from] VersionError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("build error: {0}")]
    Build(#[from] BuildError),

    #[error("signing error: {0}")]
    Signing(#[from] SigningError),

    #[error("ops error: {0}")]
    Ops(#[from] OpsError),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("I/O error: {message}")]
    Io {
        kind: std::io::ErrorKind,
        message: String,
        path: Option<PathBuf>,
    },
}

impl Error {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// I/O failure on a known file; the path becomes part of the message
    pub fn io_with_path(err: &std::io::Error, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self::Io {
            kind: err.kind(),
            message: format!("{}: {err}", path.display()),
            path: Some(path),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
            path: None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// What the CLI shows for an error: message, optional hint and code
pub trait UserFacingError {
    fn user_message(&self) -> Cow<'_, str>;

    fn user_hint(&self) -> Option<&'static str> {
        None
    }

    /// Rerunning the same operation may succeed
    fn is_retryable(&self) -> bool {
        false
    }

    /// Stable dotted code such as `build.no_artifacts`
    fn user_code(&self) -> Option<&'static str> {
        None
    }
}

impl UserFacingError for Error {
    fn user_message(&self) -> Cow<'_, str> {
        match self {
            Error::Build(err) => err.user_message(),
            Error::Signing(err) => err.user_message(),
            Error::Io { message, .. } => Cow::Borrowed(message),
            _ => Cow::Owned(self.to_string()),
        }
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Error::Index(err) => err.user_hint(),
            Error::Build(err) => err.user_hint(),
            Error::Signing(err) => err.user_hint(),
            Error::Ops(err) => err.user_hint(),
            Error::Config(err) => err.user_hint(),
            Error::Storage(err) => err.user_hint(),
            Error::Version(err) => err.user_hint(),
            Error::Internal(_) | Error::Io { .. } => None,
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            Error::Index(err) => err.is_retryable(),
            Error::Build(err) => err.is_retryable(),
            Error::Signing(err) => err.is_retryable(),
            Error::Storage(err) => err.is_retryable(),
            _ => false,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        match self {
            Error::Index(err) => err.user_code(),
            Error::Storage(err) => err.user_code(),
            Error::Version(err) => err.user_code(),
            Error::Config(err) => err.user_code(),
            Error::Build(err) => err.user_code(),
            Error::Signing(err) => err.user_code(),
            Error::Ops(err) => err.user_code(),
            Error::Internal(_) => Some("error.internal"),
            Error::Io { .. } => Some("error.io"),
        }
    }
}
