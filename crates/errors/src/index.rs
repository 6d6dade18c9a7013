//! Package index error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum IndexError {
    #[error("package index unavailable: {message}")]
    Unavailable { message: String },

    #[error("connection timeout to {url}")]
    Timeout { url: String },

    #[error("connection failed: {message}")]
    Connection { message: String },

    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    #[error("access denied by {url}")]
    Unauthorized { url: String },

    #[error("package not found in index: {package}")]
    NotFound { package: String },

    #[error("invalid index response: {message}")]
    InvalidResponse { message: String },

    #[error("invalid remote package identifier: {identifier}")]
    InvalidIdentifier { identifier: String },

    #[error("download of {package} failed after {attempts} attempt(s): {message}")]
    DownloadFailed {
        package: String,
        attempts: u32,
        message: String,
    },
}

impl IndexError {
    /// Whether a retry could plausibly succeed.
    ///
    /// Only transient failures consume retry budget; authentication or
    /// lookup failures are returned immediately.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Connection { .. } => true,
            Self::Http { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

impl UserFacingError for IndexError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::Unavailable { .. } => {
                Some("Check the index URL in the configuration; targets will be built locally.")
            }
            Self::Timeout { .. } | Self::Connection { .. } => {
                Some("Check network connectivity to the package index and retry.")
            }
            Self::Unauthorized { .. } => Some("Check the credentials used for the package index."),
            Self::DownloadFailed { .. } => {
                Some("Raise the download retry count or build the package locally.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        self.is_transient()
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::Unavailable { .. } => "index.unavailable",
            Self::Timeout { .. } => "index.timeout",
            Self::Connection { .. } => "index.connection",
            Self::Http { .. } => "index.http",
            Self::Unauthorized { .. } => "index.unauthorized",
            Self::NotFound { .. } => "index.not_found",
            Self::InvalidResponse { .. } => "index.invalid_response",
            Self::InvalidIdentifier { .. } => "index.invalid_identifier",
            Self::DownloadFailed { .. } => "index.download_failed",
        };
        Some(code)
    }
}
