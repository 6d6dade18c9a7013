//! Signing error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

fn render_failed(failed: &[String]) -> String {
    failed.iter().map(|f| format!("\n  {f}")).collect()
}

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum SigningError {
    #[error("signing key directory not found: {path}")]
    KeyNotFound { path: String },

    #[error("invalid signing key in {path}: {message}")]
    InvalidKey { path: String, message: String },

    #[error("artifact directory not found: {path}")]
    ArtifactRootNotFound { path: String },

    #[error("failed to sign {artifact}: {message}")]
    SigningFailed { artifact: String, message: String },

    #[error("signing {artifact} timed out after {seconds} seconds")]
    Timeout { artifact: String, seconds: u64 },

    #[error("failed to sign all {attempted} artifact(s) in {root}")]
    TotalFailure { root: String, attempted: usize },

    #[error("failed to sign some artifacts in {root}:{list}", list = render_failed(.failed))]
    PartialFailure { root: String, failed: Vec<String> },
}

impl UserFacingError for SigningError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::KeyNotFound { .. } | Self::InvalidKey { .. } => {
                Some("Prepare the signing key directory before signing artifacts.")
            }
            Self::TotalFailure { .. } => {
                Some("Every artifact failed; verify the signing key and its credentials.")
            }
            Self::PartialFailure { .. } => {
                Some("Some artifacts failed; inspect the listed files for corruption and re-sign them.")
            }
            Self::Timeout { .. } => Some("Increase the per-item signing timeout and retry."),
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::PartialFailure { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::KeyNotFound { .. } => "signing.key_not_found",
            Self::InvalidKey { .. } => "signing.invalid_key",
            Self::ArtifactRootNotFound { .. } => "signing.artifact_root_not_found",
            Self::SigningFailed { .. } => "signing.failed",
            Self::Timeout { .. } => "signing.timeout",
            Self::TotalFailure { .. } => "signing.total_failure",
            Self::PartialFailure { .. } => "signing.partial_failure",
        };
        Some(code)
    }
}
