//! Operation orchestration error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum OpsError {
    #[error("no build targets found under {root}")]
    NoTargets { root: String },

    #[error("package index required but unavailable: {message}")]
    IndexRequired { message: String },

    #[error("missing component: {component}")]
    MissingComponent { component: String },

    #[error("serialization error: {message}")]
    SerializationError { message: String },
}

impl UserFacingError for OpsError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::NoTargets { .. } => {
                Some("Run the command from the release tree root or pass target paths explicitly.")
            }
            Self::IndexRequired { .. } => Some(
                "Configure a reachable package index or set the fetch mode to `preferred`.",
            ),
            _ => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::NoTargets { .. } => "ops.no_targets",
            Self::IndexRequired { .. } => "ops.index_required",
            Self::MissingComponent { .. } => "ops.missing_component",
            Self::SerializationError { .. } => "ops.serialization_error",
        };
        Some(code)
    }
}
