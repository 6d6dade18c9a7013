//! Version and tag parsing errors

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum VersionError {
    #[error("invalid version: {input}")]
    InvalidVersion { input: String },

    #[error("tag '{tag}' does not contain a comparable version")]
    InvalidTag { tag: String },
}

impl UserFacingError for VersionError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidVersion { .. } => {
                Some("Use versions like 1.2.3 in package descriptors and spec files.")
            }
            Self::InvalidTag { .. } => {
                Some("Add the tag prefix to `[tags] legacy_prefixes` if it is a known release tag.")
            }
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::InvalidVersion { .. } => "version.invalid_version",
            Self::InvalidTag { .. } => "version.invalid_tag",
        })
    }
}
