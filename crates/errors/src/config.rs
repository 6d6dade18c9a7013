//! Configuration and dependency-rules error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    NotFound { path: String },

    #[error("parse error: {message}")]
    ParseError { message: String },

    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("dependency rules file not found: {path}")]
    RulesNotFound { path: String },

    #[error("invalid dependency rules in {path}: {message}")]
    RulesInvalid { path: String, message: String },
}

impl UserFacingError for ConfigError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        Some(match self {
            Self::NotFound { .. } => {
                "Provide a configuration file or pass `--config` with an explicit path."
            }
            Self::ParseError { .. } | Self::InvalidValue { .. } => {
                "Fix the configuration value and retry the command."
            }
            Self::RulesNotFound { .. } => {
                "Create the dependency rules file; populating the artifact repository requires it."
            }
            Self::RulesInvalid { .. } => "Fix the YAML syntax of the dependency rules file.",
        })
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::NotFound { .. } => "config.not_found",
            Self::ParseError { .. } => "config.parse_error",
            Self::InvalidValue { .. } => "config.invalid_value",
            Self::RulesNotFound { .. } => "config.rules_not_found",
            Self::RulesInvalid { .. } => "config.rules_invalid",
        })
    }
}
