//! CLI error rendering and exit codes

use std::fmt;

use relbuild_errors::{Error, UserFacingError};

/// Exit status for usage and configuration problems
pub const EXIT_CONFIG: i32 = 2;
/// Exit status for failed operations
pub const EXIT_FAILURE: i32 = 1;

#[derive(Debug)]
pub enum CliError {
    Ops(Error),
    /// Writing the report to stdout failed
    Output(std::io::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Ops(Error::Config(_)) => EXIT_CONFIG,
            _ => EXIT_FAILURE,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Ops(e) => {
                f.write_str(&e.user_message())?;
                if let Some(hint) = e.user_hint() {
                    write!(f, "\n  Hint: {hint}")?;
                }
                if let Some(code) = e.user_code() {
                    write!(f, "\n  Code: {code}")?;
                }
                if e.is_retryable() {
                    f.write_str("\n  Retrying may succeed.")?;
                }
                Ok(())
            }
            CliError::Output(e) => write!(f, "failed to write output: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Ops(e) => Some(e),
            CliError::Output(e) => Some(e),
        }
    }
}

impl From<Error> for CliError {
    fn from(e: Error) -> Self {
        CliError::Ops(e)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Output(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relbuild_errors::{BuildError, ConfigError};

    #[test]
    fn config_problems_exit_with_two() {
        let err = CliError::from(Error::from(ConfigError::RulesNotFound {
            path: "build/rpm/dependencies.yaml".into(),
        }));
        assert_eq!(err.exit_code(), EXIT_CONFIG);
        assert!(err.to_string().contains("Hint:"));
    }

    #[test]
    fn build_failures_exit_with_one() {
        let err = CliError::from(Error::from(BuildError::NoArtifacts {
            target: "src/assets/foo".into(),
        }));
        assert_eq!(err.exit_code(), EXIT_FAILURE);
        assert!(err.to_string().starts_with("no binary packages generated for src/assets/foo"));
    }
}
