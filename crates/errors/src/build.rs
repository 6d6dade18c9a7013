//! Build scheduling error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

/// One failing unit inside an aggregated build or status pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetFailure {
    pub target: String,
    pub message: String,
}

impl TargetFailure {
    #[must_use]
    pub fn new(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            message: message.into(),
        }
    }
}

fn render_failures(failures: &[TargetFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("\n  * {}: {}", f.target, f.message))
        .collect()
}

fn render_list(items: &[String]) -> String {
    if items.is_empty() {
        return " (none)".to_string();
    }
    items.iter().map(|i| format!("\n  * {i}")).collect()
}

fn render_interrupted(items: &[String]) -> String {
    if items.is_empty() {
        return String::new();
    }
    format!("\ninterrupted while running:{}", render_list(items))
}

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum BuildError {
    #[error("could not find target directory {path}")]
    TargetNotFound { path: String },

    #[error("'{path}' could not be built: no descriptor and no build file")]
    NoBuildStrategy { path: String },

    #[error("descriptor error in {path}: {message}")]
    DescriptorInvalid { path: String, message: String },

    #[error("no spec file found in {path}")]
    SpecNotFound { path: String },

    #[error("build procedure failed in {target}: {message}")]
    ProcedureFailed { target: String, message: String },

    #[error("no binary packages generated for {target}")]
    NoArtifacts { target: String },

    #[error("empty artifact '{artifact}' generated for {target}")]
    EmptyArtifact { target: String, artifact: String },

    #[error("fetch of {package} failed: {message}")]
    FetchFailed { package: String, message: String },

    #[error("failed to write build record {path}: {message}")]
    RecordWriteFailed { path: String, message: String },

    #[error("failed to read build record {path}: {message}")]
    RecordReadFailed { path: String, message: String },

    #[error("no build records named {file} found under {root}")]
    NoRecords { root: String, file: String },

    #[error("{operation} failed for {count} target(s):{list}", count = .failures.len(), list = render_failures(.failures))]
    TargetsFailed {
        operation: String,
        failures: Vec<TargetFailure>,
    },

    #[error("the following directories had failures in {task}:{list}{interrupted_list}", list = render_list(.failed), interrupted_list = render_interrupted(.interrupted))]
    HousekeepingFailed {
        task: String,
        failed: Vec<String>,
        interrupted: Vec<String>,
        cancelled: usize,
    },
}

impl UserFacingError for BuildError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::TargetNotFound { .. } => {
                Some("Check the target path or refresh the list of build targets.")
            }
            Self::NoBuildStrategy { .. } | Self::SpecNotFound { .. } => {
                Some("Add a package descriptor or a build file to the target directory.")
            }
            Self::DescriptorInvalid { .. } => {
                Some("Fix the package descriptor so that it declares a name and version.")
            }
            Self::ProcedureFailed { .. } => {
                Some("Run the target's build procedure by hand to inspect its output.")
            }
            Self::NoArtifacts { .. } | Self::EmptyArtifact { .. } => {
                Some("Inspect the target's output directory; the build produced no usable packages.")
            }
            Self::FetchFailed { .. } => {
                Some("Check access to the package index or allow local rebuilds.")
            }
            Self::NoRecords { .. } => Some("Build the release before populating the repository."),
            Self::HousekeepingFailed { .. } => {
                Some("Fix the first failing directory and rerun the sweep.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::FetchFailed { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::TargetNotFound { .. } => "build.target_not_found",
            Self::NoBuildStrategy { .. } => "build.no_build_strategy",
            Self::DescriptorInvalid { .. } => "build.descriptor_invalid",
            Self::SpecNotFound { .. } => "build.spec_not_found",
            Self::ProcedureFailed { .. } => "build.procedure_failed",
            Self::NoArtifacts { .. } => "build.no_artifacts",
            Self::EmptyArtifact { .. } => "build.empty_artifact",
            Self::FetchFailed { .. } => "build.fetch_failed",
            Self::RecordWriteFailed { .. } => "build.record_write_failed",
            Self::RecordReadFailed { .. } => "build.record_read_failed",
            Self::NoRecords { .. } => "build.no_records",
            Self::TargetsFailed { .. } => "build.targets_failed",
            Self::HousekeepingFailed { .. } => "build.housekeeping_failed",
        };
        Some(code)
    }
}
