use serde::{Deserialize, Serialize};

use relbuild_errors::UserFacingError;

/// Structured failure information shared across domains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureContext {
    /// Stable error code, when the error carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Short user-facing message.
    pub message: String,
    /// Optional remediation hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether retrying the operation might succeed.
    pub retryable: bool,
}

impl FailureContext {
    /// Construct a new failure context.
    #[must_use]
    pub fn new(
        code: Option<impl Into<String>>,
        message: impl Into<String>,
        hint: Option<impl Into<String>>,
        retryable: bool,
    ) -> Self {
        Self {
            code: code.map(Into::into),
            message: message.into(),
            hint: hint.map(Into::into),
            retryable,
        }
    }

    /// Build failure context from a `UserFacingError` implementation.
    #[must_use]
    pub fn from_error<E: UserFacingError + ?Sized>(error: &E) -> Self {
        Self::new(
            error.user_code(),
            error.user_message().into_owned(),
            error.user_hint(),
            error.is_retryable(),
        )
    }
}

pub mod build;
pub mod decision;
pub mod general;
pub mod housekeeping;
pub mod index;
pub mod repository;
pub mod signing;

pub use build::*;
pub use decision::*;
pub use general::*;
pub use housekeeping::*;
pub use index::*;
pub use repository::*;
pub use signing::*;

/// Every event a library crate can emit, grouped by domain
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum AppEvent {
    /// Operation boundaries, warnings and debug output
    General(GeneralEvent),

    /// Rebuild decisions and tag advisories
    Decision(DecisionEvent),

    /// Target builds and build records
    Build(BuildEvent),

    /// Index lookups and downloads
    Index(IndexEvent),

    Signing(SigningEvent),

    /// Clean and clobber sweeps
    Housekeeping(HousekeepingEvent),

    Repository(RepositoryEvent),
}

impl AppEvent {
    /// Level the CLI logs this event at
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        use tracing::Level;

        match self {
            // Error-level events
            Self::General(GeneralEvent::OperationFailed { .. })
            | Self::Build(BuildEvent::TargetFailed { .. })
            | Self::Signing(SigningEvent::ArtifactFailed { .. })
            | Self::Housekeeping(HousekeepingEvent::DirectoryFailed { .. }) => Level::ERROR,

            // Warning-level events
            Self::General(GeneralEvent::Warning { .. })
            | Self::Decision(
                DecisionEvent::LookupFailed { .. } | DecisionEvent::IndexUnavailable { .. },
            )
            | Self::Build(BuildEvent::RecoveryAttempted { .. })
            | Self::Index(IndexEvent::FetchRetry { .. } | IndexEvent::FetchFailed { .. })
            | Self::Housekeeping(HousekeepingEvent::Cancelled { .. }) => Level::WARN,

            Self::Decision(DecisionEvent::TagChecked { advisory, .. }) => {
                if advisory.is_tag_owed() {
                    Level::INFO
                } else {
                    Level::DEBUG
                }
            }

            // Debug-level events (per-item progress, internal state)
            Self::General(GeneralEvent::DebugLog { .. })
            | Self::Decision(DecisionEvent::Details { .. } | DecisionEvent::Decided { .. })
            | Self::Build(
                BuildEvent::ProcedureStarted { .. }
                | BuildEvent::BuildMetadataWritten { .. }
                | BuildEvent::RecordWritten { .. },
            )
            | Self::Index(IndexEvent::FetchSkipped { .. } | IndexEvent::Loaded { .. })
            | Self::Signing(SigningEvent::ArtifactSigned { .. } | SigningEvent::ArtifactSkipped { .. })
            | Self::Housekeeping(HousekeepingEvent::DirectoryCompleted { .. })
            | Self::Repository(
                RepositoryEvent::ArtifactCopied { .. }
                | RepositoryEvent::SourceSkipped { .. }
                | RepositoryEvent::RecordLoaded { .. },
            ) => Level::DEBUG,

            // Default to INFO for most events
            _ => Level::INFO,
        }
    }

    /// `relbuild::events::<domain>`
    #[must_use]
    pub fn log_target(&self) -> &'static str {
        match self {
            Self::General(_) => "relbuild::events::general",
            Self::Decision(_) => "relbuild::events::decision",
            Self::Build(_) => "relbuild::events::build",
            Self::Index(_) => "relbuild::events::index",
            Self::Signing(_) => "relbuild::events::signing",
            Self::Housekeeping(_) => "relbuild::events::housekeeping",
            Self::Repository(_) => "relbuild::events::repository",
        }
    }
}
