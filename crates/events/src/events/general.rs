use serde::{Deserialize, Serialize};

use super::FailureContext;

/// Operation boundaries and free-form diagnostics
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeneralEvent {
    /// Degraded but not failed, such as a fallback to a local build
    Warning { message: String },

    DebugLog { message: String },

    OperationStarted { operation: String },

    OperationCompleted { operation: String, success: bool },

    OperationFailed {
        operation: String,
        failure: FailureContext,
    },
}
