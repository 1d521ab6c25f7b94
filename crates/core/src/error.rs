//! Error types for the Handback domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each collaborator of the loop has its own error enum; the top-level
//! [`Error`] is what `invoke` surfaces to callers.

use thiserror::Error;

/// The top-level error type for all Handback operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Resolution errors (raised before any network call) ---
    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    #[error("Action group not found: {action_group} (referenced by agent '{agent}')")]
    ActionGroupNotFound { agent: String, action_group: String },

    // --- Function errors (fatal only when no error handler is configured) ---
    #[error("Function invocation failed: {0}")]
    Function(#[from] FunctionError),

    // --- Transport errors ---
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    // --- Remote service broke the return-control protocol ---
    #[error("Protocol violation: {0}")]
    Protocol(String),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Turn limit of {limit} exceeded in session {session_id}")]
    TurnLimitExceeded { limit: u32, session_id: String },

    #[error("Invocation timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },
}

impl Error {
    /// Whether this is an agent or action-group resolution failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::AgentNotFound(_) | Self::ActionGroupNotFound { .. })
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Collaborator errors ---

#[derive(Debug, Clone, Error)]
pub enum FunctionError {
    #[error("Function not found: {action_group}/{function}")]
    NotFound {
        action_group: String,
        function: String,
    },

    #[error("Invalid function arguments: {0}")]
    InvalidArguments(String),

    #[error("Function execution failed: {function}: {reason}")]
    ExecutionFailed { function: String, reason: String },
}

#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by agent service, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Invalid stream event: {0}")]
    InvalidEvent(String),

    #[error("Agent service reported an error: {0}")]
    ServiceError(String),

    #[error("Agent client not configured: {0}")]
    NotConfigured(String),
}
