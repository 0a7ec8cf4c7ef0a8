use thiserror::Error;

/// Failure of one scorer backend call. Non-fatal to the scoring call as a whole.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScorerError {
    /// Transport failure, timeout, or no adapter registered for the provider.
    #[error("backend '{provider}' unreachable: {message}")]
    BackendUnreachable { provider: String, message: String },

    /// The backend answered, but not with a judgment matching the schema.
    #[error("invalid response format from '{model}': {reason}")]
    InvalidResponseFormat { model: String, reason: String },

    /// The backend answered with a non-success status.
    #[error("backend '{provider}' rejected the request ({status}): {message}")]
    BackendRejected {
        provider: String,
        status: u16,
        message: String,
    },
}

impl ScorerError {
    /// Short machine-readable name, used in telemetry metadata.
    pub fn kind(&self) -> &'static str {
        match self {
            ScorerError::BackendUnreachable { .. } => "backend_unreachable",
            ScorerError::InvalidResponseFormat { .. } => "invalid_response_format",
            ScorerError::BackendRejected { .. } => "backend_rejected",
        }
    }
}
