//! LLM-related error types.

use thiserror::Error;

/// Errors that can occur with LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    /// API request failed.
    #[error("API request failed: {0}")]
    ApiRequestFailed(String),

    /// The call could not be recorded to the event log.
    #[error("Failed to record interaction: {0}")]
    Recording(String),
}

/// Result type for LLM operations.
pub type LlmResult<T> = Result<T, LlmError>;
