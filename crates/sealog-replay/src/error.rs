//! Replay error types.

use sealog_audit::AuditError;
use thiserror::Error;

/// Errors that can occur while loading a replay snapshot.
///
/// Analysis itself never fails; unreadable events are skipped.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// The event store could not be read.
    #[error("failed to load events: {0}")]
    Load(#[from] AuditError),
}

/// Result type for replay operations.
pub type ReplayResult<T> = Result<T, ReplayError>;
