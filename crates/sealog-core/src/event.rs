//! The logical fields of an event.

use crate::types::Timestamp;
use crate::value::Value;

/// Event type recognized by timeline and metrics analysis.
pub const LLM_INTERACTION: &str = "llm_interaction";

/// Borrowed view of the five fields covered by an event's hash.
///
/// The hash itself is deliberately absent: it is computed over these
/// fields and stored alongside them, never inside them.
#[derive(Debug, Clone, Copy)]
pub struct EventFields<'a> {
    /// Unique event identifier, as persisted.
    pub event_id: &'a str,
    /// Session the event belongs to, as persisted.
    pub session_id: &'a str,
    /// When the event was recorded.
    pub timestamp: &'a Timestamp,
    /// Open string tag.
    pub event_type: &'a str,
    /// Structured payload.
    pub payload: &'a Value,
}
