//! Decision records extracted from `llm_interaction` events.

use sealog_audit::EventRecord;
use sealog_core::{Map, Timestamp, Value};
use serde::Serialize;
use tracing::warn;

/// One model call, reduced to the fields replay cares about.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    /// ID of the source event.
    pub event_id: String,
    /// When the call was recorded.
    pub timestamp: Timestamp,
    /// Model identifier, `"unknown"` when absent.
    pub model: String,
    /// Token usage structure as recorded, empty when absent.
    pub token_usage: Map,
    /// Observed latency, 0 when absent.
    pub latency_ms: f64,
    /// Number of input messages, 0 when absent or not a list.
    pub message_count: usize,
    /// Length of the response in characters, 0 when absent.
    pub response_length: usize,
}

impl Decision {
    /// Extract a decision from a stored row.
    ///
    /// Returns `None` when the payload cannot be parsed; the row is logged
    /// and skipped.
    pub(crate) fn from_record(record: &EventRecord) -> Option<Self> {
        let payload = match record.payload_value() {
            Ok(payload) => payload,
            Err(e) => {
                warn!(event_id = %record.event_id, error = %e, "Skipping unreadable interaction");
                return None;
            },
        };

        Some(Self {
            event_id: record.event_id.clone(),
            timestamp: record.timestamp,
            model: payload
                .get("model")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string(),
            token_usage: payload
                .get("usage")
                .and_then(Value::as_map)
                .cloned()
                .unwrap_or_default(),
            latency_ms: payload
                .get("latency_ms")
                .and_then(Value::as_f64)
                .unwrap_or(0.0),
            message_count: payload
                .get("messages")
                .and_then(Value::as_list)
                .map_or(0, <[Value]>::len),
            response_length: payload.get("response").map_or(0, response_length),
        })
    }
}

/// Character length of a response: the string itself, or its JSON text.
fn response_length(response: &Value) -> usize {
    match response {
        Value::Null => 0,
        Value::String(s) => s.chars().count(),
        other => other
            .to_json_string()
            .map_or(0, |text| text.chars().count()),
    }
}
