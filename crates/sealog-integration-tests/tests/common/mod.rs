//! Shared fixtures for integration tests.

use std::path::Path;
use std::sync::Arc;

use sealog_audit::{EventRecord, EventStorage, IntegrityVerifier, MemoryEventStorage};
use sealog_core::{EventFields, EventId, LLM_INTERACTION, Map, SessionId, Timestamp, Value};
use sealog_crypto::HashEngine;

/// Builds hashed records at chosen timestamps, as if appended at that time.
#[allow(dead_code)]
pub struct SessionFixture {
    /// Engine used for every record.
    pub engine: Arc<HashEngine>,
    /// Session every record belongs to.
    pub session: SessionId,
    /// Records in push order.
    pub records: Vec<EventRecord>,
}

#[allow(dead_code)]
impl SessionFixture {
    /// Empty fixture with a fresh key and session.
    pub fn new() -> Self {
        Self {
            engine: Arc::new(HashEngine::generate()),
            session: SessionId::new(),
            records: Vec::new(),
        }
    }

    /// Hash and keep one record stamped at `millis` since the epoch.
    pub fn push(&mut self, millis: i64, event_type: &str, payload: Map) -> &EventRecord {
        let event_id = EventId::new().to_string();
        let session_id = self.session.to_string();
        let timestamp = Timestamp::from_unix_millis(millis).expect("timestamp in range");
        let payload = Value::Map(payload);
        let hash = self
            .engine
            .hash_event(&EventFields {
                event_id: &event_id,
                session_id: &session_id,
                timestamp: &timestamp,
                event_type,
                payload: &payload,
            })
            .expect("payload hashes");
        self.records.push(EventRecord {
            event_id,
            session_id,
            timestamp,
            event_type: event_type.to_owned(),
            payload: payload.to_json_string().expect("payload serializes"),
            hash: hash.to_hex(),
        });
        self.records.last().expect("just pushed")
    }

    /// Push an `llm_interaction` with the given latency.
    pub fn interaction(&mut self, millis: i64, latency_ms: f64) -> &EventRecord {
        self.push(millis, LLM_INTERACTION, interaction_payload(latency_ms))
    }

    /// Verifier sharing this fixture's key.
    pub fn verifier(&self) -> IntegrityVerifier {
        IntegrityVerifier::new(Arc::clone(&self.engine))
    }

    /// Copy every record into a fresh in-memory store.
    pub fn to_storage(&self) -> MemoryEventStorage {
        let storage = MemoryEventStorage::new();
        for record in &self.records {
            storage.append_row(record).expect("unique ids");
        }
        storage
    }
}

/// A minimal model-call payload.
#[allow(dead_code)]
pub fn interaction_payload(latency_ms: f64) -> Map {
    let mut usage = Map::new();
    usage.insert("input_tokens", 12_i64);
    usage.insert("output_tokens", 30_i64);

    let mut payload = Map::new();
    payload.insert("model", "test-model");
    payload.insert("messages", vec![Value::from("hello")]);
    payload.insert("response", "hi there");
    payload.insert("usage", usage);
    payload.insert("latency_ms", latency_ms);
    payload
}

/// A payload of a single integer field.
#[allow(dead_code)]
pub fn step(n: i64) -> Value {
    let mut map = Map::new();
    map.insert("step", n);
    Value::Map(map)
}

/// Overwrite one top-level field of a row in a JSON-lines log.
///
/// `line` is 0-based and counts every line of the file.
#[allow(dead_code)]
pub fn rewrite_row_field(path: &Path, line: usize, field: &str, value: serde_json::Value) {
    let text = std::fs::read_to_string(path).expect("log readable");
    let mut rows: Vec<String> = text.lines().map(str::to_owned).collect();
    let mut row: serde_json::Value = serde_json::from_str(&rows[line]).expect("row is JSON");
    row[field] = value;
    rows[line] = row.to_string();
    std::fs::write(path, rows.join("\n") + "\n").expect("log writable");
}
