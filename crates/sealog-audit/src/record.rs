//! Event types: the typed in-memory event and the persisted row.

use sealog_core::{EventFields, EventId, SessionId, Timestamp, Value};
use sealog_crypto::{EventDigest, HashEngine};
use serde::{Deserialize, Serialize};

use crate::error::{AuditError, AuditResult};

/// A recorded event.
///
/// Logically immutable once appended; "editing" means appending a new event.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Unique event identifier.
    pub id: EventId,
    /// Session this event belongs to.
    pub session_id: SessionId,
    /// When this event was created.
    pub timestamp: Timestamp,
    /// Open string tag.
    pub event_type: String,
    /// Structured payload (always a map for appended events).
    pub payload: Value,
    /// Keyed hash over the other five fields.
    pub hash: EventDigest,
}

impl Event {
    /// Create and hash a new event stamped with a fresh ID and the current time.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Serialization`] if the payload cannot be
    /// canonicalized.
    pub(crate) fn create(
        engine: &HashEngine,
        session_id: SessionId,
        event_type: String,
        payload: Value,
    ) -> AuditResult<Self> {
        let id = EventId::new();
        let timestamp = Timestamp::now();
        let id_text = id.to_string();
        let session_text = session_id.to_string();
        let hash = engine.hash_event(&EventFields {
            event_id: &id_text,
            session_id: &session_text,
            timestamp: &timestamp,
            event_type: &event_type,
            payload: &payload,
        })?;

        Ok(Self {
            id,
            session_id,
            timestamp,
            event_type,
            payload,
            hash,
        })
    }

    /// Convert to the persisted row shape.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Serialization`] if the payload cannot be
    /// written as JSON.
    pub fn to_record(&self) -> AuditResult<EventRecord> {
        Ok(EventRecord {
            event_id: self.id.to_string(),
            session_id: self.session_id.to_string(),
            timestamp: self.timestamp,
            event_type: self.event_type.clone(),
            payload: self.payload.to_json_string()?,
            hash: self.hash.to_hex(),
        })
    }

    /// Rebuild a typed event from a persisted row.
    ///
    /// This only parses; it does not check the hash. Use
    /// [`IntegrityVerifier`](crate::IntegrityVerifier) for that.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Serialization`] if any field fails to parse.
    pub fn from_record(record: &EventRecord) -> AuditResult<Self> {
        let id = EventId::parse(&record.event_id)
            .map_err(|e| AuditError::Serialization(format!("event_id: {e}")))?;
        let session_id = SessionId::parse(&record.session_id)
            .map_err(|e| AuditError::Serialization(format!("session_id: {e}")))?;
        let hash = EventDigest::from_hex(&record.hash)
            .map_err(|e| AuditError::Serialization(format!("hash: {e}")))?;

        Ok(Self {
            id,
            session_id,
            timestamp: record.timestamp,
            event_type: record.event_type.clone(),
            payload: record.payload_value()?,
            hash,
        })
    }
}

/// A persisted event row: exactly the event fields, payload as JSON text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Event ID (hyphenated UUID).
    pub event_id: String,
    /// Session ID (hyphenated UUID).
    pub session_id: String,
    /// When the event was recorded.
    pub timestamp: Timestamp,
    /// Event type tag.
    pub event_type: String,
    /// Payload serialized as JSON text.
    pub payload: String,
    /// Stored hash, lowercase hex.
    pub hash: String,
}

impl EventRecord {
    /// Re-materialize the payload into structured form.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Serialization`] if the text is not valid JSON.
    pub fn payload_value(&self) -> AuditResult<Value> {
        Ok(Value::from_json_str(&self.payload)?)
    }

    /// The five hashed fields, with `payload` already materialized.
    #[must_use]
    pub fn fields<'a>(&'a self, payload: &'a Value) -> EventFields<'a> {
        EventFields {
            event_id: &self.event_id,
            session_id: &self.session_id,
            timestamp: &self.timestamp,
            event_type: &self.event_type,
            payload,
        }
    }
}

/// A stored line that does not parse as an [`EventRecord`].
///
/// Kept so verification can flag it in place instead of aborting the read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadableRow {
    /// 1-based line number in the backing store.
    pub line: usize,
    /// `event_id`, if the line is a JSON object carrying one as a string.
    pub event_id: Option<String>,
    /// `session_id`, if the line is a JSON object carrying one as a string.
    pub session_id: Option<String>,
    /// The line as stored.
    pub raw: String,
    /// Parser message.
    pub reason: String,
}

impl UnreadableRow {
    /// The recovered event ID, or `line N` when there is none.
    #[must_use]
    pub fn label(&self) -> String {
        self.event_id
            .clone()
            .unwrap_or_else(|| format!("line {}", self.line))
    }
}

/// One row as found in storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredRow {
    /// A well-formed row.
    Record(EventRecord),
    /// A row that could not be parsed.
    Unreadable(UnreadableRow),
}

impl StoredRow {
    /// The session the row claims, as stored.
    #[must_use]
    pub fn session_key(&self) -> Option<&str> {
        match self {
            Self::Record(record) => Some(&record.session_id),
            Self::Unreadable(row) => row.session_id.as_deref(),
        }
    }

    /// The parsed record, if the row is readable.
    #[must_use]
    pub fn record(&self) -> Option<&EventRecord> {
        match self {
            Self::Record(record) => Some(record),
            Self::Unreadable(_) => None,
        }
    }
}

/// Put readable rows in chronological order, followed by unreadable rows in
/// storage order.
#[must_use]
pub fn order_rows(rows: Vec<StoredRow>) -> Vec<StoredRow> {
    let mut records = Vec::new();
    let mut unreadable = Vec::new();
    for row in rows {
        match row {
            StoredRow::Record(record) => records.push(record),
            StoredRow::Unreadable(bad) => unreadable.push(bad),
        }
    }
    sort_chronologically(&mut records);
    records
        .into_iter()
        .map(StoredRow::Record)
        .chain(unreadable.into_iter().map(StoredRow::Unreadable))
        .collect()
}

/// Sort rows ascending by timestamp.
///
/// The sort is stable: rows with equal timestamps keep their storage order,
/// which is the authoritative tie-break.
pub fn sort_chronologically(records: &mut [EventRecord]) {
    records.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
}
