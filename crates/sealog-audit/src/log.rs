//! Event log - main interface for recording events.
//!
//! Provides a high-level API for appending events and verifying a session.

use sealog_core::{EventId, SessionId, Value};
use sealog_crypto::HashEngine;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, error};

use crate::error::{AuditError, AuditResult};
use crate::record::{Event, EventRecord, sort_chronologically};
use crate::storage::{EventStorage, FileEventStorage, MemoryEventStorage};
use crate::verify::{IntegrityVerifier, VerificationReport};

/// Append-only event log bound to one session.
///
/// Appends on one instance are serialized; concurrent callers never observe
/// a half-written event. Several logs may share one storage backend.
pub struct EventLog {
    /// Storage backend.
    storage: Arc<dyn EventStorage>,
    /// Keyed hashing engine.
    engine: Arc<HashEngine>,
    /// Session every appended event belongs to.
    session_id: SessionId,
    /// Serializes the create-hash-persist sequence.
    append_lock: Mutex<()>,
}

impl EventLog {
    /// Create a log over an existing storage backend.
    #[must_use]
    pub fn new(
        storage: Arc<dyn EventStorage>,
        engine: Arc<HashEngine>,
        session_id: SessionId,
    ) -> Self {
        Self {
            storage,
            engine,
            session_id,
            append_lock: Mutex::new(()),
        }
    }

    /// Create an in-memory log with a fresh session (for testing).
    #[must_use]
    pub fn in_memory(engine: HashEngine) -> Self {
        Self::new(
            Arc::new(MemoryEventStorage::new()),
            Arc::new(engine),
            SessionId::new(),
        )
    }

    /// Create a log persisted to a JSON-lines file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn open(
        path: impl AsRef<Path>,
        engine: Arc<HashEngine>,
        session_id: SessionId,
    ) -> AuditResult<Self> {
        let storage = FileEventStorage::open(path)?;
        Ok(Self::new(Arc::new(storage), engine, session_id))
    }

    /// The session this log appends to.
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// The hashing engine.
    #[must_use]
    pub fn engine(&self) -> &Arc<HashEngine> {
        &self.engine
    }

    /// The storage backend.
    #[must_use]
    pub fn storage(&self) -> &Arc<dyn EventStorage> {
        &self.storage
    }

    /// Append a new event and return its ID.
    ///
    /// The event is stamped, hashed once, and persisted as a single row.
    /// Nothing is written if any step fails.
    ///
    /// # Errors
    ///
    /// - [`AuditError::Validation`] if `event_type` is blank or `payload` is
    ///   not a map
    /// - [`AuditError::Serialization`] if the payload has no canonical form
    /// - [`AuditError::Storage`] if the row cannot be persisted
    pub fn append(&self, event_type: &str, payload: Value) -> AuditResult<EventId> {
        if event_type.trim().is_empty() {
            return Err(AuditError::Validation(
                "event type must not be empty".to_string(),
            ));
        }
        if !matches!(payload, Value::Map(_)) {
            return Err(AuditError::Validation(format!(
                "payload must be a map, got {}",
                payload.type_name()
            )));
        }

        let _guard = self
            .append_lock
            .lock()
            .map_err(|e| AuditError::Storage(e.to_string()))?;

        let event = Event::create(
            &self.engine,
            self.session_id.clone(),
            event_type.to_string(),
            payload,
        )?;
        let record = event.to_record()?;

        if let Err(e) = self.storage.append_row(&record) {
            error!(
                event_id = %event.id,
                session_id = %self.session_id,
                error = %e,
                "Failed to persist event"
            );
            return Err(e);
        }

        debug!(
            event_id = %event.id,
            session_id = %self.session_id,
            event_type = %event.event_type,
            "Appended event"
        );

        Ok(event.id)
    }

    /// All events of this session, chronologically ordered.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails.
    pub fn events(&self) -> AuditResult<Vec<EventRecord>> {
        let mut events = self.storage.fetch_by_session(&self.session_id)?;
        sort_chronologically(&mut events);
        Ok(events)
    }

    /// Get an event by ID (from any session sharing this storage).
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails.
    pub fn get(&self, id: &EventId) -> AuditResult<Option<EventRecord>> {
        self.storage.get(id)
    }

    /// Verify this session with the log's own key.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails.
    pub fn verify(&self) -> AuditResult<VerificationReport> {
        IntegrityVerifier::new(Arc::clone(&self.engine))
            .verify_session(self.storage.as_ref(), &self.session_id)
    }
}

impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLog")
            .field("session_id", &self.session_id)
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}
