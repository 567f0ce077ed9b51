//! Sealog Audit - Tamper-evident event logging and verification.
//!
//! This crate provides:
//! - The append path ([`EventLog`]): identity, timestamp, keyed hash, persist
//! - Storage collaborators: in-memory and append-only JSON lines, where a
//!   line that fails to parse surfaces as a [`StoredRow::Unreadable`] row
//! - Independent integrity verification ([`IntegrityVerifier`])
//!
//! # Security Model
//!
//! Every event is hashed exactly once, at creation, with HMAC-SHA256 over the
//! canonical form of its five logical fields. The hash is stored next to the
//! row and never recomputed in place. Verification recomputes it from the
//! persisted fields with the same key and compares in constant time, so any
//! edit to a stored row is localized to that row. A Merkle root over the
//! stored hashes fingerprints the log as a whole.
//!
//! # Example
//!
//! ```
//! use sealog_audit::EventLog;
//! use sealog_core::{Map, Value};
//! use sealog_crypto::HashEngine;
//!
//! let log = EventLog::in_memory(HashEngine::generate());
//!
//! let mut payload = Map::new();
//! payload.insert("model", "gpt-4");
//! payload.insert("latency_ms", 250);
//! let event_id = log.append("llm_interaction", Value::Map(payload)).unwrap();
//!
//! let report = log.verify().unwrap();
//! assert!(report.all_valid);
//! assert_eq!(report.results[0].event_id, event_id.to_string());
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod log;
mod record;
mod storage;
mod verify;

pub use error::{AuditError, AuditResult};
pub use log::EventLog;
pub use record::{Event, EventRecord, StoredRow, UnreadableRow, order_rows, sort_chronologically};
pub use storage::{EventStorage, FileEventStorage, MemoryEventStorage};
pub use verify::{
    EventCheck, IntegrityIssue, IntegrityVerifier, UNATTRIBUTED, VerificationReport,
};
