//! Prelude module - commonly used types for convenient import.
//!
//! Use `use sealog_audit::prelude::*;` to import all essential types.

// Errors
pub use crate::{AuditError, AuditResult};

// Records
pub use crate::{Event, EventRecord, StoredRow, UnreadableRow, order_rows, sort_chronologically};

// Log and verification
pub use crate::{EventCheck, EventLog, IntegrityIssue, IntegrityVerifier, VerificationReport};

// Storage
pub use crate::{EventStorage, FileEventStorage, MemoryEventStorage};
