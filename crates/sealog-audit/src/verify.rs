//! Independent integrity verification of stored events.
//!
//! Each row is checked on its own: the payload is re-materialized from its
//! stored text, the hash is recomputed with the verifier's key, and the
//! result is compared in constant time against the stored hash. One bad row
//! never hides the state of the others, and a row that cannot be parsed at
//! all is reported as a failed check rather than aborting the pass.

use sealog_core::SessionId;
use sealog_crypto::{EventDigest, HashEngine, merkle_root};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::AuditResult;
use crate::record::{EventRecord, StoredRow, order_rows};
use crate::storage::EventStorage;

/// Why an event failed verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegrityIssue {
    /// The stored row itself could not be parsed.
    RowUnreadable {
        /// Parser message.
        reason: String,
    },
    /// Stored payload text could not be parsed.
    PayloadUnreadable {
        /// Parser message.
        reason: String,
    },
    /// The payload parsed but has no canonical form.
    NotCanonicalizable {
        /// Canonicalizer message.
        reason: String,
    },
    /// The stored hash is not 64 hex characters.
    MalformedHash,
    /// The recomputed hash differs from the stored one.
    HashMismatch,
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RowUnreadable { reason } => write!(f, "row unreadable: {reason}"),
            Self::PayloadUnreadable { reason } => write!(f, "payload unreadable: {reason}"),
            Self::NotCanonicalizable { reason } => write!(f, "payload not canonicalizable: {reason}"),
            Self::MalformedHash => write!(f, "stored hash is malformed"),
            Self::HashMismatch => write!(f, "hash mismatch"),
        }
    }
}

/// Outcome of checking one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCheck {
    /// The event's stored ID.
    pub event_id: String,
    /// Whether the stored hash matches.
    pub valid: bool,
    /// Set when `valid` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue: Option<IntegrityIssue>,
}

/// Outcome of verifying a batch of events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    /// True iff every event verified (vacuously true when empty).
    pub all_valid: bool,
    /// Number of events checked.
    pub total_events: usize,
    /// Events whose hash matched.
    pub valid_count: usize,
    /// Events that failed for any reason.
    pub invalid_count: usize,
    /// Merkle root over the stored hashes in input order.
    pub merkle_root: EventDigest,
    /// Per-event results, in input order.
    pub results: Vec<EventCheck>,
}

impl VerificationReport {
    /// Results for events that failed.
    pub fn failures(&self) -> impl Iterator<Item = &EventCheck> {
        self.results.iter().filter(|r| !r.valid)
    }
}

/// Recomputes and checks event hashes.
#[derive(Debug, Clone)]
pub struct IntegrityVerifier {
    engine: Arc<HashEngine>,
}

impl IntegrityVerifier {
    /// Create a verifier that checks with `engine`'s key.
    #[must_use]
    pub fn new(engine: Arc<HashEngine>) -> Self {
        Self { engine }
    }

    /// Check one stored row.
    #[must_use]
    pub fn verify_event(&self, record: &EventRecord) -> EventCheck {
        let issue = self.find_issue(record);
        if let Some(issue) = &issue {
            warn!(event_id = %record.event_id, issue = %issue, "Event failed verification");
        }
        EventCheck {
            event_id: record.event_id.clone(),
            valid: issue.is_none(),
            issue,
        }
    }

    fn find_issue(&self, record: &EventRecord) -> Option<IntegrityIssue> {
        let payload = match record.payload_value() {
            Ok(payload) => payload,
            Err(e) => {
                return Some(IntegrityIssue::PayloadUnreadable {
                    reason: e.to_string(),
                });
            },
        };

        let Ok(stored) = EventDigest::from_hex(&record.hash) else {
            return Some(IntegrityIssue::MalformedHash);
        };

        match self.engine.verify_digest(&record.fields(&payload), &stored) {
            Ok(true) => None,
            Ok(false) => Some(IntegrityIssue::HashMismatch),
            Err(e) => Some(IntegrityIssue::NotCanonicalizable {
                reason: e.to_string(),
            }),
        }
    }

    /// Verify `events` in the given order.
    ///
    /// Never fails: every problem is reported per event. The Merkle root
    /// covers the stored hashes in input order; a hash that is not valid
    /// hex contributes the SHA-256 of its raw text instead.
    #[must_use]
    pub fn verify(&self, events: &[EventRecord]) -> VerificationReport {
        let results: Vec<EventCheck> = events.iter().map(|r| self.verify_event(r)).collect();
        let leaves: Vec<EventDigest> = events.iter().map(|r| stored_leaf(&r.hash)).collect();
        Self::report(results, &leaves)
    }

    /// Verify stored rows in the given order.
    ///
    /// Readable rows are checked as in [`verify`](Self::verify). An
    /// unreadable row fails with [`IntegrityIssue::RowUnreadable`] and
    /// contributes the SHA-256 of its raw line to the Merkle root.
    #[must_use]
    pub fn verify_rows(&self, rows: &[StoredRow]) -> VerificationReport {
        let mut results = Vec::with_capacity(rows.len());
        let mut leaves = Vec::with_capacity(rows.len());
        for row in rows {
            match row {
                StoredRow::Record(record) => {
                    results.push(self.verify_event(record));
                    leaves.push(stored_leaf(&record.hash));
                },
                StoredRow::Unreadable(bad) => {
                    warn!(
                        line = bad.line,
                        reason = %bad.reason,
                        "Unreadable row failed verification"
                    );
                    results.push(EventCheck {
                        event_id: bad.label(),
                        valid: false,
                        issue: Some(IntegrityIssue::RowUnreadable {
                            reason: bad.reason.clone(),
                        }),
                    });
                    leaves.push(EventDigest::hash(bad.raw.as_bytes()));
                },
            }
        }
        Self::report(results, &leaves)
    }

    fn report(results: Vec<EventCheck>, leaves: &[EventDigest]) -> VerificationReport {
        let valid_count = results.iter().filter(|r| r.valid).count();
        let invalid_count = results.len().saturating_sub(valid_count);

        debug!(
            total = results.len(),
            valid = valid_count,
            invalid = invalid_count,
            "Verified events"
        );

        VerificationReport {
            all_valid: invalid_count == 0,
            total_events: results.len(),
            valid_count,
            invalid_count,
            merkle_root: merkle_root(leaves),
            results,
        }
    }

    /// Verify every stored row that claims `session_id`.
    ///
    /// Readable rows are checked in chronological order, followed by any
    /// unreadable rows whose session could still be recovered.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails.
    pub fn verify_session(
        &self,
        storage: &dyn EventStorage,
        session_id: &SessionId,
    ) -> AuditResult<VerificationReport> {
        let wanted = session_id.to_string();
        let rows: Vec<StoredRow> = storage
            .rows()?
            .into_iter()
            .filter(|row| row.session_key() == Some(wanted.as_str()))
            .collect();
        Ok(self.verify_rows(&order_rows(rows)))
    }

    /// Verify every row in `storage`, grouped by the session string it
    /// carries.
    ///
    /// Groups are sorted by key. A row is never dropped: session strings
    /// that are not valid IDs form their own group, and rows with no
    /// recoverable session land under [`UNATTRIBUTED`]. The reports'
    /// `total_events` therefore sum to [`EventStorage::count`].
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails.
    pub fn verify_all(
        &self,
        storage: &dyn EventStorage,
    ) -> AuditResult<Vec<(String, VerificationReport)>> {
        let mut groups: BTreeMap<String, Vec<StoredRow>> = BTreeMap::new();
        for row in storage.rows()? {
            let key = row.session_key().unwrap_or(UNATTRIBUTED).to_string();
            groups.entry(key).or_default().push(row);
        }
        Ok(groups
            .into_iter()
            .map(|(key, rows)| {
                let report = self.verify_rows(&order_rows(rows));
                (key, report)
            })
            .collect())
    }
}

/// Group key for rows whose session cannot be recovered.
pub const UNATTRIBUTED: &str = "<unattributed>";

fn stored_leaf(hash: &str) -> EventDigest {
    EventDigest::from_hex(hash).unwrap_or_else(|_| EventDigest::hash(hash.as_bytes()))
}
