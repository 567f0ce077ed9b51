//! Replay engine over a session snapshot.

use sealog_audit::{EventRecord, EventStorage, IntegrityVerifier, StoredRow, sort_chronologically};
use sealog_core::{LLM_INTERACTION, SessionId};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::anomaly::{Anomaly, AnomalyPolicy, detect_high_latency, mean_latency};
use crate::error::ReplayResult;
use crate::metrics::{MetricsSummary, SessionMetrics};
use crate::timeline::Decision;

/// Stateless analysis over an immutable, chronologically sorted snapshot.
#[derive(Debug, Clone)]
pub struct ReplayEngine {
    events: Vec<EventRecord>,
    verifier: IntegrityVerifier,
    policy: AnomalyPolicy,
    skipped_rows: usize,
}

impl ReplayEngine {
    /// Build from a snapshot in any order.
    ///
    /// Events are sorted by timestamp; ties keep their given order.
    #[must_use]
    pub fn new(mut events: Vec<EventRecord>, verifier: IntegrityVerifier) -> Self {
        sort_chronologically(&mut events);
        Self {
            events,
            verifier,
            policy: AnomalyPolicy::default(),
            skipped_rows: 0,
        }
    }

    /// Load a session's snapshot from storage.
    ///
    /// Rows that cannot be parsed are left out of the snapshot but still
    /// count against [`MetricsSummary::all_hashes_valid`].
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails.
    pub fn from_storage(
        storage: &dyn EventStorage,
        session_id: &SessionId,
        verifier: IntegrityVerifier,
    ) -> ReplayResult<Self> {
        let wanted = session_id.to_string();
        let mut events = Vec::new();
        let mut skipped_rows = 0_usize;
        for row in storage.rows()? {
            if row.session_key() != Some(wanted.as_str()) {
                continue;
            }
            match row {
                StoredRow::Record(record) => events.push(record),
                StoredRow::Unreadable(bad) => {
                    warn!(
                        session_id = %session_id,
                        line = bad.line,
                        "Skipping unreadable row in replay"
                    );
                    skipped_rows = skipped_rows.saturating_add(1);
                },
            }
        }
        debug!(
            session_id = %session_id,
            count = events.len(),
            skipped = skipped_rows,
            "Loaded replay snapshot"
        );
        let mut engine = Self::new(events, verifier);
        engine.skipped_rows = skipped_rows;
        Ok(engine)
    }

    /// Replace the anomaly policy.
    #[must_use]
    pub fn with_policy(mut self, policy: AnomalyPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Stored rows of this session that could not be parsed.
    #[must_use]
    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }

    /// The sorted snapshot.
    #[must_use]
    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    fn interactions(&self) -> impl Iterator<Item = &EventRecord> {
        self.events
            .iter()
            .filter(|e| e.event_type == LLM_INTERACTION)
    }

    /// `llm_interaction` events in order, reduced to decision records.
    ///
    /// Events whose payload cannot be parsed are skipped.
    #[must_use]
    pub fn decision_timeline(&self) -> Vec<Decision> {
        self.interactions()
            .filter_map(Decision::from_record)
            .collect()
    }

    /// Aggregate metrics, or [`SessionMetrics::Empty`] for an empty session.
    ///
    /// Duration spans all events. Latency and token usage cover readable
    /// interactions only.
    #[must_use]
    pub fn session_metrics(&self) -> SessionMetrics {
        let (Some(first), Some(last)) = (self.events.first(), self.events.last()) else {
            return SessionMetrics::Empty;
        };

        let decisions = self.decision_timeline();
        let duration_seconds = last.timestamp.seconds_since(&first.timestamp).max(0.0);
        let total_events = self.events.len();

        #[allow(clippy::cast_precision_loss)]
        let events_per_minute = if duration_seconds > 0.0 {
            total_events as f64 * 60.0 / duration_seconds
        } else {
            0.0
        };

        SessionMetrics::Summary(MetricsSummary {
            total_events,
            interaction_count: self.interactions().count(),
            duration_seconds,
            average_latency_ms: mean_latency(&decisions),
            total_token_usage: sum_usage(&decisions),
            events_per_minute,
            all_hashes_valid: self.skipped_rows == 0
                && self.verifier.verify(&self.events).all_valid,
        })
    }

    /// Interactions whose latency is an outlier under the current policy.
    #[must_use]
    pub fn anomaly_detection(&self) -> Vec<Anomaly> {
        detect_high_latency(&self.decision_timeline(), &self.policy)
    }
}

fn sum_usage(decisions: &[Decision]) -> BTreeMap<String, u64> {
    let mut totals: BTreeMap<String, u64> = BTreeMap::new();
    for decision in decisions {
        for (key, value) in decision.token_usage.iter() {
            let Some(count) = value.as_i64().and_then(|n| u64::try_from(n).ok()) else {
                continue;
            };
            let slot = totals.entry(key.to_string()).or_default();
            *slot = slot.saturating_add(count);
        }
    }
    totals
}
