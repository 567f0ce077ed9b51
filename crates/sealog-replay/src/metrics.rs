//! Aggregate session metrics.

use serde::Serialize;
use std::collections::BTreeMap;

/// Result of [`ReplayEngine::session_metrics`](crate::ReplayEngine::session_metrics).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionMetrics {
    /// The session has no events; there is nothing to analyze.
    Empty,
    /// Metrics over a non-empty session.
    Summary(MetricsSummary),
}

impl SessionMetrics {
    /// The summary, if there was anything to analyze.
    #[must_use]
    pub fn summary(&self) -> Option<&MetricsSummary> {
        match self {
            Self::Empty => None,
            Self::Summary(summary) => Some(summary),
        }
    }
}

/// Metrics over a non-empty session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSummary {
    /// Number of events of any type.
    pub total_events: usize,
    /// Number of `llm_interaction` events.
    pub interaction_count: usize,
    /// Latest minus earliest timestamp across all events.
    pub duration_seconds: f64,
    /// Mean latency over readable interactions, 0 when there are none.
    pub average_latency_ms: f64,
    /// Per-key sums of non-negative integer usage counters.
    pub total_token_usage: BTreeMap<String, u64>,
    /// Events per minute, 0 when the duration is 0.
    pub events_per_minute: f64,
    /// Whether every event's hash verified.
    pub all_hashes_valid: bool,
}
