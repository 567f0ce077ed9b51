//! Latency outlier heuristic.
//!
//! This is a simple threshold rule, not a statistical model: an interaction
//! is flagged when its latency exceeds a fixed multiple of the session mean.
//! The result does not depend on event order.

use sealog_core::Timestamp;
use serde::{Deserialize, Serialize};

use crate::timeline::Decision;

/// Tuning for [`ReplayEngine::anomaly_detection`](crate::ReplayEngine::anomaly_detection).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalyPolicy {
    /// Detection runs only with strictly more interactions than this.
    pub min_interactions: usize,
    /// Flag latencies above `mean * latency_multiplier`.
    pub latency_multiplier: f64,
}

impl Default for AnomalyPolicy {
    fn default() -> Self {
        Self {
            min_interactions: 3,
            latency_multiplier: 3.0,
        }
    }
}

/// Kind of anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    /// Latency above the session threshold.
    HighLatency,
}

/// A flagged interaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Anomaly {
    /// What was detected.
    pub kind: AnomalyKind,
    /// ID of the flagged event.
    pub event_id: String,
    /// When the flagged event was recorded.
    pub timestamp: Timestamp,
    /// Observed latency.
    pub latency_ms: f64,
    /// Threshold that was exceeded.
    pub threshold_ms: f64,
    /// Human-readable summary.
    pub description: String,
}

pub(crate) fn mean_latency(decisions: &[Decision]) -> f64 {
    if decisions.is_empty() {
        return 0.0;
    }
    let total: f64 = decisions.iter().map(|d| d.latency_ms).sum();
    #[allow(clippy::cast_precision_loss)]
    let count = decisions.len() as f64;
    total / count
}

pub(crate) fn detect_high_latency(decisions: &[Decision], policy: &AnomalyPolicy) -> Vec<Anomaly> {
    if decisions.len() <= policy.min_interactions {
        return Vec::new();
    }

    let mean = mean_latency(decisions);
    let threshold = mean * policy.latency_multiplier;

    decisions
        .iter()
        .filter(|d| d.latency_ms > threshold)
        .map(|d| Anomaly {
            kind: AnomalyKind::HighLatency,
            event_id: d.event_id.clone(),
            timestamp: d.timestamp,
            latency_ms: d.latency_ms,
            threshold_ms: threshold,
            description: format!(
                "latency {:.0}ms exceeds {threshold:.0}ms ({}x session mean of {mean:.1}ms)",
                d.latency_ms, policy.latency_multiplier
            ),
        })
        .collect()
}
