//! Sealog Replay - Reconstruct session behavior from recorded events.
//!
//! A [`ReplayEngine`] holds an immutable, chronologically sorted snapshot of
//! one session and derives from it:
//!
//! - a decision timeline of `llm_interaction` events
//! - aggregate session metrics
//! - latency anomaly flags
//!
//! Every call recomputes from the snapshot. Nothing is cached or persisted.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use sealog_audit::{EventLog, IntegrityVerifier};
//! use sealog_core::{Map, Value};
//! use sealog_crypto::HashEngine;
//! use sealog_replay::{ReplayEngine, SessionMetrics};
//!
//! let log = EventLog::in_memory(HashEngine::generate());
//! let mut payload = Map::new();
//! payload.insert("model", "gpt-4");
//! payload.insert("latency_ms", 120);
//! log.append("llm_interaction", Value::Map(payload)).unwrap();
//!
//! let verifier = IntegrityVerifier::new(Arc::clone(log.engine()));
//! let replay = ReplayEngine::from_storage(log.storage().as_ref(), log.session_id(), verifier)
//!     .unwrap();
//!
//! assert_eq!(replay.decision_timeline()[0].model, "gpt-4");
//! match replay.session_metrics() {
//!     SessionMetrics::Summary(summary) => assert!(summary.all_hashes_valid),
//!     SessionMetrics::Empty => unreachable!(),
//! }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod anomaly;
mod engine;
mod error;
mod metrics;
mod timeline;

pub use anomaly::{Anomaly, AnomalyKind, AnomalyPolicy};
pub use engine::ReplayEngine;
pub use error::{ReplayError, ReplayResult};
pub use metrics::{MetricsSummary, SessionMetrics};
pub use timeline::Decision;
