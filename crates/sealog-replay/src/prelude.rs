//! Prelude module - commonly used types for convenient import.
//!
//! Use `use sealog_replay::prelude::*;` to import all essential types.

pub use crate::{ReplayError, ReplayResult};

pub use crate::{
    Anomaly, AnomalyKind, AnomalyPolicy, Decision, MetricsSummary, ReplayEngine, SessionMetrics,
};
