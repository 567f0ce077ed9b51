//! Prelude module - commonly used types for convenient import.
//!
//! Use `use sealog_core::prelude::*;` to import all essential types.

pub use crate::{EventFields, EventId, LLM_INTERACTION, Map, SessionId, Timestamp, Value};
