//! Sealog Core - Shared types for the tamper-evident event log.
//!
//! This crate provides:
//! - Event and session identifiers
//! - A UTC timestamp wrapper with a stable canonical text form
//! - The tagged payload [`Value`] union and its insertion-ordered [`Map`]
//! - [`EventFields`], the borrowed five-field view that gets hashed
//!
//! # Example
//!
//! ```
//! use sealog_core::{Map, Value};
//!
//! let mut payload = Map::new();
//! payload.insert("model", "gpt-4");
//! payload.insert("latency_ms", 120);
//!
//! let value = Value::Map(payload);
//! assert_eq!(value.get("model").and_then(Value::as_str), Some("gpt-4"));
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod event;
mod types;
mod value;

pub use event::{EventFields, LLM_INTERACTION};
pub use types::{EventId, SessionId, Timestamp};
pub use value::{Map, Value};
