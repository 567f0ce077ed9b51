//! Sealog LLM - Provider abstraction and call recording.
//!
//! [`LlmProvider`] is the seam between an agent and a model backend.
//! [`RecordingProvider`] wraps any provider, forwards every operation
//! unchanged, and appends one `llm_interaction` event per completion to an
//! [`EventLog`](sealog_audit::EventLog).
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use sealog_llm::{LlmProvider, Message, RecordingProvider};
//!
//! let provider = RecordingProvider::new(backend, Arc::clone(&log));
//! let response = provider.complete(&[Message::user("Hello")], "").await?;
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod provider;
mod recording;
mod types;

pub use error::{LlmError, LlmResult};
pub use provider::LlmProvider;
pub use recording::RecordingProvider;
pub use types::{LlmResponse, Message, MessageRole, StopReason, Usage};
