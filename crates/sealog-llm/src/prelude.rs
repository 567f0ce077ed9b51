//! Prelude module - commonly used types for convenient import.
//!
//! Use `use sealog_llm::prelude::*;` to import all essential types.

pub use crate::{LlmError, LlmResult};

pub use crate::{LlmProvider, RecordingProvider};

pub use crate::{LlmResponse, Message, MessageRole, StopReason, Usage};
