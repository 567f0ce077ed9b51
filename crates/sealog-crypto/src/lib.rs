//! Sealog Crypto - Canonical hashing primitives for the event log.
//!
//! This crate provides:
//! - A canonical byte form for events that ignores map insertion order
//! - Keyed HMAC-SHA256 event digests ([`HashEngine`])
//! - Merkle root aggregation over ordered digests
//! - Constant-time digest comparison
//!
//! # Trust Model
//!
//! The HMAC key is the trust anchor. Two engines with different keys produce
//! unlinkable digests for the same event, so verifying old events after a key
//! rotation requires the historical key. Rotation means constructing a new
//! engine; keys are never mutated in place.
//!
//! # Example
//!
//! ```
//! use sealog_core::{EventFields, Map, Timestamp, Value};
//! use sealog_crypto::{HashEngine, merkle_root};
//!
//! let engine = HashEngine::generate();
//! let payload = Value::Map(Map::from_iter([("model", "gpt-4")]));
//! let timestamp = Timestamp::now();
//! let fields = EventFields {
//!     event_id: "e-1",
//!     session_id: "s-1",
//!     timestamp: &timestamp,
//!     event_type: "llm_interaction",
//!     payload: &payload,
//! };
//!
//! let digest = engine.hash_event(&fields).unwrap();
//! assert!(engine.verify_digest(&fields, &digest).unwrap());
//! assert_eq!(merkle_root(&[digest]), digest);
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod canonical;
pub mod prelude;

mod digest;
mod engine;
mod error;
mod merkle;

pub use digest::EventDigest;
pub use engine::{HashEngine, MIN_KEY_LEN};
pub use error::{CryptoError, CryptoResult};
pub use merkle::{EMPTY_MERKLE_ROOT, merkle_root};
