//! Prelude module - commonly used types for convenient import.
//!
//! Use `use sealog_crypto::prelude::*;` to import all essential types.

// Errors
pub use crate::{CryptoError, CryptoResult};

// Hashing
pub use crate::{EventDigest, HashEngine, merkle_root};
