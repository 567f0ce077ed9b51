//! Canonical byte form of events.
//!
//! Canonical bytes are compact JSON with map keys sorted byte-wise at every
//! level, no whitespace, strings escaped the way `serde_json` escapes them,
//! and floats in their shortest round-trip form. Two semantically equal
//! values produce identical bytes regardless of map insertion order.
//!
//! Traversal depth is bounded by [`MAX_CANONICAL_DEPTH`]. Payloads are
//! expected to be tree-shaped; anything deeper is rejected rather than walked.

use std::io::Write;

use sealog_core::{EventFields, Map, Value};

use crate::error::{CryptoError, CryptoResult};

/// Maximum nesting of lists and maps, counting the payload itself.
///
/// One below `serde_json`'s parser limit of 128, so every payload that
/// hashes can also be parsed back from storage and re-verified.
pub const MAX_CANONICAL_DEPTH: usize = 127;

/// Canonical bytes of a single value.
///
/// # Errors
///
/// Returns [`CryptoError::Serialization`] for non-finite floats or nesting
/// deeper than [`MAX_CANONICAL_DEPTH`].
pub fn canonical_value(value: &Value) -> CryptoResult<Vec<u8>> {
    let mut out = Vec::new();
    write_value(&mut out, value, 0)?;
    Ok(out)
}

/// Canonical bytes of the five hashed event fields.
///
/// # Errors
///
/// Returns [`CryptoError::Serialization`] if the payload cannot be
/// canonicalized.
pub fn canonical_event(fields: &EventFields<'_>) -> CryptoResult<Vec<u8>> {
    let mut out = Vec::new();
    write_event(&mut out, fields)?;
    Ok(out)
}

/// Stream the canonical form of `fields` into `out`.
///
/// Keys are emitted in sorted order:
/// `event_id`, `event_type`, `payload`, `session_id`, `timestamp`.
///
/// # Errors
///
/// Returns [`CryptoError::Serialization`] if the payload cannot be
/// canonicalized or the writer fails.
pub fn write_event<W: Write>(out: &mut W, fields: &EventFields<'_>) -> CryptoResult<()> {
    put(out, b"{")?;
    write_key(out, "event_id")?;
    write_str(out, fields.event_id)?;
    put(out, b",")?;
    write_key(out, "event_type")?;
    write_str(out, fields.event_type)?;
    put(out, b",")?;
    write_key(out, "payload")?;
    write_value(out, fields.payload, 0)?;
    put(out, b",")?;
    write_key(out, "session_id")?;
    write_str(out, fields.session_id)?;
    put(out, b",")?;
    write_key(out, "timestamp")?;
    write_str(out, &fields.timestamp.to_canonical_string())?;
    put(out, b"}")
}

fn write_value<W: Write>(out: &mut W, value: &Value, depth: usize) -> CryptoResult<()> {
    match value {
        Value::Null => put(out, b"null"),
        Value::Bool(true) => put(out, b"true"),
        Value::Bool(false) => put(out, b"false"),
        Value::Integer(i) => put(out, i.to_string().as_bytes()),
        Value::Float(f) => write_float(out, *f),
        Value::String(s) => write_str(out, s),
        Value::List(items) => {
            let depth = descend(depth)?;
            put(out, b"[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    put(out, b",")?;
                }
                write_value(out, item, depth)?;
            }
            put(out, b"]")
        },
        Value::Map(map) => write_map(out, map, descend(depth)?),
    }
}

fn write_map<W: Write>(out: &mut W, map: &Map, depth: usize) -> CryptoResult<()> {
    let mut entries: Vec<(&str, &Value)> = map.iter().collect();
    entries.sort_unstable_by(|a, b| a.0.cmp(b.0));

    put(out, b"{")?;
    for (i, (key, value)) in entries.into_iter().enumerate() {
        if i > 0 {
            put(out, b",")?;
        }
        write_key(out, key)?;
        write_value(out, value, depth)?;
    }
    put(out, b"}")
}

fn write_float<W: Write>(out: &mut W, f: f64) -> CryptoResult<()> {
    if !f.is_finite() {
        return Err(CryptoError::Serialization(format!(
            "non-finite number {f} has no canonical form"
        )));
    }
    serde_json::to_writer(out, &f).map_err(|e| CryptoError::Serialization(e.to_string()))
}

fn write_key<W: Write>(out: &mut W, key: &str) -> CryptoResult<()> {
    write_str(out, key)?;
    put(out, b":")
}

fn write_str<W: Write>(out: &mut W, s: &str) -> CryptoResult<()> {
    serde_json::to_writer(out, s).map_err(|e| CryptoError::Serialization(e.to_string()))
}

fn put<W: Write>(out: &mut W, bytes: &[u8]) -> CryptoResult<()> {
    out.write_all(bytes)
        .map_err(|e| CryptoError::Serialization(e.to_string()))
}

fn descend(depth: usize) -> CryptoResult<usize> {
    let next = depth.saturating_add(1);
    if next > MAX_CANONICAL_DEPTH {
        return Err(CryptoError::Serialization(format!(
            "payload nesting exceeds {MAX_CANONICAL_DEPTH} levels"
        )));
    }
    Ok(next)
}
