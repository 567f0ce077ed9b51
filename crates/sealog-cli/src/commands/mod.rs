//! CLI command implementations.

pub(crate) mod events;
pub(crate) mod keys;
pub(crate) mod replay;
pub(crate) mod verify;
