//! Companion-window synchronization.
//!
//! # Responsibility
//! - Define the `SNAPSHOT`/`BORRADO` message contract between two windows.
//! - Validate inbound payloads at the boundary before dispatch.
//! - Model the primary's delayed snapshot send and the secondary's readiness.
//!
//! # Invariants
//! - Messages from a foreign origin or without a known `tipo` are dropped
//!   silently (debug log only).
//! - Delivery is at-most-once, in send order per sender; nothing is retried.
//! - Each window applies messages to its own store copy.

pub mod channel;
pub mod companion;
pub mod message;
