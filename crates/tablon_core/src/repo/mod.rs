//! Key-value storage contracts and implementations.
//!
//! # Responsibility
//! - Define the string key/value contract the persistence gateway writes to.
//! - Isolate SQLite details from the gateway and the board service.
//!
//! # Invariants
//! - Writes replace the whole value stored under a key.
//! - Removing a missing key is not an error.

pub mod kv_repo;
