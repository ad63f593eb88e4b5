//! Persistence gateway: key-value storage and JSON file transfer.
//!
//! # Responsibility
//! - Save/load the store snapshot under a fixed storage key.
//! - Export/import the snapshot as a JSON document on disk.
//!
//! # Invariants
//! - Corrupt stored state is removed and reported as "no state", never as a
//!   hard failure.
//! - A rejected import never reaches the store.

pub mod gateway;
pub mod transfer;
