//! Board domain model.
//!
//! # Responsibility
//! - Define the note record and the filter modes shared by every layer.
//! - Own the creation-time validation and repair rules (note factory).
//!
//! # Invariants
//! - Notes produced by the factory have a fresh id, trimmed non-empty text,
//!   a `YYYY-MM-DD` date and a priority in `[1, 3]`.
//! - Notes read from storage/import/companion payloads are taken as-is.

pub mod filter;
pub mod note;
