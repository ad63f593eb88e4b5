//! Filter/sort engine over note collections.
//!
//! # Responsibility
//! - Select the visible subset for a filter mode and a given calendar day.
//! - Produce the board display order.
//!
//! # Invariants
//! - Functions are pure: inputs are never mutated, outputs are new vectors.
//! - Sorting is stable and idempotent.

pub mod visible;
