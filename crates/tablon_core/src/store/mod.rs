//! In-memory note store and its snapshot codec.
//!
//! # Responsibility
//! - Hold the ordered note collection and the active filter for one window.
//! - Convert between the store and the persisted `{ notes, filter }` shape.
//!
//! # Invariants
//! - Collection order is insertion order, never display order.
//! - The store never persists itself; owners call persistence explicitly.
//! - Decoding structurally invalid snapshots never fails the caller of
//!   [`note_store::NoteStore::from_snapshot`].

pub mod note_store;
pub mod snapshot;
