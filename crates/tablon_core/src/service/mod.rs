//! Board use-case services.
//!
//! # Responsibility
//! - Orchestrate store mutations, persistence and rendering.
//! - Keep CLI/FFI layers decoupled from storage details.

pub mod board_service;
