//! Flutter bridge surface for the Tablon board core.

pub mod api;
