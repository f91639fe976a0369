//! Sugar party word game: HTTP API.
//!
//! Exposes the room command and query handlers over axum, plus a
//! server-sent event stream of per-caller views.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
