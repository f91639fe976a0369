//! Sugar: Room bounded context.
//!
//! Owns the room/round state machine, the scoring rules, and the
//! projection of a room document into each caller's local view.

pub mod application;
pub mod domain;
