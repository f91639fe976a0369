//! Application layer: handlers that load rooms, run intents and persist
//! the resulting writes, plus the caller-owned game session.

pub mod command_handlers;
pub mod query_handlers;
pub mod session;
