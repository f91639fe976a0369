//! Sugar Core: shared domain abstractions.
//!
//! This crate defines the traits and types that the room context and its
//! collaborators depend on: the error vocabulary, the document store and
//! word deck seams, and the shared data model. It contains no
//! infrastructure code.

pub mod clock;
pub mod command;
pub mod deck;
pub mod error;
pub mod model;
pub mod rng;
pub mod store;
