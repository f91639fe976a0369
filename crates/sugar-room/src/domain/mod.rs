//! Domain layer: the room aggregate, its intents, scoring and views.

pub mod aggregates;
pub mod commands;
pub mod scoring;
pub mod view;
