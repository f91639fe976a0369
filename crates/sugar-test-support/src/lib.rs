//! Shared test mocks and utilities for the Sugar party word game.

mod clock;
mod deck;
mod rng;
mod store;

pub use clock::FixedClock;
pub use deck::{FailingWordDeck, StaticWordDeck};
pub use rng::{MockRng, SequenceRng};
pub use store::{ContendedDocumentStore, FailingDocumentStore, Interference, RecordingDocumentStore};
