//! Sugar Deck: word card content provider.
//!
//! Loads word cards from YAML and samples distinct cards per game.

pub mod yaml_word_deck;

/// The deck bundled with the binary, used when no deck path is configured.
pub const DEFAULT_DECK_YAML: &str = include_str!("../decks/default.yaml");
