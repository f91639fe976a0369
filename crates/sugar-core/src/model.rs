//! Data model shared by the room context and its collaborators.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Maximum number of seats in a room.
pub const MAX_PLAYERS: usize = 4;

/// One-based round number. Round `r` belongs to `players[r - 1]`.
pub type RoundNo = u32;

/// Identifier of a shared room document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Parses a room identifier, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the identifier is blank.
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(DomainError::Validation("room id must not be blank".to_owned()));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Opaque, stable identity of a participant (the anonymous caller id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    /// Wraps a caller identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A seated participant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    /// Stable identity; uniqueness within a room is by this field.
    pub id: PlayerId,
    /// Name shown to the other participants.
    pub display_name: String,
}

impl Player {
    /// Creates a player.
    #[must_use]
    pub fn new(id: PlayerId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
        }
    }
}

/// A drawn word card. Immutable once drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordCard {
    /// The word the active player acts out.
    pub word: String,
    /// Language code the card belongs to.
    pub language: String,
    /// Any further presentation fields, carried through untouched.
    #[serde(flatten)]
    pub presentation: BTreeMap<String, serde_json::Value>,
}

impl WordCard {
    /// Creates a card with no presentation fields.
    #[must_use]
    pub fn new(word: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            language: language.into(),
            presentation: BTreeMap::new(),
        }
    }
}
