//! Test decks: `WordDeck` doubles with a known draw.

use std::sync::Mutex;

use async_trait::async_trait;
use sugar_core::deck::WordDeck;
use sugar_core::error::DomainError;
use sugar_core::model::WordCard;

/// A deck that returns the first `count` of its cards matching the language,
/// in insertion order, and records every request.
#[derive(Debug)]
pub struct StaticWordDeck {
    cards: Vec<WordCard>,
    requests: Mutex<Vec<(String, usize)>>,
}

impl StaticWordDeck {
    /// Creates a deck holding `cards`.
    #[must_use]
    pub fn new(cards: Vec<WordCard>) -> Self {
        Self {
            cards,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Creates a deck of `count` cards named `word-1..=word-count` in `language`.
    #[must_use]
    pub fn numbered(language: &str, count: usize) -> Self {
        Self::new(
            (1..=count)
                .map(|n| WordCard::new(format!("word-{n}"), language))
                .collect(),
        )
    }

    /// Returns every `(language, count)` pair requested so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn requests(&self) -> Vec<(String, usize)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl WordDeck for StaticWordDeck {
    async fn fetch(&self, language: &str, count: usize) -> Result<Vec<WordCard>, DomainError> {
        self.requests
            .lock()
            .unwrap()
            .push((language.to_owned(), count));
        let cards: Vec<WordCard> = self
            .cards
            .iter()
            .filter(|card| card.language == language)
            .take(count)
            .cloned()
            .collect();
        if cards.len() < count {
            return Err(DomainError::Validation(format!(
                "deck has {} cards for language {language}, {count} requested",
                cards.len()
            )));
        }
        Ok(cards)
    }
}

/// A deck whose backing content store is unreachable.
#[derive(Debug)]
pub struct FailingWordDeck;

#[async_trait]
impl WordDeck for FailingWordDeck {
    async fn fetch(&self, _language: &str, _count: usize) -> Result<Vec<WordCard>, DomainError> {
        Err(DomainError::StoreUnavailable("word deck unreachable".into()))
    }
}
