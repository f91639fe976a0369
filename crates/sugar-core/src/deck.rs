//! Word deck abstraction.

use async_trait::async_trait;

use crate::error::DomainError;
use crate::model::WordCard;

/// Content provider for word cards.
#[async_trait]
pub trait WordDeck: Send + Sync {
    /// Returns exactly `count` distinct cards in `language`, in random order.
    ///
    /// Fails with `DomainError::Validation` if the deck holds fewer than
    /// `count` cards for that language.
    async fn fetch(&self, language: &str, count: usize) -> Result<Vec<WordCard>, DomainError>;
}
