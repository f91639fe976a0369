//! Shared application state.

use std::sync::Arc;

use sugar_core::deck::WordDeck;
use sugar_core::store::DocumentStore;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Store holding every room document.
    pub store: Arc<dyn DocumentStore>,
    /// Source of word cards drawn at start.
    pub deck: Arc<dyn WordDeck>,
    /// Language used when a start request names none.
    pub default_language: String,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        deck: Arc<dyn WordDeck>,
        default_language: impl Into<String>,
    ) -> Self {
        Self {
            store,
            deck,
            default_language: default_language.into(),
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("default_language", &self.default_language)
            .finish_non_exhaustive()
    }
}
