//! YAML implementation of the `WordDeck` trait.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::{debug, info};

use sugar_core::deck::WordDeck;
use sugar_core::error::DomainError;
use sugar_core::model::WordCard;
use sugar_core::rng::DeterministicRng;

/// A deck loaded once from a YAML list of cards, grouped by language.
pub struct YamlWordDeck {
    cards: BTreeMap<String, Vec<WordCard>>,
    rng: Mutex<Box<dyn DeterministicRng>>,
}

impl YamlWordDeck {
    /// Parses a YAML sequence of cards. Repeated words within a language are
    /// kept once.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the YAML is not a list of cards.
    pub fn from_yaml_str(yaml: &str, rng: Box<dyn DeterministicRng>) -> Result<Self, DomainError> {
        let parsed: Vec<WordCard> = serde_yaml::from_str(yaml)
            .map_err(|e| DomainError::Validation(format!("invalid word deck: {e}")))?;

        let mut seen = HashSet::new();
        let mut cards: BTreeMap<String, Vec<WordCard>> = BTreeMap::new();
        for card in parsed {
            if !seen.insert((card.language.clone(), card.word.clone())) {
                debug!(word = %card.word, language = %card.language, "skipping duplicate card");
                continue;
            }
            cards.entry(card.language.clone()).or_default().push(card);
        }

        info!(
            languages = cards.len(),
            cards = seen.len(),
            "word deck loaded"
        );
        Ok(Self {
            cards,
            rng: Mutex::new(rng),
        })
    }

    /// Reads and parses a YAML deck file.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the file cannot be read and
    /// `DomainError::Validation` if its contents are not a list of cards.
    pub fn from_path(path: &Path, rng: Box<dyn DeterministicRng>) -> Result<Self, DomainError> {
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            DomainError::Infrastructure(format!("cannot read word deck {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&yaml, rng)
    }

    /// Number of distinct cards available in `language`.
    #[must_use]
    pub fn card_count(&self, language: &str) -> usize {
        self.cards.get(language).map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for YamlWordDeck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YamlWordDeck")
            .field("languages", &self.cards.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// Partial Fisher–Yates: the first `count` positions of `pool` end up as a
/// uniform sample without repetition.
fn sample(
    pool: &[WordCard],
    count: usize,
    rng: &mut dyn DeterministicRng,
) -> Result<Vec<WordCard>, DomainError> {
    let last = u32::try_from(pool.len().saturating_sub(1))
        .map_err(|_| DomainError::Validation("word deck too large to sample".to_owned()))?;
    let mut order: Vec<usize> = (0..pool.len()).collect();
    for (position, i) in (0..count).zip(0u32..) {
        let j = rng.next_u32_range(i, last) as usize;
        order.swap(position, j);
    }
    Ok(order
        .into_iter()
        .take(count)
        .map(|index| pool[index].clone())
        .collect())
}

#[async_trait]
impl WordDeck for YamlWordDeck {
    async fn fetch(&self, language: &str, count: usize) -> Result<Vec<WordCard>, DomainError> {
        let pool = self.cards.get(language).map_or(&[][..], Vec::as_slice);
        if pool.len() < count {
            return Err(DomainError::Validation(format!(
                "deck has {} cards for language {language}, {count} requested",
                pool.len()
            )));
        }
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| DomainError::StoreUnavailable("word deck rng poisoned".to_owned()))?;
        sample(pool, count, &mut **rng)
    }
}
