//! In-memory implementation of the `DocumentStore` trait.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::watch;
use tracing::debug;

use sugar_core::clock::Clock;
use sugar_core::error::DomainError;
use sugar_core::store::{DocumentPatch, DocumentStore, StoredDocument, Subscription};

type Channel = watch::Sender<Option<StoredDocument>>;

/// Process-local document store.
///
/// Each key owns a watch channel whose current value is the authoritative
/// document; writes are serialized under one lock and published to every
/// subscriber once committed. A channel can exist before its document does,
/// so a caller may subscribe ahead of creation.
///
/// Entries live as long as the store; nothing is evicted when the last
/// subscriber leaves.
pub struct InMemoryDocumentStore {
    clock: Arc<dyn Clock>,
    // TODO: evict a finished room's channel once its last subscriber drops.
    documents: Mutex<HashMap<String, Channel>>,
}

impl InMemoryDocumentStore {
    /// Creates an empty store that stamps writes with `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            documents: Mutex::new(HashMap::new()),
        }
    }

    /// Number of live subscriptions on `key`.
    #[must_use]
    pub fn subscriber_count(&self, key: &str) -> usize {
        self.documents
            .lock()
            .map(|documents| documents.get(key).map_or(0, watch::Sender::receiver_count))
            .unwrap_or(0)
    }

    fn documents(&self) -> Result<MutexGuard<'_, HashMap<String, Channel>>, DomainError> {
        self.documents
            .lock()
            .map_err(|_| DomainError::StoreUnavailable("document store lock poisoned".to_owned()))
    }
}

impl std::fmt::Debug for InMemoryDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.documents.lock().map_or(0, |documents| documents.len());
        f.debug_struct("InMemoryDocumentStore")
            .field("documents", &count)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn load(&self, key: &str) -> Result<Option<StoredDocument>, DomainError> {
        let documents = self.documents()?;
        Ok(documents.get(key).and_then(|channel| channel.borrow().clone()))
    }

    async fn create(&self, key: &str, body: Value) -> Result<StoredDocument, DomainError> {
        let mut documents = self.documents()?;
        let channel = documents
            .entry(key.to_owned())
            .or_insert_with(|| watch::channel(None).0);
        if let Some(existing) = channel.borrow().as_ref() {
            return Err(DomainError::ConcurrencyConflict {
                key: key.to_owned(),
                expected: 0,
                actual: existing.version,
            });
        }
        let document = StoredDocument {
            key: key.to_owned(),
            version: 1,
            body,
            updated_at: self.clock.now(),
        };
        channel.send_replace(Some(document.clone()));
        debug!(key, version = 1, "document created");
        Ok(document)
    }

    async fn update(&self, key: &str, patch: DocumentPatch) -> Result<StoredDocument, DomainError> {
        let documents = self.documents()?;
        let channel = documents
            .get(key)
            .ok_or_else(|| DomainError::NotFound(key.to_owned()))?;
        let current = channel
            .borrow()
            .clone()
            .ok_or_else(|| DomainError::NotFound(key.to_owned()))?;

        let body = patch.apply(&current)?;
        let document = StoredDocument {
            key: key.to_owned(),
            version: current.version + 1,
            body,
            updated_at: self.clock.now(),
        };
        channel.send_replace(Some(document.clone()));
        debug!(
            key,
            version = document.version,
            fields = patch.sets().len(),
            subscribers = channel.receiver_count(),
            "document updated"
        );
        Ok(document)
    }

    async fn subscribe(&self, key: &str) -> Result<Subscription, DomainError> {
        let mut documents = self.documents()?;
        let channel = documents
            .entry(key.to_owned())
            .or_insert_with(|| watch::channel(None).0);
        Ok(Subscription::new(key, channel.subscribe()))
    }
}
