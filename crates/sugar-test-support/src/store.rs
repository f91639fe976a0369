//! Test stores: `DocumentStore` doubles for error and race scenarios.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use sugar_core::error::DomainError;
use sugar_core::store::{DocumentPatch, DocumentStore, StoredDocument, Subscription};

/// A document store that always returns a store-unavailable error. Useful
/// for testing error-propagation paths.
#[derive(Debug)]
pub struct FailingDocumentStore;

fn connection_refused() -> DomainError {
    DomainError::StoreUnavailable("connection refused".into())
}

#[async_trait]
impl DocumentStore for FailingDocumentStore {
    async fn load(&self, _key: &str) -> Result<Option<StoredDocument>, DomainError> {
        Err(connection_refused())
    }

    async fn create(&self, _key: &str, _body: Value) -> Result<StoredDocument, DomainError> {
        Err(connection_refused())
    }

    async fn update(&self, _key: &str, _patch: DocumentPatch) -> Result<StoredDocument, DomainError> {
        Err(connection_refused())
    }

    async fn subscribe(&self, _key: &str) -> Result<Subscription, DomainError> {
        Err(connection_refused())
    }
}

/// Wraps a real store and records every `update` call that reaches it.
pub struct RecordingDocumentStore {
    inner: Arc<dyn DocumentStore>,
    updates: Mutex<Vec<(String, DocumentPatch)>>,
}

impl RecordingDocumentStore {
    /// Wraps `inner`.
    #[must_use]
    pub fn new(inner: Arc<dyn DocumentStore>) -> Self {
        Self {
            inner,
            updates: Mutex::new(Vec::new()),
        }
    }

    /// Returns a snapshot of all patches passed to `update`, including
    /// rejected ones.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn updates(&self) -> Vec<(String, DocumentPatch)> {
        self.updates.lock().unwrap().clone()
    }
}

impl std::fmt::Debug for RecordingDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingDocumentStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl DocumentStore for RecordingDocumentStore {
    async fn load(&self, key: &str) -> Result<Option<StoredDocument>, DomainError> {
        self.inner.load(key).await
    }

    async fn create(&self, key: &str, body: Value) -> Result<StoredDocument, DomainError> {
        self.inner.create(key, body).await
    }

    async fn update(&self, key: &str, patch: DocumentPatch) -> Result<StoredDocument, DomainError> {
        self.updates
            .lock()
            .unwrap()
            .push((key.to_owned(), patch.clone()));
        self.inner.update(key, patch).await
    }

    async fn subscribe(&self, key: &str) -> Result<Subscription, DomainError> {
        self.inner.subscribe(key).await
    }
}

/// A competing write injected by `ContendedDocumentStore`.
#[derive(Debug, Clone)]
pub enum Interference {
    /// Another caller creates the document.
    Create(Value),
    /// Another caller applies this patch.
    Update(DocumentPatch),
}

/// Wraps a real store and, right after the next `load`, commits a competing
/// write from "another caller" before returning the now-stale snapshot.
///
/// This reproduces the read-modify-write interleaving where two callers read
/// the same prior state and each writes their own extended copy.
pub struct ContendedDocumentStore {
    inner: Arc<dyn DocumentStore>,
    pending: Mutex<Option<Interference>>,
}

impl ContendedDocumentStore {
    /// Wraps `inner`; `interference` fires once, after the first load.
    #[must_use]
    pub fn new(inner: Arc<dyn DocumentStore>, interference: Interference) -> Self {
        Self {
            inner,
            pending: Mutex::new(Some(interference)),
        }
    }

    /// Whether the competing write has already been committed.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn interfered(&self) -> bool {
        self.pending.lock().unwrap().is_none()
    }
}

impl std::fmt::Debug for ContendedDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContendedDocumentStore")
            .field("interfered", &self.interfered())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl DocumentStore for ContendedDocumentStore {
    async fn load(&self, key: &str) -> Result<Option<StoredDocument>, DomainError> {
        let snapshot = self.inner.load(key).await?;
        let pending = self.pending.lock().unwrap().take();
        match pending {
            Some(Interference::Create(body)) => {
                self.inner.create(key, body).await?;
            }
            Some(Interference::Update(patch)) => {
                self.inner.update(key, patch).await?;
            }
            None => {}
        }
        Ok(snapshot)
    }

    async fn create(&self, key: &str, body: Value) -> Result<StoredDocument, DomainError> {
        self.inner.create(key, body).await
    }

    async fn update(&self, key: &str, patch: DocumentPatch) -> Result<StoredDocument, DomainError> {
        self.inner.update(key, patch).await
    }

    async fn subscribe(&self, key: &str) -> Result<Subscription, DomainError> {
        self.inner.subscribe(key).await
    }
}
