//! Shared document store abstraction.
//!
//! A room lives in a single JSON document keyed by its room id. The store
//! supports whole-document reads, partial field updates with optional
//! compare-and-set guards, and subscriptions that push the full document
//! after every successful write.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::{Stream, StreamExt};

use crate::error::DomainError;

/// A full copy of a stored document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredDocument {
    /// The document key.
    pub key: String,
    /// Number of successful writes, starting at 1 on creation.
    pub version: i64,
    /// The document body.
    pub body: Value,
    /// Timestamp of the last write.
    pub updated_at: DateTime<Utc>,
}

/// Path to a (possibly nested) field, one segment per map level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// Path to a top-level field.
    #[must_use]
    pub fn field(name: &str) -> Self {
        Self(vec![name.to_owned()])
    }

    /// Extends the path one map level down.
    #[must_use]
    pub fn child(mut self, segment: impl Into<String>) -> Self {
        self.0.push(segment.into());
        self
    }

    /// Returns the path segments.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Reads the value at this path, if every segment resolves.
    #[must_use]
    pub fn lookup<'a>(&self, body: &'a Value) -> Option<&'a Value> {
        self.0
            .iter()
            .try_fold(body, |current, segment| current.as_object()?.get(segment))
    }

    fn set(&self, body: &mut Value, value: Value) -> Result<(), DomainError> {
        let (last, parents) = self
            .0
            .split_last()
            .ok_or_else(|| DomainError::Validation("empty field path".to_owned()))?;
        let mut current = body;
        for segment in parents {
            let map = current.as_object_mut().ok_or_else(|| self.not_a_map())?;
            current = map
                .entry(segment.clone())
                .or_insert_with(|| Value::Object(Map::new()));
        }
        let map = current.as_object_mut().ok_or_else(|| self.not_a_map())?;
        map.insert(last.clone(), value);
        Ok(())
    }

    fn not_a_map(&self) -> DomainError {
        DomainError::Infrastructure(format!("cannot set {self}: parent is not a map"))
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

/// A partial update: field sets applied in order, plus the conditions that
/// must hold at commit time for any of them to be applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentPatch {
    sets: Vec<(FieldPath, Value)>,
    guards: Vec<(FieldPath, Value)>,
    expected_version: Option<i64>,
}

impl DocumentPatch {
    /// Creates an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the field at `path` to `value`, creating intermediate maps.
    /// Sibling entries of the target are left untouched.
    #[must_use]
    pub fn set(mut self, path: FieldPath, value: Value) -> Self {
        self.sets.push((path, value));
        self
    }

    /// Requires the field at `path` to equal `value` when the write commits.
    #[must_use]
    pub fn guard(mut self, path: FieldPath, value: Value) -> Self {
        self.guards.push((path, value));
        self
    }

    /// Requires the stored document to still be at `version`.
    #[must_use]
    pub fn expect_version(mut self, version: i64) -> Self {
        self.expected_version = Some(version);
        self
    }

    /// Returns the field sets in application order.
    #[must_use]
    pub fn sets(&self) -> &[(FieldPath, Value)] {
        &self.sets
    }

    /// Returns the compare-and-set version, if any.
    #[must_use]
    pub fn expected_version(&self) -> Option<i64> {
        self.expected_version
    }

    /// Checks the version and field guards against `current`, then applies
    /// the sets to a copy of its body.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ConcurrencyConflict` on a version mismatch,
    /// `DomainError::PreconditionFailed` if a guard does not hold, and
    /// `DomainError::Infrastructure` if a path runs through a non-map value.
    pub fn apply(&self, current: &StoredDocument) -> Result<Value, DomainError> {
        if let Some(expected) = self.expected_version {
            if expected != current.version {
                return Err(DomainError::ConcurrencyConflict {
                    key: current.key.clone(),
                    expected,
                    actual: current.version,
                });
            }
        }
        for (path, expected) in &self.guards {
            if path.lookup(&current.body) != Some(expected) {
                return Err(DomainError::PreconditionFailed {
                    key: current.key.clone(),
                    field: path.to_string(),
                });
            }
        }
        let mut body = current.body.clone();
        for (path, value) in &self.sets {
            path.set(&mut body, value.clone())?;
        }
        Ok(body)
    }
}

/// A live subscription to one document. Dropping it releases the
/// subscription.
#[derive(Debug)]
pub struct Subscription {
    key: String,
    receiver: watch::Receiver<Option<StoredDocument>>,
}

impl Subscription {
    /// Wraps the receiving half of a store's per-document channel.
    #[must_use]
    pub fn new(key: impl Into<String>, receiver: watch::Receiver<Option<StoredDocument>>) -> Self {
        Self {
            key: key.into(),
            receiver,
        }
    }

    /// The subscribed document key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The most recent snapshot the store has published, if any.
    #[must_use]
    pub fn latest(&self) -> Option<StoredDocument> {
        self.receiver.borrow().clone()
    }

    /// Waits for the next snapshot pushed after the last one observed.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::StoreUnavailable` if the store has shut the
    /// channel down.
    pub async fn changed(&mut self) -> Result<StoredDocument, DomainError> {
        loop {
            self.receiver.changed().await.map_err(|_| {
                DomainError::StoreUnavailable(format!("subscription to {} closed", self.key))
            })?;
            if let Some(document) = self.receiver.borrow_and_update().clone() {
                return Ok(document);
            }
        }
    }

    /// Converts the subscription into a stream that yields the current
    /// snapshot first, then every subsequent one.
    pub fn into_stream(self) -> impl Stream<Item = StoredDocument> + Send + 'static {
        WatchStream::new(self.receiver).filter_map(|document| document)
    }
}

/// Repository trait for the shared room documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Reads the full document, or `None` if the key does not exist.
    async fn load(&self, key: &str) -> Result<Option<StoredDocument>, DomainError>;

    /// Creates a document at version 1.
    ///
    /// Fails with `DomainError::ConcurrencyConflict` if the key exists.
    async fn create(&self, key: &str, body: Value) -> Result<StoredDocument, DomainError>;

    /// Applies a partial update atomically and returns the new snapshot.
    ///
    /// Fails with `DomainError::NotFound` if the key does not exist.
    async fn update(&self, key: &str, patch: DocumentPatch) -> Result<StoredDocument, DomainError>;

    /// Subscribes to every subsequent snapshot of the document.
    async fn subscribe(&self, key: &str) -> Result<Subscription, DomainError>;
}
