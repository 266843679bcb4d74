//! In-memory document store implementation.
//!
//! This module provides [`MemoryStore`], an in-memory implementation of
//! [`DocumentStore`] suitable for testing and development.
//!
//! # Features
//!
//! - **Thread-safe**: Uses [`parking_lot::RwLock`] for concurrent access
//! - **Ordered storage**: Documents are stored in a [`BTreeMap`], so view range
//!   queries are a single ordered walk
//! - **Store-side TTL**: Write-time TTLs follow [`Expiry::from_ttl_seconds`];
//!   a background task purges expired documents
//! - **Views**: Installed design documents are evaluated on every query, so
//!   index updates are visible immediately
//!
//! # Example
//!
//! ```
//! use ticket_registry_storage::{
//!     DesignDocument, DocumentStore, MapFunction, MemoryStore, Reducer, ViewDefinition, ViewQuery,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = MemoryStore::new();
//!     let view =
//!         ViewDefinition::new("all_tickets", MapFunction::EmitDocumentId, Some(Reducer::Count));
//!     store.ensure_design_document(&DesignDocument::new("statistics", [view])).await.unwrap();
//!
//!     store.upsert("ST-1", b"{}".to_vec(), 60).await.unwrap();
//!     store.upsert("ST-2", b"{}".to_vec(), 60).await.unwrap();
//!
//!     let rows = store
//!         .query(&ViewQuery::new("statistics", "all_tickets").reduce(true))
//!         .await
//!         .unwrap();
//!     assert_eq!(rows[0].count(), Some(2));
//! }
//! ```
//!
//! # Performance Characteristics
//!
//! | Operation | Complexity |
//! |-----------|------------|
//! | get | O(log n) |
//! | upsert | O(log n) |
//! | remove | O(log n) |
//! | query | O(log n + k) where k is the number of documents in range |
//!
//! # Limitations
//!
//! - Data is not persisted; all data is lost when the process exits
//! - Expired documents are hidden on read but only reclaimed once per second

use std::{
    collections::BTreeMap,
    ops::Bound,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use parking_lot::RwLock;
use tokio::{select, sync::watch, time::sleep};

use crate::{
    error::{StorageError, StorageResult},
    expiry::Expiry,
    size_limits::{SizeLimits, validate_id_size, validate_sizes},
    store::DocumentStore,
    types::ViewRow,
    view::{DesignDocument, MapFunction, ViewQuery},
};

const STORE_NAME: &str = "memory";

/// Holds the shutdown signal sender. When dropped, the watch channel
/// closes and the purge task exits.
struct ShutdownGuard {
    shutdown_tx: watch::Sender<()>,
}

impl Drop for ShutdownGuard {
    fn drop(&mut self) {
        // The purge task may already have stopped.
        let _ = self.shutdown_tx.send(());
    }
}

#[derive(Debug, Clone)]
struct StoredDocument {
    value: Bytes,
    expiry: Expiry,
}

/// In-memory document store using [`BTreeMap`].
///
/// # Cloning
///
/// `MemoryStore` is cheaply cloneable via [`Arc`]. All clones share the same
/// documents, design documents and closed state.
///
/// # Shutdown
///
/// [`DocumentStore::shutdown`] stops the purge task and closes the store for
/// every clone. The purge task also stops when the last clone is dropped.
#[derive(Clone)]
pub struct MemoryStore {
    documents: Arc<RwLock<BTreeMap<String, StoredDocument>>>,
    design_documents: Arc<RwLock<BTreeMap<String, DesignDocument>>>,
    closed: Arc<AtomicBool>,
    limits: SizeLimits,
    shutdown_guard: Arc<ShutdownGuard>,
}

impl MemoryStore {
    /// Creates a new in-memory store with default [`SizeLimits`].
    ///
    /// Spawns the background purge task, so this must be called from within
    /// a Tokio runtime.
    pub fn new() -> Self {
        Self::with_size_limits(SizeLimits::default())
    }

    /// Creates a new in-memory store enforcing the given size limits.
    pub fn with_size_limits(limits: SizeLimits) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(());
        let store = Self {
            documents: Arc::new(RwLock::new(BTreeMap::new())),
            design_documents: Arc::new(RwLock::new(BTreeMap::new())),
            closed: Arc::new(AtomicBool::new(false)),
            limits,
            shutdown_guard: Arc::new(ShutdownGuard { shutdown_tx }),
        };

        // The task holds only the data maps, never the guard, so dropping
        // the last handle still closes the channel.
        let documents = Arc::clone(&store.documents);
        tokio::spawn(async move {
            purge_expired_documents(documents, shutdown_rx).await;
        });

        store
    }

    /// Returns the size limits enforced by this store.
    #[must_use]
    pub fn size_limits(&self) -> SizeLimits {
        self.limits
    }

    /// Deletes a design document, as an operator would out-of-band.
    ///
    /// Returns `true` if it existed. Subsequent queries against its views fail
    /// with [`StorageError::ViewNotFound`].
    pub fn drop_design_document(&self, name: &str) -> bool {
        self.design_documents.write().remove(name).is_some()
    }

    /// Returns `true` if a design document with this name is installed.
    #[must_use]
    pub fn has_design_document(&self, name: &str) -> bool {
        self.design_documents.read().contains_key(name)
    }

    /// Number of live (unexpired) documents.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = Utc::now();
        self.documents.read().values().filter(|doc| !doc.expiry.is_expired_at(now)).count()
    }

    /// Returns `true` if the store holds no live documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` once [`DocumentStore::shutdown`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> StorageResult<()> {
        if self.is_closed() {
            return Err(StorageError::Closed);
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("documents", &self.documents.read().len())
            .field("design_documents", &self.design_documents.read().len())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

/// Removes expired documents once per second until shutdown is signalled.
async fn purge_expired_documents(
    documents: Arc<RwLock<BTreeMap<String, StoredDocument>>>,
    mut shutdown_rx: watch::Receiver<()>,
) {
    loop {
        select! {
            _ = sleep(Duration::from_secs(1)) => {}
            _ = shutdown_rx.changed() => {
                return;
            }
        }

        let now = Utc::now();
        let expired: Vec<String> = documents
            .read()
            .iter()
            .filter(|(_, doc)| doc.expiry.is_expired_at(now))
            .map(|(id, _)| id.clone())
            .collect();

        if !expired.is_empty() {
            let mut guard = documents.write();
            for id in &expired {
                // Re-check: the document may have been rewritten since the scan.
                if guard.get(id).is_some_and(|doc| doc.expiry.is_expired_at(now)) {
                    guard.remove(id);
                }
            }
            tracing::trace!(purged = expired.len(), "purged expired documents");
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn name(&self) -> &str {
        STORE_NAME
    }

    #[tracing::instrument(skip(self, value), fields(value_len = value.len()))]
    async fn upsert(&self, id: &str, value: Vec<u8>, ttl_seconds: i64) -> StorageResult<()> {
        self.ensure_open()?;
        validate_sizes(id, &value, &self.limits)?;

        let expiry = Expiry::from_ttl_seconds(ttl_seconds, Utc::now());
        self.documents
            .write()
            .insert(id.to_owned(), StoredDocument { value: Bytes::from(value), expiry });
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn get(&self, id: &str) -> StorageResult<Option<Bytes>> {
        self.ensure_open()?;
        validate_id_size(id, &self.limits)?;

        let now = Utc::now();
        let documents = self.documents.read();
        Ok(documents
            .get(id)
            .filter(|doc| !doc.expiry.is_expired_at(now))
            .map(|doc| doc.value.clone()))
    }

    #[tracing::instrument(skip(self))]
    async fn remove(&self, id: &str) -> StorageResult<bool> {
        self.ensure_open()?;
        validate_id_size(id, &self.limits)?;

        let now = Utc::now();
        let removed = self.documents.write().remove(id);
        Ok(removed.is_some_and(|doc| !doc.expiry.is_expired_at(now)))
    }

    #[tracing::instrument(
        skip(self, query),
        fields(
            design_document = query.design_document(),
            view = query.view(),
            reduce = query.is_reduce(),
        )
    )]
    async fn query(&self, query: &ViewQuery) -> StorageResult<Vec<ViewRow>> {
        self.ensure_open()?;

        let view = {
            let design_documents = self.design_documents.read();
            design_documents
                .get(query.design_document())
                .and_then(|doc| doc.view(query.view()))
                .cloned()
                .ok_or_else(|| {
                    StorageError::view_not_found(query.design_document(), query.view())
                })?
        };

        if query.is_reduce() && view.reduce().is_none() {
            return Err(StorageError::internal(format!(
                "view {}/{} has no reducer",
                query.design_document(),
                query.view()
            )));
        }

        // An inverted range is empty; BTreeMap::range would panic on it.
        if let (Some(start), Some(end)) = (query.start(), query.end())
            && start > end
        {
            return Ok(Vec::new());
        }

        let start = query.start().map_or(Bound::Unbounded, Bound::Included);
        let end = match query.end() {
            None => Bound::Unbounded,
            Some(end) if query.is_inclusive_end() => Bound::Included(end),
            Some(end) => Bound::Excluded(end),
        };

        let now = Utc::now();
        let documents = self.documents.read();
        let live = documents
            .range::<str, _>((start, end))
            .filter(|(_, doc)| !doc.expiry.is_expired_at(now));

        if query.is_reduce() {
            let count = live.count() as u64;
            return Ok(if count == 0 { Vec::new() } else { vec![ViewRow::reduced(count)] });
        }

        let limit = query.row_limit().unwrap_or(usize::MAX);
        let rows = live
            .take(limit)
            .map(|(id, doc)| match view.map() {
                MapFunction::EmitDocumentId => {
                    ViewRow::mapped(id.clone(), query.includes_docs().then(|| doc.value.clone()))
                },
            })
            .collect();
        Ok(rows)
    }

    #[tracing::instrument(skip(self, design_document), fields(name = design_document.name()))]
    async fn ensure_design_document(&self, design_document: &DesignDocument) -> StorageResult<()> {
        self.ensure_open()?;

        let mut design_documents = self.design_documents.write();
        if design_documents.get(design_document.name()) != Some(design_document) {
            design_documents.insert(design_document.name().to_owned(), design_document.clone());
            tracing::debug!(name = design_document.name(), "installed design document");
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn shutdown(&self) -> StorageResult<()> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            // The purge task may already have stopped.
            let _ = self.shutdown_guard.shutdown_tx.send(());
            tracing::debug!("memory store closed");
        }
        Ok(())
    }
}
