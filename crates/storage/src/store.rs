//! Document store trait definition.
//!
//! [`DocumentStore`] is the narrow client interface the ticket registry
//! consumes. It models a Couchbase-style bucket: documents addressed by
//! string ID, a write-time TTL whose meaning the store decides (see
//! [`Expiry`](crate::Expiry)), and materialized views as the only way to
//! enumerate or count documents.
//!
//! # Design Philosophy
//!
//! - **Values are bytes**: the store never interprets document bodies
//! - **Async by default**: every operation may block on network I/O
//! - **No prefix scans**: range access goes through views exclusively
//! - **No retries**: a failed call surfaces immediately to the caller
//!
//! Connection pooling, cluster topology and bucket management stay inside
//! implementations.

use async_trait::async_trait;
use bytes::Bytes;

use crate::{
    error::StorageResult,
    types::ViewRow,
    view::{DesignDocument, ViewQuery},
};

/// Abstract document store for ticket persistence.
///
/// Implementations must be thread-safe (`Send + Sync`); a single handle is
/// shared by every concurrent registry operation.
///
/// # Key Operations
///
/// | Method | Description |
/// |--------|-------------|
/// | [`upsert`](DocumentStore::upsert) | Insert or overwrite a document with a TTL |
/// | [`get`](DocumentStore::get) | Fetch a live document by ID |
/// | [`remove`](DocumentStore::remove) | Delete a document, reporting whether it existed |
/// | [`query`](DocumentStore::query) | Range-query a view, optionally reduced |
/// | [`ensure_design_document`](DocumentStore::ensure_design_document) | Install views |
/// | [`shutdown`](DocumentStore::shutdown) | Release the connection |
///
/// # Example
///
/// ```
/// use ticket_registry_storage::{DocumentStore, MemoryStore};
///
/// # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
/// let store = MemoryStore::new();
///
/// store.upsert("TGT-1", b"ticket".to_vec(), 600).await.unwrap();
/// let value = store.get("TGT-1").await.unwrap();
/// assert_eq!(value.as_deref(), Some(b"ticket".as_slice()));
///
/// assert!(store.remove("TGT-1").await.unwrap());
/// assert!(!store.remove("TGT-1").await.unwrap());
/// # });
/// ```
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Human-readable store name (bucket name, `"memory"`, ...), used in logs.
    fn name(&self) -> &str;

    /// Inserts or overwrites a document.
    ///
    /// `ttl_seconds` is handed to the store verbatim; see
    /// [`Expiry::from_ttl_seconds`](crate::Expiry::from_ttl_seconds) for how
    /// its magnitude is interpreted. Overwriting replaces the previous TTL.
    ///
    /// # Errors
    ///
    /// - [`StorageError::SizeLimitExceeded`](crate::StorageError::SizeLimitExceeded) for
    ///   oversized IDs or values
    /// - [`StorageError::Closed`](crate::StorageError::Closed) after shutdown
    /// - connection/timeout errors from the underlying client
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn upsert(&self, id: &str, value: Vec<u8>, ttl_seconds: i64) -> StorageResult<()>;

    /// Fetches a document by ID.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(bytes))` if a live document exists
    /// - `Ok(None)` if it doesn't exist or has expired
    /// - `Err(...)` on storage errors
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn get(&self, id: &str) -> StorageResult<Option<Bytes>>;

    /// Removes a document.
    ///
    /// # Returns
    ///
    /// `Ok(true)` if a live document was removed, `Ok(false)` if there was
    /// nothing to remove.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn remove(&self, id: &str) -> StorageResult<bool>;

    /// Runs a range query against a view.
    ///
    /// Map queries return one row per matching document in key order. Reduced
    /// queries return a single aggregate row, or no rows at all when nothing
    /// matched.
    ///
    /// # Errors
    ///
    /// - [`StorageError::ViewNotFound`](crate::StorageError::ViewNotFound) if the
    ///   design document or view does not exist
    /// - [`StorageError::Internal`](crate::StorageError::Internal) if a reduction
    ///   was requested from a view without a reducer
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn query(&self, query: &ViewQuery) -> StorageResult<Vec<ViewRow>>;

    /// Installs (or replaces) a design document and its views.
    ///
    /// Idempotent: installing an identical design document again is a no-op.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn ensure_design_document(&self, design_document: &DesignDocument) -> StorageResult<()>;

    /// Releases the connection to the store.
    ///
    /// Subsequent operations fail with
    /// [`StorageError::Closed`](crate::StorageError::Closed). Calling
    /// `shutdown` more than once is harmless.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn shutdown(&self) -> StorageResult<()>;
}
