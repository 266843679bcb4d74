//! Shared test utilities for document store testing.
//!
//! This module provides helpers for building populated stores, injecting
//! store failures, and asserting on [`StorageResult`] values. It is
//! feature-gated behind `testutil` to prevent leaking into production builds.
//!
//! # Usage
//!
//! In integration tests, enable the feature in `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! ticket-registry-storage = { path = "../storage", features = ["testutil"] }
//! ```
//!
//! Then import helpers:
//!
//! ```no_run
//! // Requires the `testutil` feature to be enabled.
//! use ticket_registry_storage::testutil::{FaultyStore, make_id, populated_store};
//! ```

use std::{
    collections::BTreeSet,
    sync::atomic::{AtomicBool, AtomicU64, Ordering},
};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;

use crate::{
    error::{StorageError, StorageResult},
    memory::MemoryStore,
    store::DocumentStore,
    types::ViewRow,
    view::{DesignDocument, ViewQuery},
};

/// Creates a deterministic document ID from a prefix and index.
///
/// Produces IDs like `"ST-000042"` (zero-padded to 6 digits) so that
/// lexicographic ordering matches numeric ordering.
#[must_use]
pub fn make_id(prefix: &str, idx: usize) -> String {
    format!("{prefix}-{idx:06}")
}

/// Creates a test value of the given size filled with `0xAB` bytes.
#[must_use]
pub fn make_value(size: usize) -> Vec<u8> {
    vec![0xAB; size]
}

/// Creates a [`MemoryStore`] pre-populated with `count` documents that never
/// expire.
///
/// IDs are formatted by [`make_id`]; each value is `value_size` bytes.
///
/// # Panics
///
/// Panics if any `upsert` fails (should not happen with `MemoryStore`).
pub async fn populated_store(prefix: &str, count: usize, value_size: usize) -> MemoryStore {
    let store = MemoryStore::new();
    let value = make_value(value_size);
    for i in 0..count {
        store.upsert(&make_id(prefix, i), value.clone(), 0).await.expect("populate upsert failed");
    }
    store
}

/// Operations a [`FaultyStore`] can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultPoint {
    /// [`DocumentStore::upsert`].
    Upsert,
    /// [`DocumentStore::get`].
    Get,
    /// [`DocumentStore::remove`].
    Remove,
    /// [`DocumentStore::query`].
    Query,
    /// [`DocumentStore::ensure_design_document`].
    EnsureDesignDocument,
}

#[derive(Default)]
struct Faults {
    upsert: AtomicBool,
    get: AtomicBool,
    remove: AtomicBool,
    query: AtomicBool,
    ensure_design_document: AtomicBool,
    failing_ids: RwLock<BTreeSet<String>>,
    injected: AtomicU64,
}

impl Faults {
    fn flag(&self, point: FaultPoint) -> &AtomicBool {
        match point {
            FaultPoint::Upsert => &self.upsert,
            FaultPoint::Get => &self.get,
            FaultPoint::Remove => &self.remove,
            FaultPoint::Query => &self.query,
            FaultPoint::EnsureDesignDocument => &self.ensure_design_document,
        }
    }
}

/// A [`DocumentStore`] wrapper that fails selected operations on demand.
///
/// Failures surface as [`StorageError::Connection`], the way a dropped
/// cluster connection would. Faults can target a whole operation
/// ([`fail`](Self::fail)) or every operation on one document ID
/// ([`fail_id`](Self::fail_id)).
///
/// ```no_run
/// // Requires the `testutil` feature to be enabled.
/// use ticket_registry_storage::{MemoryStore, testutil::{FaultPoint, FaultyStore}};
///
/// # async fn demo() {
/// let store = FaultyStore::new(MemoryStore::new());
/// store.fail(FaultPoint::Query);
/// store.fail_id("ST-2");
/// # }
/// ```
pub struct FaultyStore<S> {
    inner: S,
    faults: Faults,
}

impl<S: DocumentStore> FaultyStore<S> {
    /// Wraps `inner` with no faults enabled.
    pub fn new(inner: S) -> Self {
        Self { inner, faults: Faults::default() }
    }

    /// Returns the wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Makes every call to `point` fail.
    pub fn fail(&self, point: FaultPoint) {
        self.faults.flag(point).store(true, Ordering::SeqCst);
    }

    /// Stops failing calls to `point`.
    pub fn recover(&self, point: FaultPoint) {
        self.faults.flag(point).store(false, Ordering::SeqCst);
    }

    /// Makes `upsert`, `get` and `remove` fail for this document ID.
    pub fn fail_id(&self, id: impl Into<String>) {
        self.faults.failing_ids.write().insert(id.into());
    }

    /// Clears every fault.
    pub fn heal(&self) {
        for point in [
            FaultPoint::Upsert,
            FaultPoint::Get,
            FaultPoint::Remove,
            FaultPoint::Query,
            FaultPoint::EnsureDesignDocument,
        ] {
            self.recover(point);
        }
        self.faults.failing_ids.write().clear();
    }

    /// Number of failures injected so far.
    pub fn injected_failures(&self) -> u64 {
        self.faults.injected.load(Ordering::SeqCst)
    }

    fn check(&self, point: FaultPoint, id: Option<&str>) -> StorageResult<()> {
        let by_point = self.faults.flag(point).load(Ordering::SeqCst);
        let by_id = id.is_some_and(|id| self.faults.failing_ids.read().contains(id));
        if by_point || by_id {
            self.faults.injected.fetch_add(1, Ordering::SeqCst);
            return Err(StorageError::connection(format!("injected fault: {point:?}")));
        }
        Ok(())
    }
}

#[async_trait]
impl<S: DocumentStore> DocumentStore for FaultyStore<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn upsert(&self, id: &str, value: Vec<u8>, ttl_seconds: i64) -> StorageResult<()> {
        self.check(FaultPoint::Upsert, Some(id))?;
        self.inner.upsert(id, value, ttl_seconds).await
    }

    async fn get(&self, id: &str) -> StorageResult<Option<Bytes>> {
        self.check(FaultPoint::Get, Some(id))?;
        self.inner.get(id).await
    }

    async fn remove(&self, id: &str) -> StorageResult<bool> {
        self.check(FaultPoint::Remove, Some(id))?;
        self.inner.remove(id).await
    }

    async fn query(&self, query: &ViewQuery) -> StorageResult<Vec<ViewRow>> {
        self.check(FaultPoint::Query, None)?;
        self.inner.query(query).await
    }

    async fn ensure_design_document(&self, design_document: &DesignDocument) -> StorageResult<()> {
        self.check(FaultPoint::EnsureDesignDocument, None)?;
        self.inner.ensure_design_document(design_document).await
    }

    async fn shutdown(&self) -> StorageResult<()> {
        self.inner.shutdown().await
    }
}

/// Asserts that a [`StorageResult`] is `Ok`.
///
/// Returns the inner value on success, panics with a descriptive message
/// on failure.
///
/// # Examples
///
/// ```no_run
/// // Requires the `testutil` feature to be enabled.
/// use ticket_registry_storage::{StorageResult, assert_storage_ok};
///
/// let result: StorageResult<i32> = Ok(42);
/// let value = assert_storage_ok!(result);
/// assert_eq!(value, 42);
/// ```
#[macro_export]
macro_rules! assert_storage_ok {
    ($result:expr) => {
        match $result {
            Ok(val) => val,
            Err(e) => panic!("expected Ok, got StorageError: {e:?}"),
        }
    };
    ($result:expr, $msg:expr) => {
        match $result {
            Ok(val) => val,
            Err(e) => panic!("{}: expected Ok, got StorageError: {e:?}", $msg),
        }
    };
}

/// Asserts that a [`StorageResult`] is a [`StorageError::ViewNotFound`].
#[macro_export]
macro_rules! assert_view_not_found {
    ($result:expr) => {{
        let result = $result;
        assert!(
            matches!(result, Err($crate::error::StorageError::ViewNotFound { .. })),
            "expected StorageError::ViewNotFound, got: {:?}",
            result,
        );
    }};
}

/// Asserts that a [`StorageResult`] is a [`StorageError::Closed`].
#[macro_export]
macro_rules! assert_closed {
    ($result:expr) => {{
        let result = $result;
        assert!(
            matches!(result, Err($crate::error::StorageError::Closed)),
            "expected StorageError::Closed, got: {:?}",
            result,
        );
    }};
}

/// Returns `true` if the result is a transient (connection or timeout) error.
pub fn is_transient<T>(result: &StorageResult<T>) -> bool {
    matches!(result, Err(err) if err.is_transient())
}
