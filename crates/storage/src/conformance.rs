//! Conformance test suite for [`DocumentStore`] implementations.
//!
//! Each function validates one aspect of the trait contract the ticket
//! registry relies on. Every store (in-memory or a real cluster client) can
//! run the same suite.
//!
//! # Usage
//!
//! Enable the `testutil` feature and call each conformance function with a
//! fresh store instance:
//!
//! ```no_run
//! use ticket_registry_storage::{MemoryStore, conformance};
//!
//! #[tokio::test]
//! async fn get_missing_returns_none() {
//!     conformance::crud_get_missing_returns_none(&MemoryStore::new()).await;
//! }
//! ```
//!
//! # Test Categories
//!
//! | Category | Functions | Contract aspect |
//! |----------|-----------|-----------------|
//! | CRUD | 6 tests | upsert/get/remove semantics |
//! | TTL | 4 tests | store-side interpretation of write-time TTLs |
//! | View | 8 tests | design documents, range scans, `_count` reduction |
//! | Concurrent | 2 tests | thread-safety under parallel access |
//! | Lifecycle | 1 test | behavior after `shutdown` |
//!
//! Functions use disjoint ID prefixes so they can share a single store.

use std::{sync::Arc, time::Duration};

use bytes::Bytes;

use crate::{
    assert_closed, assert_view_not_found,
    store::DocumentStore,
    types::ViewRow,
    view::{DesignDocument, MapFunction, Reducer, ViewDefinition, ViewQuery},
};

/// Design document installed by the view checks.
pub const DESIGN_DOCUMENT: &str = "conformance";

/// View installed by the view checks.
pub const VIEW: &str = "by_id";

const END_TOKEN: char = '\u{02AD}';

fn design_document() -> DesignDocument {
    DesignDocument::new(
        DESIGN_DOCUMENT,
        [ViewDefinition::new(VIEW, MapFunction::EmitDocumentId, Some(Reducer::Count))],
    )
}

fn prefix_query(prefix: &str) -> ViewQuery {
    ViewQuery::new(DESIGN_DOCUMENT, VIEW)
        .start_key(prefix)
        .end_key(format!("{prefix}{END_TOKEN}"))
        .inclusive_end(false)
}

async fn install_view<S: DocumentStore + ?Sized>(store: &S) {
    store.ensure_design_document(&design_document()).await.expect("install design document");
}

fn row_ids(rows: &[ViewRow]) -> Vec<&str> {
    rows.iter().filter_map(|row| row.id.as_deref()).collect()
}

// ============================================================================
// CRUD
// ============================================================================

/// `get` on a nonexistent ID returns `Ok(None)`.
pub async fn crud_get_missing_returns_none<S: DocumentStore + ?Sized>(store: &S) {
    let result = store.get("CRUD-missing").await;
    assert!(result.is_ok(), "get should not error on missing id: {result:?}");
    assert_eq!(result.expect("checked above"), None);
}

/// `upsert` then `get` returns the stored bytes.
pub async fn crud_upsert_then_get<S: DocumentStore + ?Sized>(store: &S) {
    store.upsert("CRUD-1", b"v1".to_vec(), 0).await.expect("upsert");
    let value = store.get("CRUD-1").await.expect("get");
    assert_eq!(value, Some(Bytes::from("v1")));
}

/// `upsert` on an existing ID overwrites the value.
pub async fn crud_upsert_overwrites<S: DocumentStore + ?Sized>(store: &S) {
    store.upsert("CRUD-2", b"original".to_vec(), 0).await.expect("upsert");
    store.upsert("CRUD-2", b"updated".to_vec(), 0).await.expect("overwrite");
    let value = store.get("CRUD-2").await.expect("get");
    assert_eq!(value, Some(Bytes::from("updated")));
}

/// `remove` on a nonexistent ID reports `false` without erroring.
pub async fn crud_remove_missing_returns_false<S: DocumentStore + ?Sized>(store: &S) {
    let removed = store.remove("CRUD-ghost").await.expect("remove missing");
    assert!(!removed, "removing a missing document should report false");
}

/// `remove` reports `true` once, then the document is gone.
pub async fn crud_remove_existing<S: DocumentStore + ?Sized>(store: &S) {
    store.upsert("CRUD-3", b"v".to_vec(), 0).await.expect("upsert");
    assert!(store.remove("CRUD-3").await.expect("first remove"));
    assert!(!store.remove("CRUD-3").await.expect("second remove"));
    assert_eq!(store.get("CRUD-3").await.expect("get after remove"), None);
}

/// Large values (1 MiB) round-trip intact.
pub async fn crud_large_value_roundtrip<S: DocumentStore + ?Sized>(store: &S) {
    let big = vec![0xCDu8; 1_048_576];
    store.upsert("CRUD-big", big.clone(), 0).await.expect("upsert large value");
    let value = store.get("CRUD-big").await.expect("get large value");
    assert_eq!(value, Some(Bytes::from(big)));
}

// ============================================================================
// TTL
// ============================================================================

/// TTL `0` means the document never expires.
pub async fn ttl_zero_never_expires<S: DocumentStore + ?Sized>(store: &S) {
    store.upsert("TTL-forever", b"v".to_vec(), 0).await.expect("upsert");
    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert!(store.get("TTL-forever").await.expect("get").is_some());
}

/// A negative TTL makes the document invisible immediately.
pub async fn ttl_negative_is_immediately_expired<S: DocumentStore + ?Sized>(store: &S) {
    store.upsert("TTL-negative", b"v".to_vec(), -1).await.expect("upsert");
    assert_eq!(store.get("TTL-negative").await.expect("get"), None);
}

/// A short relative TTL expires.
pub async fn ttl_relative_expires<S: DocumentStore + ?Sized>(store: &S) {
    store.upsert("TTL-short", b"v".to_vec(), 1).await.expect("upsert");
    assert!(store.get("TTL-short").await.expect("get before expiry").is_some());

    tokio::time::sleep(Duration::from_millis(2100)).await;
    assert_eq!(store.get("TTL-short").await.expect("get after expiry"), None);
}

/// Overwriting a document replaces its TTL.
pub async fn ttl_overwrite_replaces_ttl<S: DocumentStore + ?Sized>(store: &S) {
    store.upsert("TTL-replaced", b"v".to_vec(), 1).await.expect("upsert short");
    store.upsert("TTL-replaced", b"v".to_vec(), 3_600).await.expect("upsert long");

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(store.get("TTL-replaced").await.expect("get").is_some());
}

// ============================================================================
// View
// ============================================================================

/// Querying a view that was never installed fails with `ViewNotFound`.
pub async fn view_missing_is_reported<S: DocumentStore + ?Sized>(store: &S) {
    let result = store.query(&ViewQuery::new("never-installed", VIEW)).await;
    assert_view_not_found!(result);
}

/// Installing the same design document twice succeeds.
pub async fn view_install_is_idempotent<S: DocumentStore + ?Sized>(store: &S) {
    install_view(store).await;
    install_view(store).await;
}

/// Map rows are returned in ascending key order.
pub async fn view_map_rows_are_ordered<S: DocumentStore + ?Sized>(store: &S) {
    install_view(store).await;
    for id in ["ORD-c", "ORD-a", "ORD-b"] {
        store.upsert(id, b"{}".to_vec(), 0).await.expect("upsert");
    }
    let rows = store.query(&prefix_query("ORD-")).await.expect("query");
    assert_eq!(row_ids(&rows), ["ORD-a", "ORD-b", "ORD-c"]);
}

/// The range `[P, P + end token)` selects exactly the IDs starting with `P`.
pub async fn view_prefix_range_is_exact<S: DocumentStore + ?Sized>(store: &S) {
    install_view(store).await;
    for id in ["PRE-1", "PRE-2", "PREX-1", "PRD-9"] {
        store.upsert(id, b"{}".to_vec(), 0).await.expect("upsert");
    }
    let rows = store.query(&prefix_query("PRE-")).await.expect("query");
    assert_eq!(row_ids(&rows), ["PRE-1", "PRE-2"]);
}

/// `include_docs` attaches document bodies to map rows.
pub async fn view_include_docs<S: DocumentStore + ?Sized>(store: &S) {
    install_view(store).await;
    store.upsert("DOC-1", b"body".to_vec(), 0).await.expect("upsert");

    let rows = store.query(&prefix_query("DOC-").include_docs(true)).await.expect("query");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].document, Some(Bytes::from("body")));
}

/// A reduced query yields one row carrying the count of the range.
pub async fn view_reduced_count<S: DocumentStore + ?Sized>(store: &S) {
    install_view(store).await;
    for i in 0..3 {
        store.upsert(&format!("CNT-{i}"), b"{}".to_vec(), 0).await.expect("upsert");
    }
    let rows = store.query(&prefix_query("CNT-").reduce(true)).await.expect("query");
    assert_eq!(rows.len(), 1, "reduced query should yield a single row");
    assert_eq!(rows[0].count(), Some(3));
}

/// A reduced query over an empty range yields no rows.
pub async fn view_reduced_empty_range<S: DocumentStore + ?Sized>(store: &S) {
    install_view(store).await;
    let rows = store.query(&prefix_query("EMPTY-").reduce(true)).await.expect("query");
    assert!(rows.is_empty(), "empty range should reduce to no rows: {rows:?}");
}

/// Expired documents do not appear in view results.
pub async fn view_excludes_expired<S: DocumentStore + ?Sized>(store: &S) {
    install_view(store).await;
    store.upsert("EXP-live", b"{}".to_vec(), 0).await.expect("upsert live");
    store.upsert("EXP-dead", b"{}".to_vec(), -1).await.expect("upsert expired");

    let rows = store.query(&prefix_query("EXP-")).await.expect("query");
    assert_eq!(row_ids(&rows), ["EXP-live"]);
}

// ============================================================================
// Concurrent
// ============================================================================

/// Concurrent upserts to distinct IDs all land.
pub async fn concurrent_upserts<S: DocumentStore + ?Sized + 'static>(store: Arc<S>) {
    let mut handles = Vec::new();
    for i in 0u32..50 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store.upsert(&format!("CONC-{i:04}"), b"v".to_vec(), 0).await.expect("upsert");
        }));
    }
    for handle in handles {
        handle.await.expect("task join");
    }

    for i in 0u32..50 {
        let id = format!("CONC-{i:04}");
        assert!(store.get(&id).await.expect("get").is_some(), "{id} should exist");
    }
}

/// Concurrent removals of one document: exactly one reports `true`.
pub async fn concurrent_remove_single_winner<S: DocumentStore + ?Sized + 'static>(store: Arc<S>) {
    store.upsert("RACE-1", b"v".to_vec(), 0).await.expect("upsert");

    let mut handles = Vec::new();
    for _ in 0..10 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move { store.remove("RACE-1").await.expect("remove") }));
    }

    let mut winners = 0;
    for handle in handles {
        if handle.await.expect("task join") {
            winners += 1;
        }
    }
    assert_eq!(winners, 1, "exactly one remover should win");
}

// ============================================================================
// Lifecycle
// ============================================================================

/// After `shutdown`, operations fail with `Closed` and `shutdown` stays
/// harmless.
pub async fn lifecycle_shutdown_closes_store<S: DocumentStore + ?Sized>(store: &S) {
    store.shutdown().await.expect("first shutdown");
    store.shutdown().await.expect("second shutdown");

    assert_closed!(store.get("LIFE-1").await);
    assert_closed!(store.upsert("LIFE-1", Vec::new(), 0).await);
    assert_closed!(store.remove("LIFE-1").await);
    assert_closed!(store.query(&prefix_query("LIFE-")).await);
}

// ============================================================================
// Convenience runner
// ============================================================================

/// Runs the full conformance suite against the given store.
///
/// The lifecycle check runs last and leaves the store closed.
///
/// ```no_run
/// use std::sync::Arc;
/// use ticket_registry_storage::{MemoryStore, conformance};
///
/// #[tokio::test]
/// async fn memory_store_conformance() {
///     conformance::run_all(Arc::new(MemoryStore::new())).await;
/// }
/// ```
pub async fn run_all<S: DocumentStore + ?Sized + 'static>(store: Arc<S>) {
    // CRUD
    crud_get_missing_returns_none(store.as_ref()).await;
    crud_upsert_then_get(store.as_ref()).await;
    crud_upsert_overwrites(store.as_ref()).await;
    crud_remove_missing_returns_false(store.as_ref()).await;
    crud_remove_existing(store.as_ref()).await;
    crud_large_value_roundtrip(store.as_ref()).await;

    // TTL
    ttl_zero_never_expires(store.as_ref()).await;
    ttl_negative_is_immediately_expired(store.as_ref()).await;
    ttl_relative_expires(store.as_ref()).await;
    ttl_overwrite_replaces_ttl(store.as_ref()).await;

    // View
    view_missing_is_reported(store.as_ref()).await;
    view_install_is_idempotent(store.as_ref()).await;
    view_map_rows_are_ordered(store.as_ref()).await;
    view_prefix_range_is_exact(store.as_ref()).await;
    view_include_docs(store.as_ref()).await;
    view_reduced_count(store.as_ref()).await;
    view_reduced_empty_range(store.as_ref()).await;
    view_excludes_expired(store.as_ref()).await;

    // Concurrent
    concurrent_upserts(Arc::clone(&store)).await;
    concurrent_remove_single_winner(Arc::clone(&store)).await;

    // Lifecycle
    lifecycle_shutdown_closes_store(store.as_ref()).await;
}
