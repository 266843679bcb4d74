//! Failure containment: store and codec failures never escape a public
//! registry operation and never hide unrelated tickets.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use ticket_registry::{
    CodecError, DefaultTicketCatalog, JsonTicketCodec, RegistryError, StandardExpirationPolicy,
    TicketCodec, TicketKind, TicketLookup, TicketRecord, TicketRegistry,
    testutil::{
        JsonRegistry, memory_registry, registry_over, service_ticket, ticket_granting_ticket,
    },
};
use ticket_registry_storage::{
    DesignDocument, DocumentStore, MemoryStore, StorageError, StorageResult, ViewQuery, ViewRow,
    testutil::{FaultPoint, FaultyStore},
};

async fn faulty_registry() -> (JsonRegistry, Arc<FaultyStore<MemoryStore>>) {
    let store = Arc::new(FaultyStore::new(MemoryStore::new()));
    let registry = registry_over(store.clone());
    registry.startup().await.unwrap();
    (registry, store)
}

fn fail_everything(store: &FaultyStore<MemoryStore>) {
    for point in [
        FaultPoint::Upsert,
        FaultPoint::Get,
        FaultPoint::Remove,
        FaultPoint::Query,
        FaultPoint::EnsureDesignDocument,
    ] {
        store.fail(point);
    }
}

#[tokio::test]
async fn failing_store_yields_empty_results() {
    let (registry, store) = faulty_registry().await;
    registry.add_ticket(&service_ticket("ST-1", "https://app", 60)).await;
    fail_everything(&store);

    registry.add_ticket(&service_ticket("ST-2", "https://app", 60)).await;
    let updated = registry.update_ticket(service_ticket("ST-3", "https://app", 60)).await;
    assert_eq!(updated.id, "ST-3");

    assert_eq!(registry.get_ticket("ST-1").await, None);
    assert!(registry.get_tickets().await.is_empty());
    assert_eq!(registry.session_count().await, 0);
    assert_eq!(registry.service_ticket_count().await, 0);
    assert_eq!(registry.count_tickets("PT-").await, 0);
    assert!(!registry.delete_single_ticket("ST-1").await);
    assert_eq!(registry.delete_all().await, 0);

    let snapshot = registry.metrics();
    assert!(snapshot.error_connection >= 9, "got {snapshot:?}");
    assert_eq!(snapshot.error_other, 0);

    store.heal();
    assert!(registry.get_ticket("ST-1").await.is_some());
    assert!(registry.get_ticket("ST-2").await.is_none());
}

#[tokio::test]
async fn failed_lookup_reports_the_cause() {
    let (registry, store) = faulty_registry().await;
    store.fail(FaultPoint::Get);

    let lookup = registry.lookup_ticket("TGT-1").await;
    let err = lookup.error().expect("lookup should have failed");
    assert!(err.is_transient());
}

#[tokio::test]
async fn startup_surfaces_index_installation_failure() {
    let store = Arc::new(FaultyStore::new(MemoryStore::new()));
    store.fail(FaultPoint::EnsureDesignDocument);
    let registry = registry_over(store.clone());

    let err = registry.startup().await.unwrap_err();
    assert!(matches!(err, RegistryError::Storage(StorageError::Connection { .. })));

    store.heal();
    registry.startup().await.unwrap();
}

#[tokio::test]
async fn undecodable_document_does_not_hide_others() {
    let (registry, store) = memory_registry().await;
    registry.add_ticket(&service_ticket("ST-1", "https://app", 60)).await;
    registry.add_ticket(&service_ticket("ST-3", "https://app", 60)).await;
    store.upsert("ST-2", b"null".to_vec(), 0).await.unwrap();
    store.upsert("ST-4", b"\x00garbage".to_vec(), 0).await.unwrap();

    let ids: Vec<_> = registry.get_tickets().await.into_iter().map(|ticket| ticket.id).collect();
    assert_eq!(ids, ["ST-1", "ST-3"]);

    assert!(matches!(registry.lookup_ticket("ST-2").await, TicketLookup::Undecodable));
    assert!(matches!(
        registry.lookup_ticket("ST-4").await,
        TicketLookup::Failed(RegistryError::Codec(_))
    ));

    let snapshot = registry.metrics();
    assert_eq!(snapshot.undecodable, 2);
    assert_eq!(snapshot.error_serialization, 2);
}

#[tokio::test]
async fn out_of_range_timeouts_do_not_hide_other_tickets() {
    let (registry, store) = memory_registry().await;
    registry.add_ticket(&service_ticket("ST-1", "https://app", 60)).await;
    for (id, ttl) in [("TGT-forever", i64::MAX), ("TGT-past", i64::MIN)] {
        let ticket = ticket_granting_ticket(id, "casuser", ttl);
        let bytes = registry.codec().encode(&ticket).unwrap();
        store.upsert(id, bytes, 0).await.unwrap();
    }

    assert!(registry.get_ticket("TGT-forever").await.is_some());
    assert!(matches!(registry.lookup_ticket("TGT-past").await, TicketLookup::Expired));

    let mut ids: Vec<_> =
        registry.get_tickets().await.into_iter().map(|ticket| ticket.id).collect();
    ids.sort();
    assert_eq!(ids, ["ST-1", "TGT-forever"]);
}

#[tokio::test]
async fn expired_rows_are_excluded_from_enumeration() {
    let (registry, _store) = memory_registry().await;
    let revoked = TicketRecord::builder()
        .id("TGT-revoked")
        .kind(TicketKind::TicketGrantingTicket)
        .expiration_policy(StandardExpirationPolicy::AlwaysExpires)
        .build();
    registry.add_ticket(&revoked).await;
    registry.add_ticket(&ticket_granting_ticket("TGT-live", "casuser", 60)).await;

    let tickets = registry.get_tickets().await;
    assert_eq!(tickets.len(), 1);
    assert_eq!(tickets[0].id, "TGT-live");
    assert_eq!(registry.metrics().expired, 1);
}

#[tokio::test]
async fn missing_view_yields_zero_and_empty() {
    let (registry, store) = memory_registry().await;
    registry.add_ticket(&service_ticket("ST-1", "https://app", 60)).await;
    assert!(store.drop_design_document("statistics"));

    assert_eq!(registry.service_ticket_count().await, 0);
    assert!(registry.get_tickets().await.is_empty());
    assert_eq!(registry.delete_all().await, 0);
    // Direct reads do not need the index.
    assert!(registry.get_ticket("ST-1").await.is_some());
    assert!(registry.metrics().error_view_not_found >= 3);

    registry.startup().await.unwrap();
    assert_eq!(registry.service_ticket_count().await, 1);
}

#[tokio::test]
async fn failed_removal_is_skipped_during_delete_all() {
    let (registry, store) = faulty_registry().await;
    for id in ["ST-1", "ST-2", "ST-3"] {
        registry.add_ticket(&service_ticket(id, "https://app", 60)).await;
    }
    store.fail_id("ST-2");

    assert_eq!(registry.delete_all().await, 3);
    assert_eq!(store.inner().len(), 1);

    store.heal();
    assert!(registry.get_ticket("ST-2").await.is_some());
}

/// Answers reduced queries but fails every row scan.
struct ScanFailingStore {
    inner: MemoryStore,
}

#[async_trait]
impl DocumentStore for ScanFailingStore {
    fn name(&self) -> &str {
        "scan-failing"
    }

    async fn upsert(&self, id: &str, value: Vec<u8>, ttl_seconds: i64) -> StorageResult<()> {
        self.inner.upsert(id, value, ttl_seconds).await
    }

    async fn get(&self, id: &str) -> StorageResult<Option<Bytes>> {
        self.inner.get(id).await
    }

    async fn remove(&self, id: &str) -> StorageResult<bool> {
        self.inner.remove(id).await
    }

    async fn query(&self, query: &ViewQuery) -> StorageResult<Vec<ViewRow>> {
        if query.is_reduce() {
            self.inner.query(query).await
        } else {
            Err(StorageError::timeout())
        }
    }

    async fn ensure_design_document(&self, design_document: &DesignDocument) -> StorageResult<()> {
        self.inner.ensure_design_document(design_document).await
    }

    async fn shutdown(&self) -> StorageResult<()> {
        self.inner.shutdown().await
    }
}

#[tokio::test]
async fn delete_all_counts_nothing_when_rows_cannot_be_enumerated() {
    let inner = MemoryStore::new();
    let registry = registry_over(Arc::new(ScanFailingStore { inner: inner.clone() }));
    registry.startup().await.unwrap();
    registry.add_ticket(&service_ticket("ST-1", "https://app", 60)).await;

    assert_eq!(registry.service_ticket_count().await, 1);
    assert_eq!(registry.delete_all().await, 0);
    assert_eq!(inner.len(), 1);
    assert_eq!(registry.metrics().error_timeout, 1);
}

/// JSON codec that refuses to map IDs containing a slash.
struct SlashRejectingCodec(JsonTicketCodec<TicketRecord>);

impl TicketCodec for SlashRejectingCodec {
    type Ticket = TicketRecord;

    fn encode(&self, ticket: &TicketRecord) -> Result<Vec<u8>, CodecError> {
        self.0.encode(ticket)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Option<TicketRecord>, CodecError> {
        self.0.decode(bytes)
    }

    fn encode_id(&self, id: &str) -> Option<String> {
        (!id.contains('/')).then(|| id.to_owned())
    }
}

#[tokio::test]
async fn unencodable_id_is_treated_as_absent() {
    let store = MemoryStore::new();
    let registry = TicketRegistry::builder()
        .store(Arc::new(store.clone()))
        .catalog(Arc::new(DefaultTicketCatalog::standard()))
        .codec(SlashRejectingCodec(JsonTicketCodec::new()))
        .build()
        .unwrap();
    registry.startup().await.unwrap();

    registry.add_ticket(&service_ticket("ST-a/b", "https://app", 60)).await;
    assert!(store.is_empty());
    assert_eq!(registry.metrics().error_serialization, 1);

    assert!(matches!(registry.lookup_ticket("ST-a/b").await, TicketLookup::Missing));
    assert!(!registry.delete_single_ticket("ST-a/b").await);

    registry.add_ticket(&service_ticket("ST-ok", "https://app", 60)).await;
    assert!(registry.get_ticket("ST-ok").await.is_some());
}
