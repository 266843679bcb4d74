//! End-to-end registry behaviour over `MemoryStore`.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::{collections::BTreeSet, sync::Arc};

use proptest::prelude::*;
use rstest::rstest;
use ticket_registry::{
    DefaultTicketCatalog, JsonTicketCodec, StandardExpirationPolicy, Ticket, TicketDefinition,
    TicketKind, TicketRecord, TicketRegistry,
    testutil::{memory_registry, service_ticket, ticket_granting_ticket, ticket_with_policy},
};
use ticket_registry_storage::{DocumentStore, MemoryStore};

#[tokio::test]
async fn session_lifecycle_scenario() {
    let (registry, _store) = memory_registry().await;
    let tgt = ticket_granting_ticket("TGT-1", "casuser", 600);

    registry.add_ticket(&tgt).await;
    assert_eq!(registry.get_ticket("TGT-1").await, Some(tgt));
    assert_eq!(registry.session_count().await, 1);

    assert!(registry.delete_single_ticket("TGT-1").await);
    assert_eq!(registry.get_ticket("TGT-1").await, None);
    assert_eq!(registry.session_count().await, 0);
}

#[tokio::test]
async fn delete_all_reports_every_removed_ticket() {
    let (registry, store) = memory_registry().await;
    for i in 1..=3 {
        registry.add_ticket(&service_ticket(&format!("ST-{i}"), "https://app", 600)).await;
    }
    for i in 1..=2 {
        registry.add_ticket(&ticket_granting_ticket(&format!("TGT-{i}"), "casuser", 600)).await;
    }

    assert_eq!(registry.delete_all().await, 5);
    assert!(registry.get_tickets().await.is_empty());
    assert!(store.is_empty());
}

#[tokio::test]
async fn delete_all_leaves_unregistered_prefixes_alone() {
    let (registry, store) = memory_registry().await;
    registry.add_ticket(&service_ticket("ST-1", "https://app", 600)).await;
    store.upsert("OTHER-1", b"{}".to_vec(), 0).await.unwrap();

    assert_eq!(registry.delete_all().await, 1);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn get_tickets_spans_every_definition() {
    let (registry, _store) = memory_registry().await;
    let ids = ["TGT-1", "ST-1", "PGT-1", "PT-1", "TST-1"];
    for id in ids {
        let ticket = ticket_with_policy(id, StandardExpirationPolicy::hard_timeout(60));
        registry.add_ticket(&ticket).await;
    }

    let found: BTreeSet<_> =
        registry.get_tickets().await.iter().map(|ticket| ticket.id().to_owned()).collect();
    assert_eq!(found, ids.iter().map(|id| (*id).to_owned()).collect());
}

#[tokio::test]
async fn get_tickets_only_visits_catalog_prefixes() {
    let store = MemoryStore::new();
    let catalog = DefaultTicketCatalog::with_definitions([TicketDefinition::for_kind(
        TicketKind::ServiceTicket,
    )])
    .unwrap();
    let registry = TicketRegistry::builder()
        .store(Arc::new(store.clone()))
        .catalog(Arc::new(catalog))
        .codec(JsonTicketCodec::<TicketRecord>::new())
        .build()
        .unwrap();
    registry.startup().await.unwrap();

    registry.add_ticket(&service_ticket("ST-1", "https://app", 60)).await;
    registry.add_ticket(&ticket_granting_ticket("TGT-1", "casuser", 60)).await;

    let tickets = registry.get_tickets().await;
    assert_eq!(tickets.len(), 1);
    assert_eq!(tickets[0].id, "ST-1");
    // Counts address prefixes directly and do not consult the catalog.
    assert_eq!(registry.session_count().await, 1);
}

#[tokio::test]
async fn update_twice_is_idempotent() {
    let (registry, _store) = memory_registry().await;
    let mut tgt = ticket_granting_ticket("TGT-9", "casuser", 600);

    let first = registry.update_ticket(tgt.clone()).await;
    assert_eq!(registry.get_ticket("TGT-9").await, Some(first.clone()));

    let second = registry.update_ticket(first).await;
    assert_eq!(registry.get_ticket("TGT-9").await, Some(second));

    tgt.attributes.insert("authn_method".into(), "mfa".into());
    registry.update_ticket(tgt.clone()).await;
    assert_eq!(registry.get_ticket("TGT-9").await, Some(tgt));
    assert_eq!(registry.session_count().await, 1);
}

#[tokio::test]
async fn expired_policy_hides_ticket_the_store_still_holds() {
    let (registry, store) = memory_registry().await;
    let stale = TicketRecord::builder()
        .id("ST-old")
        .kind(TicketKind::ServiceTicket)
        .expiration_policy(StandardExpirationPolicy::HardTimeout {
            time_to_live_seconds: 600,
            issued_at: chrono::Utc::now() - chrono::TimeDelta::seconds(720),
        })
        .build();
    registry.add_ticket(&stale).await;

    assert!(store.get("ST-old").await.unwrap().is_some());
    assert_eq!(registry.get_ticket("ST-old").await, None);
    assert!(registry.get_tickets().await.is_empty());
    // Counts come from the index and still include it.
    assert_eq!(registry.service_ticket_count().await, 1);
}

#[rstest]
#[case::tgt("TGT-", 2)]
#[case::st("ST-", 3)]
#[case::pt("PT-", 1)]
#[case::pgt("PGT-", 0)]
#[case::unknown("ZZ-", 0)]
#[tokio::test]
async fn count_tickets_by_prefix(#[case] prefix: &str, #[case] expected: u64) {
    let (registry, _store) = memory_registry().await;
    for id in ["TGT-1", "TGT-2", "ST-1", "ST-2", "ST-3", "PT-1", "TST-1"] {
        registry.add_ticket(&ticket_with_policy(id, StandardExpirationPolicy::NeverExpires)).await;
    }

    assert_eq!(registry.count_tickets(prefix).await, expected);
}

#[tokio::test]
async fn delete_single_ticket_reports_absence() {
    let (registry, _store) = memory_registry().await;
    assert!(!registry.delete_single_ticket("ST-missing").await);

    registry.add_ticket(&service_ticket("ST-1", "https://app", 60)).await;
    assert!(registry.delete_single_ticket("ST-1").await);
    assert!(!registry.delete_single_ticket("ST-1").await);
}

#[tokio::test]
async fn metrics_track_operations_and_outcomes() {
    let (registry, _store) = memory_registry().await;
    registry.add_ticket(&service_ticket("ST-1", "https://app", 60)).await;
    registry.get_ticket("ST-1").await;
    registry.get_ticket("ST-2").await;
    registry.service_ticket_count().await;

    let snapshot = registry.metrics();
    assert_eq!(snapshot.add_count, 1);
    assert_eq!(snapshot.get_count, 2);
    assert_eq!(snapshot.count_count, 1);
    assert_eq!(snapshot.hits, 1);
    assert_eq!(snapshot.misses, 1);
    assert_eq!(snapshot.total_errors(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writers_last_write_wins() {
    let (registry, _store) = memory_registry().await;
    let registry = Arc::new(registry);

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move {
                let mut ticket = ticket_granting_ticket("TGT-shared", "casuser", 600);
                ticket.attributes.insert("writer".into(), i.to_string());
                registry.update_ticket(ticket).await;
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    let ticket = registry.get_ticket("TGT-shared").await.unwrap();
    assert!(ticket.attributes.contains_key("writer"));
    assert_eq!(registry.session_count().await, 1);
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn counts_never_exceed_enumeration(
        tgts in 0usize..12,
        sts in 0usize..12,
        others in 0usize..6,
    ) {
        let (session, service, listed) = runtime().block_on(async {
            let (registry, _store) = memory_registry().await;
            for i in 0..tgts {
                registry.add_ticket(&ticket_granting_ticket(&format!("TGT-{i}"), "u", 600)).await;
            }
            for i in 0..sts {
                registry.add_ticket(&service_ticket(&format!("ST-{i}"), "https://app", 600)).await;
            }
            for i in 0..others {
                let ticket =
                    ticket_with_policy(&format!("PT-{i}"), StandardExpirationPolicy::NeverExpires);
                registry.add_ticket(&ticket).await;
            }

            let listed = registry
                .get_tickets()
                .await
                .into_iter()
                .filter(|ticket| {
                    matches!(
                        ticket.kind,
                        TicketKind::TicketGrantingTicket | TicketKind::ServiceTicket
                    )
                })
                .count() as u64;
            (registry.session_count().await, registry.service_ticket_count().await, listed)
        });

        prop_assert!(session + service <= listed);
        prop_assert_eq!(session, tgts as u64);
        prop_assert_eq!(service, sts as u64);
    }

    #[test]
    fn added_ticket_is_returned_unchanged(
        suffix in "[A-Za-z0-9]{1,24}",
        principal in "[a-z]{1,12}",
        ttl in 1i64..86_400,
    ) {
        let id = format!("TGT-{suffix}");
        let ticket = ticket_granting_ticket(&id, &principal, ttl);
        let fetched = runtime().block_on(async {
            let (registry, _store) = memory_registry().await;
            registry.add_ticket(&ticket).await;
            registry.get_ticket(&id).await
        });
        prop_assert_eq!(fetched, Some(ticket));
    }
}
