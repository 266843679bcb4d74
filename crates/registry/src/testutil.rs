//! Shared test utilities for ticket registry testing.
//!
//! Ticket factories and registry constructors over [`MemoryStore`] or any
//! other [`DocumentStore`]. Feature-gated behind `testutil`.
//!
//! ```no_run
//! // Requires the `testutil` feature to be enabled.
//! use ticket_registry::testutil::{memory_registry, service_ticket};
//! ```

use std::sync::Arc;

use ticket_registry_storage::{DocumentStore, MemoryStore};

use crate::{
    catalog::DefaultTicketCatalog,
    codec::JsonTicketCodec,
    registry::TicketRegistry,
    ticket::{StandardExpirationPolicy, TicketKind, TicketRecord},
};

/// Registry over the built-in JSON codec and [`TicketRecord`].
pub type JsonRegistry = TicketRegistry<JsonTicketCodec<TicketRecord>>;

/// Creates a ticket of the kind implied by its ID prefix.
#[must_use]
pub fn ticket_with_policy(id: &str, policy: StandardExpirationPolicy) -> TicketRecord {
    TicketRecord::builder().id(id).kind(TicketKind::for_id(id)).expiration_policy(policy).build()
}

/// Creates a ticket-granting ticket for `principal` with a hard timeout.
#[must_use]
pub fn ticket_granting_ticket(id: &str, principal: &str, ttl_seconds: i64) -> TicketRecord {
    TicketRecord::builder()
        .id(id)
        .kind(TicketKind::TicketGrantingTicket)
        .principal(principal)
        .expiration_policy(StandardExpirationPolicy::hard_timeout(ttl_seconds))
        .build()
}

/// Creates a service ticket for `service` with a hard timeout.
#[must_use]
pub fn service_ticket(id: &str, service: &str, ttl_seconds: i64) -> TicketRecord {
    TicketRecord::builder()
        .id(id)
        .kind(TicketKind::ServiceTicket)
        .service(service)
        .expiration_policy(StandardExpirationPolicy::hard_timeout(ttl_seconds))
        .build()
}

/// Builds a registry with the standard catalog and default configuration.
///
/// Startup is left to the caller.
///
/// # Panics
///
/// Panics if the default configuration is rejected (it is not).
pub fn registry_over(store: Arc<dyn DocumentStore>) -> JsonRegistry {
    TicketRegistry::builder()
        .store(store)
        .catalog(Arc::new(DefaultTicketCatalog::standard()))
        .codec(JsonTicketCodec::new())
        .build()
        .expect("default registry config is valid")
}

/// Builds and starts a registry over a fresh [`MemoryStore`].
///
/// The returned store shares data with the registry's.
///
/// # Panics
///
/// Panics if startup fails (should not happen with `MemoryStore`).
pub async fn memory_registry() -> (JsonRegistry, MemoryStore) {
    let store = MemoryStore::new();
    let registry = registry_over(Arc::new(store.clone()));
    registry.startup().await.expect("memory store startup failed");
    (registry, store)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ticket::Ticket;

    #[test]
    fn factories_set_kind_from_id() {
        assert_eq!(
            ticket_with_policy("PGT-1", StandardExpirationPolicy::NeverExpires).kind,
            TicketKind::ProxyGrantingTicket
        );
        let st = service_ticket("ST-1", "https://app.example.org", 10);
        assert_eq!(st.service.as_deref(), Some("https://app.example.org"));
        assert!(!st.is_expired());
    }

    #[tokio::test]
    async fn memory_registry_is_ready() {
        let (registry, store) = memory_registry().await;
        registry.add_ticket(&ticket_granting_ticket("TGT-1", "casuser", 60)).await;
        assert_eq!(store.len(), 1);
        assert_eq!(registry.session_count().await, 1);
    }
}
