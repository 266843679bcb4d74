//! The ticket registry engine.
//!
//! [`TicketRegistry`] persists tickets in a [`DocumentStore`], one document
//! per ticket keyed by its (encoded) ID with a store-side TTL. Enumeration
//! and counting go through the [`TicketIndex`] view, one range query per
//! catalog definition.
//!
//! Failures never escape the public operations. A failed store or codec
//! call is logged, counted in [`RegistryMetrics`] and turned into the
//! operation's empty result: `None`, `false`, `0` or an empty vector. Batch
//! operations skip the failing item and keep going. [`startup`] is the one
//! fallible entry point.
//!
//! [`startup`]: TicketRegistry::startup

use std::{fmt, sync::Arc, time::Instant};

use ticket_registry_storage::{DocumentStore, ViewRow};

use crate::{
    bridge::CodecBridge,
    catalog::TicketCatalog,
    codec::TicketCodec,
    config::RegistryConfig,
    error::{CodecError, RegistryError, RegistryResult},
    index::TicketIndex,
    lifecycle::{Lifecycle, LifecycleState},
    metrics::{RegistryErrorKind, RegistryMetrics, RegistryMetricsSnapshot},
    outcome::TicketLookup,
    ticket::{Ticket, TicketKind},
    ttl::TtlResolver,
};

/// Distributed ticket registry over a document store.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use ticket_registry::{
///     DefaultTicketCatalog, JsonTicketCodec, StandardExpirationPolicy, TicketKind,
///     TicketRecord, TicketRegistry,
/// };
/// use ticket_registry_storage::MemoryStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let registry = TicketRegistry::builder()
///         .store(Arc::new(MemoryStore::new()))
///         .catalog(Arc::new(DefaultTicketCatalog::standard()))
///         .codec(JsonTicketCodec::<TicketRecord>::new())
///         .build()?;
///     registry.startup().await?;
///
///     let ticket = TicketRecord::builder()
///         .id("TGT-1")
///         .kind(TicketKind::TicketGrantingTicket)
///         .principal("casuser")
///         .expiration_policy(StandardExpirationPolicy::hard_timeout(600))
///         .build();
///     registry.add_ticket(&ticket).await;
///
///     assert_eq!(registry.get_ticket("TGT-1").await, Some(ticket));
///     assert_eq!(registry.session_count().await, 1);
///
///     registry.shutdown().await;
///     Ok(())
/// }
/// ```
pub struct TicketRegistry<C: TicketCodec> {
    store: Arc<dyn DocumentStore>,
    catalog: Arc<dyn TicketCatalog>,
    bridge: CodecBridge<C>,
    ttl: TtlResolver,
    index: TicketIndex,
    config: RegistryConfig,
    lifecycle: Lifecycle,
    metrics: RegistryMetrics,
}

#[bon::bon]
impl<C: TicketCodec> TicketRegistry<C> {
    /// Creates a registry over an already-connected store.
    ///
    /// # Arguments
    ///
    /// * `store` - Document store holding ticket documents.
    /// * `catalog` - Ticket definitions walked by enumeration and bulk delete.
    /// * `codec` - Ticket serialization.
    ///
    /// # Optional Fields
    ///
    /// * `config` - Index and TTL settings (default: [`RegistryConfig::default`]).
    /// * `metrics` - Shared metrics collector (default: a fresh one).
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Config`] if `config` fails validation.
    #[builder]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        catalog: Arc<dyn TicketCatalog>,
        codec: C,
        #[builder(default)] config: RegistryConfig,
        #[builder(default)] metrics: RegistryMetrics,
    ) -> RegistryResult<Self> {
        config.validate()?;

        Ok(Self {
            store,
            catalog,
            bridge: CodecBridge::new(codec),
            ttl: TtlResolver::new(config.absolute_ttl_threshold()),
            index: TicketIndex::from_config(&config),
            config,
            lifecycle: Lifecycle::new(),
            metrics,
        })
    }

    /// Installs the index design document if configured to.
    ///
    /// Idempotent. Call once before serving traffic.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Closed`] after [`shutdown`](Self::shutdown),
    /// or the store's error if the design document cannot be installed.
    #[tracing::instrument(skip(self), fields(store = self.store.name()))]
    pub async fn startup(&self) -> RegistryResult<()> {
        self.ensure_running()?;

        if !self.config.ensure_index_on_startup() {
            tracing::debug!("index installation disabled");
            return Ok(());
        }

        let design_document = self.index.design_document();
        if let Err(err) = self.store.ensure_design_document(&design_document).await {
            tracing::error!(
                design_document = design_document.name(),
                error = %err,
                "failed to install ticket index"
            );
            return Err(err.into());
        }

        tracing::info!(
            design_document = design_document.name(),
            view = self.config.view_name(),
            "ticket index installed"
        );
        Ok(())
    }

    /// Releases the store. Only the first call has any effect.
    ///
    /// Every later operation observes a closed registry and returns its
    /// empty result.
    #[tracing::instrument(skip(self))]
    pub async fn shutdown(&self) {
        if !self.lifecycle.begin_shutdown() {
            tracing::debug!("ticket registry already shut down");
            return;
        }

        match self.store.shutdown().await {
            Ok(()) => tracing::info!(store = self.store.name(), "ticket registry shut down"),
            Err(err) => tracing::error!(error = %err, "failed to release document store"),
        }
        self.metrics.log_metrics();
    }

    /// Persists a ticket, overwriting any document with the same ID.
    ///
    /// Best effort: failures are logged and counted, never returned.
    #[tracing::instrument(skip(self, ticket), fields(ticket_id = ticket.id()))]
    pub async fn add_ticket(&self, ticket: &C::Ticket) {
        let start = Instant::now();
        tracing::debug!("adding ticket");
        if let Err(err) = self.try_store(ticket).await {
            self.record_failure("add_ticket", &err);
        }
        self.metrics.record_add(start.elapsed());
    }

    /// Re-persists a ticket and hands it back.
    ///
    /// Same semantics as [`add_ticket`](Self::add_ticket): a blind
    /// overwrite, not a read-modify-write.
    #[tracing::instrument(skip(self, ticket), fields(ticket_id = ticket.id()))]
    pub async fn update_ticket(&self, ticket: C::Ticket) -> C::Ticket {
        let start = Instant::now();
        tracing::debug!("updating ticket");
        if let Err(err) = self.try_store(&ticket).await {
            self.record_failure("update_ticket", &err);
        }
        self.metrics.record_update(start.elapsed());
        ticket
    }

    /// Looks up a ticket, returning the detailed outcome.
    #[tracing::instrument(skip(self))]
    pub async fn lookup_ticket(&self, ticket_id: &str) -> TicketLookup<C::Ticket> {
        self.lookup(ticket_id).await
    }

    /// Returns the ticket if it exists, decodes and has not expired.
    #[tracing::instrument(skip(self))]
    pub async fn get_ticket(&self, ticket_id: &str) -> Option<C::Ticket> {
        self.lookup(ticket_id).await.into_ticket()
    }

    /// Returns every live, decodable ticket across all catalog definitions.
    ///
    /// A best-effort snapshot as fresh as the index. Expired and undecodable
    /// documents are skipped; a definition whose scan fails contributes
    /// nothing.
    #[tracing::instrument(skip(self))]
    pub async fn get_tickets(&self) -> Vec<C::Ticket> {
        let start = Instant::now();
        let mut tickets = Vec::new();

        if let Err(err) = self.ensure_running() {
            self.record_failure("get_tickets", &err);
        } else {
            for definition in self.catalog.find_all() {
                let prefix = definition.id_prefix();
                match self.index.scan(self.store.as_ref(), &prefix).await {
                    Ok(rows) => {
                        tickets.extend(rows.into_iter().filter_map(|row| self.decode_row(row)));
                    },
                    Err(err) => {
                        tracing::debug!(prefix, "skipping ticket definition");
                        self.record_failure("get_tickets", &err.into());
                    },
                }
            }
        }

        tracing::debug!(count = tickets.len(), "collected tickets");
        self.metrics.record_list(start.elapsed());
        tickets
    }

    /// Number of live ticket-granting tickets.
    #[tracing::instrument(skip(self))]
    pub async fn session_count(&self) -> u64 {
        self.count_tickets(&TicketKind::TicketGrantingTicket.id_prefix()).await
    }

    /// Number of live service tickets.
    #[tracing::instrument(skip(self))]
    pub async fn service_ticket_count(&self) -> u64 {
        self.count_tickets(&TicketKind::ServiceTicket.id_prefix()).await
    }

    /// Number of documents whose ID starts with `prefix`, per the index.
    ///
    /// Returns 0 if the count cannot be obtained.
    #[tracing::instrument(skip(self))]
    pub async fn count_tickets(&self, prefix: &str) -> u64 {
        let start = Instant::now();
        let count = match self.try_count(prefix).await {
            Ok(count) => count,
            Err(err) => {
                self.record_failure("count_tickets", &err);
                0
            },
        };
        self.metrics.record_count(start.elapsed());
        count
    }

    /// Removes one ticket. Returns `true` only if a document was removed.
    #[tracing::instrument(skip(self))]
    pub async fn delete_single_ticket(&self, ticket_id: &str) -> bool {
        let start = Instant::now();
        let removed = match self.try_delete(ticket_id).await {
            Ok(removed) => removed,
            Err(err) => {
                self.record_failure("delete_single_ticket", &err);
                false
            },
        };
        tracing::debug!(removed, "deleted ticket");
        self.metrics.record_delete(start.elapsed());
        removed
    }

    /// Removes every ticket of every catalog definition.
    ///
    /// Per definition, the index count is taken first and then every
    /// matching document is removed one by one. The returned total is the
    /// sum of those pre-removal counts, so concurrent writers can make it
    /// differ from what this call actually removed. A definition whose
    /// count fails, or whose rows cannot be enumerated after counting,
    /// contributes 0 because nothing of it was removed.
    #[tracing::instrument(skip(self))]
    pub async fn delete_all(&self) -> u64 {
        let start = Instant::now();
        let mut total = 0;

        if let Err(err) = self.ensure_running() {
            self.record_failure("delete_all", &err);
        } else {
            for definition in self.catalog.find_all() {
                total += self.delete_prefix(&definition.id_prefix()).await;
            }
        }

        tracing::info!(total, "deleted all tickets");
        self.metrics.record_delete_all(start.elapsed());
        total
    }

    /// Point-in-time metrics snapshot.
    #[must_use]
    pub fn metrics(&self) -> RegistryMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// The shared metrics collector.
    #[must_use]
    pub fn metrics_handle(&self) -> &RegistryMetrics {
        &self.metrics
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// Registry configuration.
    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// The ticket index used for scans and counts.
    #[must_use]
    pub fn index(&self) -> &TicketIndex {
        &self.index
    }

    /// The ticket codec.
    #[must_use]
    pub fn codec(&self) -> &C {
        self.bridge.codec()
    }

    fn ensure_running(&self) -> RegistryResult<()> {
        if self.lifecycle.is_running() { Ok(()) } else { Err(RegistryError::Closed) }
    }

    async fn try_store(&self, ticket: &C::Ticket) -> RegistryResult<()> {
        self.ensure_running()?;
        let storage_id = self.bridge.storage_id(ticket.id()).ok_or_else(|| {
            CodecError::new(format!("cannot encode ticket id {}", ticket.id()))
        })?;
        let ttl = self.ttl.resolve(ticket);
        let value = self.bridge.encode(ticket)?;
        self.store.upsert(&storage_id, value, ttl.seconds).await?;
        Ok(())
    }

    async fn lookup(&self, ticket_id: &str) -> TicketLookup<C::Ticket> {
        let start = Instant::now();
        let lookup = self.try_lookup(ticket_id).await;
        tracing::debug!(outcome = lookup.label(), "ticket looked up");

        match &lookup {
            TicketLookup::Found(_) => self.metrics.record_hit(),
            TicketLookup::Missing => self.metrics.record_miss(),
            other => self.note_unusable(ticket_id, other),
        }

        self.metrics.record_get(start.elapsed());
        lookup
    }

    async fn try_lookup(&self, ticket_id: &str) -> TicketLookup<C::Ticket> {
        if let Err(err) = self.ensure_running() {
            return TicketLookup::Failed(err);
        }
        let Some(storage_id) = self.bridge.storage_id(ticket_id) else {
            return TicketLookup::Missing;
        };
        match self.store.get(&storage_id).await {
            Ok(Some(bytes)) => self.bridge.decode(&bytes),
            Ok(None) => TicketLookup::Missing,
            Err(err) => TicketLookup::Failed(err.into()),
        }
    }

    fn decode_row(&self, row: ViewRow) -> Option<C::Ticket> {
        let ViewRow { id, document, .. } = row;
        let ticket_id = id.as_deref().unwrap_or_default();
        let lookup = match document {
            Some(bytes) => self.bridge.decode(&bytes),
            None => TicketLookup::Missing,
        };
        match lookup {
            TicketLookup::Found(ticket) => Some(ticket),
            TicketLookup::Missing => {
                tracing::debug!(ticket_id, "index row without document");
                None
            },
            other => {
                self.note_unusable(ticket_id, &other);
                None
            },
        }
    }

    fn note_unusable(&self, ticket_id: &str, lookup: &TicketLookup<C::Ticket>) {
        let outcome = lookup.label();
        match lookup {
            TicketLookup::Expired => {
                self.metrics.record_expired();
                tracing::warn!(ticket_id, outcome, "ticket has expired");
            },
            TicketLookup::Undecodable => {
                self.metrics.record_undecodable();
                tracing::warn!(ticket_id, outcome, "ticket document decoded to nothing");
            },
            TicketLookup::Failed(err) => self.record_failure("read_ticket", err),
            TicketLookup::Found(_) | TicketLookup::Missing => {},
        }
    }

    async fn try_count(&self, prefix: &str) -> RegistryResult<u64> {
        self.ensure_running()?;
        Ok(self.index.count(self.store.as_ref(), prefix).await?)
    }

    async fn try_delete(&self, ticket_id: &str) -> RegistryResult<bool> {
        self.ensure_running()?;
        let Some(storage_id) = self.bridge.storage_id(ticket_id) else {
            return Ok(false);
        };
        Ok(self.store.remove(&storage_id).await?)
    }

    async fn delete_prefix(&self, prefix: &str) -> u64 {
        let count = match self.index.count(self.store.as_ref(), prefix).await {
            Ok(count) => count,
            Err(err) => {
                self.record_failure("delete_all", &err.into());
                return 0;
            },
        };
        if count == 0 {
            return 0;
        }

        let ids = match self.index.ids(self.store.as_ref(), prefix).await {
            Ok(ids) => ids,
            Err(err) => {
                tracing::error!(prefix, count, "counted tickets could not be enumerated");
                self.record_failure("delete_all", &err.into());
                return 0;
            },
        };

        for id in ids {
            if let Err(err) = self.store.remove(&id).await {
                tracing::debug!(ticket_id = %id, "skipping ticket");
                self.record_failure("delete_all", &err.into());
            }
        }

        tracing::debug!(prefix, count, "deleted tickets");
        count
    }

    fn record_failure(&self, operation: &'static str, err: &RegistryError) {
        let kind = RegistryErrorKind::of(err);
        self.metrics.record_error(kind);
        match kind {
            RegistryErrorKind::Closed => {
                tracing::warn!(operation, "ticket registry is shut down");
            },
            RegistryErrorKind::ViewNotFound => {
                tracing::warn!(operation, error = %err, "ticket index is missing");
            },
            _ => tracing::error!(operation, error = %err, "ticket registry operation failed"),
        }
    }
}

impl<C: TicketCodec> fmt::Debug for TicketRegistry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TicketRegistry")
            .field("store", &self.store.name())
            .field("catalog", &self.catalog.find_all().len())
            .field("config", &self.config)
            .field("state", &self.lifecycle.state())
            .finish_non_exhaustive()
    }
}
