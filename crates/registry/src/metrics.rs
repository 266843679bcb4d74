//! Metrics collection for registry operations.
//!
//! Tracks operation counts, cumulative latencies, read outcomes and error
//! categories. Counters are relaxed atomics behind an `Arc`, so a
//! [`RegistryMetrics`] handle can be cloned into other tasks and read while
//! the registry is serving requests.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//!
//! use ticket_registry::{RegistryErrorKind, RegistryMetrics};
//!
//! let metrics = RegistryMetrics::new();
//! metrics.record_get(Duration::from_micros(120));
//! metrics.record_hit();
//! metrics.record_error(RegistryErrorKind::Timeout);
//!
//! let snapshot = metrics.snapshot();
//! assert_eq!(snapshot.get_count, 1);
//! assert_eq!(snapshot.hits, 1);
//! assert_eq!(snapshot.total_errors(), 1);
//! ```

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use ticket_registry_storage::StorageError;

use crate::error::RegistryError;

/// Error categories for registry operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryErrorKind {
    /// Connection or network error.
    Connection,
    /// Store call timed out.
    Timeout,
    /// Ticket encoding/decoding or store serialization error.
    Serialization,
    /// The index view or its design document is missing.
    ViewNotFound,
    /// The registry or store has been shut down.
    Closed,
    /// Anything else.
    Other,
}

impl RegistryErrorKind {
    /// Classifies a registry error.
    #[must_use]
    pub fn of(err: &RegistryError) -> Self {
        match err {
            RegistryError::Closed | RegistryError::Storage(StorageError::Closed) => Self::Closed,
            RegistryError::Codec(_)
            | RegistryError::Storage(StorageError::Serialization { .. }) => Self::Serialization,
            RegistryError::Storage(StorageError::Connection { .. }) => Self::Connection,
            RegistryError::Storage(StorageError::Timeout) => Self::Timeout,
            RegistryError::Storage(StorageError::ViewNotFound { .. }) => Self::ViewNotFound,
            _ => Self::Other,
        }
    }
}

/// Snapshot of registry metrics at a point in time.
#[derive(Debug, Clone, Default, bon::Builder)]
pub struct RegistryMetricsSnapshot {
    // Operation counts
    /// Total add_ticket operations.
    #[builder(default)]
    pub add_count: u64,
    /// Total update_ticket operations.
    #[builder(default)]
    pub update_count: u64,
    /// Total get_ticket operations.
    #[builder(default)]
    pub get_count: u64,
    /// Total get_tickets operations.
    #[builder(default)]
    pub list_count: u64,
    /// Total count operations.
    #[builder(default)]
    pub count_count: u64,
    /// Total delete_single_ticket operations.
    #[builder(default)]
    pub delete_count: u64,
    /// Total delete_all operations.
    #[builder(default)]
    pub delete_all_count: u64,

    // Latencies (cumulative microseconds)
    /// Total latency for add operations in microseconds.
    #[builder(default)]
    pub add_latency_us: u64,
    /// Total latency for update operations in microseconds.
    #[builder(default)]
    pub update_latency_us: u64,
    /// Total latency for get operations in microseconds.
    #[builder(default)]
    pub get_latency_us: u64,
    /// Total latency for list operations in microseconds.
    #[builder(default)]
    pub list_latency_us: u64,
    /// Total latency for count operations in microseconds.
    #[builder(default)]
    pub count_latency_us: u64,
    /// Total latency for delete operations in microseconds.
    #[builder(default)]
    pub delete_latency_us: u64,
    /// Total latency for delete_all operations in microseconds.
    #[builder(default)]
    pub delete_all_latency_us: u64,

    // Read outcomes
    /// Reads that returned a live ticket.
    #[builder(default)]
    pub hits: u64,
    /// Reads that found no document.
    #[builder(default)]
    pub misses: u64,
    /// Reads that found an expired ticket.
    #[builder(default)]
    pub expired: u64,
    /// Reads whose document decoded to nothing.
    #[builder(default)]
    pub undecodable: u64,

    // Error counts by category
    /// Connection errors.
    #[builder(default)]
    pub error_connection: u64,
    /// Timeout errors.
    #[builder(default)]
    pub error_timeout: u64,
    /// Serialization errors.
    #[builder(default)]
    pub error_serialization: u64,
    /// Missing index view errors.
    #[builder(default)]
    pub error_view_not_found: u64,
    /// Calls made after shutdown.
    #[builder(default)]
    pub error_closed: u64,
    /// Other errors.
    #[builder(default)]
    pub error_other: u64,
}

impl RegistryMetricsSnapshot {
    /// Returns the total number of operations.
    #[must_use]
    pub fn total_operations(&self) -> u64 {
        self.add_count
            + self.update_count
            + self.get_count
            + self.list_count
            + self.count_count
            + self.delete_count
            + self.delete_all_count
    }

    /// Returns the total number of errors.
    #[must_use]
    pub fn total_errors(&self) -> u64 {
        self.error_connection
            + self.error_timeout
            + self.error_serialization
            + self.error_view_not_found
            + self.error_closed
            + self.error_other
    }

    /// Returns the error rate as a fraction (0.0 to 1.0).
    #[must_use]
    pub fn error_rate(&self) -> f64 {
        let total = self.total_operations();
        if total == 0 { 0.0 } else { self.total_errors() as f64 / total as f64 }
    }

    /// Returns the fraction of single-ticket reads that found a live ticket.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let reads = self.hits + self.misses + self.expired + self.undecodable;
        if reads == 0 { 0.0 } else { self.hits as f64 / reads as f64 }
    }

    /// Returns the average get latency in microseconds.
    #[must_use]
    pub fn avg_get_latency_us(&self) -> f64 {
        if self.get_count == 0 { 0.0 } else { self.get_latency_us as f64 / self.get_count as f64 }
    }

    /// Returns the average add latency in microseconds.
    #[must_use]
    pub fn avg_add_latency_us(&self) -> f64 {
        if self.add_count == 0 { 0.0 } else { self.add_latency_us as f64 / self.add_count as f64 }
    }
}

#[derive(Default)]
struct RegistryMetricsInner {
    add_count: AtomicU64,
    update_count: AtomicU64,
    get_count: AtomicU64,
    list_count: AtomicU64,
    count_count: AtomicU64,
    delete_count: AtomicU64,
    delete_all_count: AtomicU64,

    add_latency_us: AtomicU64,
    update_latency_us: AtomicU64,
    get_latency_us: AtomicU64,
    list_latency_us: AtomicU64,
    count_latency_us: AtomicU64,
    delete_latency_us: AtomicU64,
    delete_all_latency_us: AtomicU64,

    hits: AtomicU64,
    misses: AtomicU64,
    expired: AtomicU64,
    undecodable: AtomicU64,

    error_connection: AtomicU64,
    error_timeout: AtomicU64,
    error_serialization: AtomicU64,
    error_view_not_found: AtomicU64,
    error_closed: AtomicU64,
    error_other: AtomicU64,
}

/// Metrics collector for registry operations.
///
/// Cloning shares the underlying counters.
#[derive(Clone, Default)]
pub struct RegistryMetrics {
    inner: Arc<RegistryMetricsInner>,
}

fn record(count: &AtomicU64, latency_us: &AtomicU64, duration: Duration) {
    let us = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
    count.fetch_add(1, Ordering::Relaxed);
    latency_us.fetch_add(us, Ordering::Relaxed);
}

impl RegistryMetrics {
    /// Creates a new metrics collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an add_ticket operation.
    pub fn record_add(&self, duration: Duration) {
        record(&self.inner.add_count, &self.inner.add_latency_us, duration);
    }

    /// Records an update_ticket operation.
    pub fn record_update(&self, duration: Duration) {
        record(&self.inner.update_count, &self.inner.update_latency_us, duration);
    }

    /// Records a get_ticket operation.
    pub fn record_get(&self, duration: Duration) {
        record(&self.inner.get_count, &self.inner.get_latency_us, duration);
    }

    /// Records a get_tickets operation.
    pub fn record_list(&self, duration: Duration) {
        record(&self.inner.list_count, &self.inner.list_latency_us, duration);
    }

    /// Records a count operation.
    pub fn record_count(&self, duration: Duration) {
        record(&self.inner.count_count, &self.inner.count_latency_us, duration);
    }

    /// Records a delete_single_ticket operation.
    pub fn record_delete(&self, duration: Duration) {
        record(&self.inner.delete_count, &self.inner.delete_latency_us, duration);
    }

    /// Records a delete_all operation.
    pub fn record_delete_all(&self, duration: Duration) {
        record(&self.inner.delete_all_count, &self.inner.delete_all_latency_us, duration);
    }

    /// Records a read that returned a live ticket.
    pub fn record_hit(&self) {
        self.inner.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a read that found no document.
    pub fn record_miss(&self) {
        self.inner.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a read that found an expired ticket.
    pub fn record_expired(&self) {
        self.inner.expired.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a read whose document decoded to nothing.
    pub fn record_undecodable(&self) {
        self.inner.undecodable.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an error by category.
    pub fn record_error(&self, kind: RegistryErrorKind) {
        let counter = match kind {
            RegistryErrorKind::Connection => &self.inner.error_connection,
            RegistryErrorKind::Timeout => &self.inner.error_timeout,
            RegistryErrorKind::Serialization => &self.inner.error_serialization,
            RegistryErrorKind::ViewNotFound => &self.inner.error_view_not_found,
            RegistryErrorKind::Closed => &self.inner.error_closed,
            RegistryErrorKind::Other => &self.inner.error_other,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a point-in-time snapshot.
    #[must_use]
    pub fn snapshot(&self) -> RegistryMetricsSnapshot {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        let inner = &self.inner;
        RegistryMetricsSnapshot::builder()
            .add_count(load(&inner.add_count))
            .update_count(load(&inner.update_count))
            .get_count(load(&inner.get_count))
            .list_count(load(&inner.list_count))
            .count_count(load(&inner.count_count))
            .delete_count(load(&inner.delete_count))
            .delete_all_count(load(&inner.delete_all_count))
            .add_latency_us(load(&inner.add_latency_us))
            .update_latency_us(load(&inner.update_latency_us))
            .get_latency_us(load(&inner.get_latency_us))
            .list_latency_us(load(&inner.list_latency_us))
            .count_latency_us(load(&inner.count_latency_us))
            .delete_latency_us(load(&inner.delete_latency_us))
            .delete_all_latency_us(load(&inner.delete_all_latency_us))
            .hits(load(&inner.hits))
            .misses(load(&inner.misses))
            .expired(load(&inner.expired))
            .undecodable(load(&inner.undecodable))
            .error_connection(load(&inner.error_connection))
            .error_timeout(load(&inner.error_timeout))
            .error_serialization(load(&inner.error_serialization))
            .error_view_not_found(load(&inner.error_view_not_found))
            .error_closed(load(&inner.error_closed))
            .error_other(load(&inner.error_other))
            .build()
    }

    /// Resets every counter to zero.
    pub fn reset(&self) {
        let inner = &self.inner;
        for counter in [
            &inner.add_count,
            &inner.update_count,
            &inner.get_count,
            &inner.list_count,
            &inner.count_count,
            &inner.delete_count,
            &inner.delete_all_count,
            &inner.add_latency_us,
            &inner.update_latency_us,
            &inner.get_latency_us,
            &inner.list_latency_us,
            &inner.count_latency_us,
            &inner.delete_latency_us,
            &inner.delete_all_latency_us,
            &inner.hits,
            &inner.misses,
            &inner.expired,
            &inner.undecodable,
            &inner.error_connection,
            &inner.error_timeout,
            &inner.error_serialization,
            &inner.error_view_not_found,
            &inner.error_closed,
            &inner.error_other,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }

    /// Logs the current snapshot at info level.
    pub fn log_metrics(&self) {
        let snapshot = self.snapshot();
        tracing::info!(
            total_operations = snapshot.total_operations(),
            total_errors = snapshot.total_errors(),
            error_rate = snapshot.error_rate(),
            hit_rate = snapshot.hit_rate(),
            avg_get_latency_us = snapshot.avg_get_latency_us(),
            expired = snapshot.expired,
            undecodable = snapshot.undecodable,
            error_view_not_found = snapshot.error_view_not_found,
            "ticket registry metrics"
        );
    }
}

impl std::fmt::Debug for RegistryMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("RegistryMetrics")
            .field("total_operations", &snapshot.total_operations())
            .field("total_errors", &snapshot.total_errors())
            .finish_non_exhaustive()
    }
}
