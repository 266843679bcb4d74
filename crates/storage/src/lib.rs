//! Document store abstraction for the ticket registry.
//!
//! This crate provides the [`DocumentStore`] trait and the view types the
//! registry uses to talk to a Couchbase-style document store: documents keyed
//! by string ID, store-side TTLs, and materialized views as the only way to
//! enumerate or count documents.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    ticket-registry                          │
//! │     TicketRegistry (add/get/update/delete/count/scan)       │
//! │        codec │ catalog │ index bridge │ TTL resolver        │
//! ├─────────────────────────────────────────────────────────────┤
//! │                 ticket-registry-storage                     │
//! │                  DocumentStore trait                        │
//! │  (upsert, get, remove, query, ensure_design_document)       │
//! ├──────────────┬──────────────────────────────────────────────┤
//! │ MemoryStore  │        cluster client (external)             │
//! │  (testing)   │            (production)                      │
//! └──────────────┴──────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```
//! use ticket_registry_storage::{DocumentStore, MemoryStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MemoryStore::new();
//!
//!     // Relative TTL of ten minutes
//!     store.upsert("TGT-1", b"{}".to_vec(), 600).await?;
//!
//!     let value = store.get("TGT-1").await?;
//!     assert_eq!(value.map(|b| b.to_vec()), Some(b"{}".to_vec()));
//!
//!     Ok(())
//! }
//! ```
//!
//! # Implementing a Store
//!
//! 1. Implement the [`DocumentStore`] trait
//! 2. Interpret write-time TTLs the way [`Expiry::from_ttl_seconds`] does
//! 3. Map client errors to [`StorageError`]
//! 4. Run the `conformance` suite against it
//!
//! See the [`memory`] module source for a reference implementation.
//!
//! # Feature Flags
//!
//! - **`testutil`**: Enables the `testutil` module (ID generators, a populated store factory, the
//!   fault-injecting [`testutil::FaultyStore`], assertion macros) and the `conformance` suite.
//!   Enable this in `[dev-dependencies]` for integration tests.

#![deny(unsafe_code)]

#[cfg(any(test, feature = "testutil"))]
#[allow(clippy::expect_used)]
pub mod conformance;
pub mod error;
pub mod expiry;
pub mod memory;
pub mod size_limits;
pub mod store;
#[cfg(any(test, feature = "testutil"))]
#[allow(clippy::expect_used)]
pub mod testutil;
pub mod types;
pub mod view;

// Re-export primary types at crate root for convenience
pub use error::{BoxError, ConfigError, StorageError, StorageResult};
pub use expiry::{Expiry, MAX_RELATIVE_TTL_SECS};
pub use memory::MemoryStore;
pub use size_limits::{
    DEFAULT_MAX_ID_SIZE, DEFAULT_MAX_VALUE_SIZE, SizeLimits, validate_id_size, validate_sizes,
};
pub use store::DocumentStore;
pub use types::{RowValue, ViewRow};
pub use view::{DesignDocument, MapFunction, Reducer, ViewDefinition, ViewQuery};
