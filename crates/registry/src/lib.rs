//! Distributed session-ticket registry.
//!
//! Persists authentication tickets (ticket-granting tickets, service tickets
//! and friends) in a shared document store so that every node of a
//! single-sign-on cluster sees the same sessions. Tickets are stored one
//! document per ticket with a store-side TTL, and a materialized view over
//! ticket IDs provides the prefix scans and counts the store cannot do
//! natively.
//!
//! # Components
//!
//! - [`TicketRegistry`]: the engine; add, update, get, enumerate, count and delete tickets
//! - [`TicketCatalog`]: which ticket types exist and their ID prefixes
//! - [`TicketCodec`]: ticket serialization, with [`JsonTicketCodec`] built in
//! - [`TtlResolver`]: policy to store TTL, flagging values stores read as timestamps
//! - [`TicketIndex`]: the ID view and its range queries
//! - [`TicketLookup`]: per-ticket read outcome
//! - [`RegistryMetrics`]: operation, outcome and error counters
//!
//! # Failure Model
//!
//! Apart from [`TicketRegistry::startup`], no operation returns an error.
//! Store and codec failures are logged with `tracing`, counted, and turned
//! into `None`, `false`, `0` or an empty vector. Enumeration and bulk delete
//! skip failing items and continue.
//!
//! # Feature Flags
//!
//! - **`testutil`**: Enables the `testutil` module (ticket factories and registry constructors)
//!   along with the storage crate's test utilities.

#![deny(unsafe_code)]

pub mod bridge;
pub mod catalog;
pub mod codec;
pub mod config;
pub mod error;
pub mod index;
pub mod lifecycle;
pub mod metrics;
pub mod outcome;
pub mod registry;
#[cfg(any(test, feature = "testutil"))]
#[allow(clippy::expect_used)]
pub mod testutil;
pub mod ticket;
pub mod ttl;

pub use bridge::CodecBridge;
pub use catalog::{DefaultTicketCatalog, TicketCatalog, TicketDefinition};
pub use codec::{JsonTicketCodec, TicketCodec};
pub use config::{DEFAULT_DESIGN_DOCUMENT, DEFAULT_END_TOKEN, DEFAULT_VIEW_NAME, RegistryConfig};
pub use error::{CatalogError, CodecError, RegistryError, RegistryResult};
pub use index::TicketIndex;
pub use lifecycle::LifecycleState;
pub use metrics::{RegistryErrorKind, RegistryMetrics, RegistryMetricsSnapshot};
pub use outcome::TicketLookup;
pub use registry::TicketRegistry;
pub use ticket::{
    ExpirationPolicy, ID_SEPARATOR, StandardExpirationPolicy, Ticket, TicketKind, TicketRecord,
};
pub use ttl::{DEFAULT_ABSOLUTE_TTL_THRESHOLD, ResolvedTtl, TtlResolver};
