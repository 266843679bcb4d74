//! Error types for the ticket registry.
//!
//! Public engine operations never return these: failures are logged,
//! counted and folded into not-found-shaped results. They surface through
//! [`TicketLookup::Failed`](crate::TicketLookup::Failed), the fallible
//! [`TicketRegistry::startup`](crate::TicketRegistry::startup), and the
//! configuration and catalog constructors.

use std::sync::Arc;

use thiserror::Error;
use ticket_registry_storage::{BoxError, ConfigError, StorageError};

/// Result type alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors raised while persisting or loading tickets.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum RegistryError {
    /// The document store rejected or failed the call.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A ticket could not be encoded or decoded.
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// The registry has been shut down.
    #[error("Ticket registry is shut down")]
    Closed,

    /// Invalid registry configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl RegistryError {
    /// Returns `true` for store failures that may succeed on a later call.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Storage(err) if err.is_transient())
    }

    /// Returns `true` if the registry or its store has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed | Self::Storage(StorageError::Closed))
    }
}

/// A ticket codec failed to encode or decode a ticket.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct CodecError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl CodecError {
    /// Creates a codec error with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), source: None }
    }

    /// Creates a codec error with a message and source error.
    #[must_use]
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self { message: message.into(), source: Some(Arc::new(source)) }
    }

    /// Returns the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A ticket catalog rejected a definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum CatalogError {
    /// The prefix is empty.
    #[error("ticket prefix must not be empty")]
    EmptyPrefix,

    /// The prefix is already registered.
    #[error("ticket prefix {prefix:?} is already registered")]
    DuplicatePrefix {
        /// The duplicated prefix.
        prefix: String,
    },

    /// One ID prefix would also match the IDs of another definition.
    #[error("ticket ID prefix {shorter:?} overlaps {longer:?}")]
    AmbiguousPrefix {
        /// The ID prefix that is a proper prefix of `longer`.
        shorter: String,
        /// The overlapped ID prefix.
        longer: String,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn storage_errors_convert_and_classify() {
        let err: RegistryError = StorageError::timeout().into();
        assert!(err.is_transient());
        assert!(!err.is_closed());

        let err: RegistryError = StorageError::Closed.into();
        assert!(err.is_closed());
        assert!(RegistryError::Closed.is_closed());
    }

    #[test]
    fn codec_error_keeps_source() {
        let json = serde_json::from_str::<u8>("not json").unwrap_err();
        let err = CodecError::with_source("cannot decode ticket", json);
        assert_eq!(err.to_string(), "cannot decode ticket");
        assert!(err.source().is_some());
    }

    #[test]
    fn catalog_error_display() {
        let err = CatalogError::AmbiguousPrefix { shorter: "ST-".into(), longer: "ST-X-".into() };
        assert_eq!(err.to_string(), "ticket ID prefix \"ST-\" overlaps \"ST-X-\"");
    }
}
