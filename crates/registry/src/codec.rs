//! Ticket codec seam.
//!
//! The registry never serializes tickets itself. A [`TicketCodec`] turns a
//! ticket into the bytes stored in a document and back, and may also map a
//! ticket ID to the document ID it is stored under (for deployments that
//! hash or encrypt IDs at rest).

use std::{fmt, marker::PhantomData};

use serde::{Serialize, de::DeserializeOwned};

use crate::{error::CodecError, ticket::Ticket};

/// Encodes tickets to document bodies and decodes them back.
pub trait TicketCodec: Send + Sync {
    /// The ticket type this codec produces.
    type Ticket: Ticket;

    /// Encodes a ticket into a document body.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] if the ticket cannot be represented.
    fn encode(&self, ticket: &Self::Ticket) -> Result<Vec<u8>, CodecError>;

    /// Decodes a document body.
    ///
    /// `Ok(None)` means the body was readable but held no ticket.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] if the body is malformed.
    fn decode(&self, bytes: &[u8]) -> Result<Option<Self::Ticket>, CodecError>;

    /// Maps a ticket ID to its document ID.
    ///
    /// `None` means the ID cannot be encoded; lookups treat it as absent.
    fn encode_id(&self, id: &str) -> Option<String> {
        Some(id.to_owned())
    }
}

/// JSON codec for any serde ticket type.
///
/// # Examples
///
/// ```
/// use ticket_registry::{
///     JsonTicketCodec, StandardExpirationPolicy, TicketCodec, TicketKind, TicketRecord,
/// };
///
/// let codec = JsonTicketCodec::<TicketRecord>::new();
/// let ticket = TicketRecord::builder()
///     .id("ST-1")
///     .kind(TicketKind::ServiceTicket)
///     .expiration_policy(StandardExpirationPolicy::hard_timeout(10))
///     .build();
///
/// let bytes = codec.encode(&ticket).unwrap();
/// assert_eq!(codec.decode(&bytes).unwrap(), Some(ticket));
/// assert_eq!(codec.decode(b"null").unwrap(), None);
/// ```
pub struct JsonTicketCodec<T> {
    _ticket: PhantomData<fn() -> T>,
}

impl<T> JsonTicketCodec<T> {
    /// Creates a JSON codec.
    #[must_use]
    pub fn new() -> Self {
        Self { _ticket: PhantomData }
    }
}

impl<T> Default for JsonTicketCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonTicketCodec<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for JsonTicketCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonTicketCodec").field("ticket", &std::any::type_name::<T>()).finish()
    }
}

impl<T> TicketCodec for JsonTicketCodec<T>
where
    T: Ticket + Serialize + DeserializeOwned,
{
    type Ticket = T;

    fn encode(&self, ticket: &T) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(ticket).map_err(|e| {
            CodecError::with_source(format!("cannot encode ticket {}", ticket.id()), e)
        })
    }

    fn decode(&self, bytes: &[u8]) -> Result<Option<T>, CodecError> {
        serde_json::from_slice::<Option<T>>(bytes)
            .map_err(|e| CodecError::with_source("cannot decode ticket document", e))
    }
}
