//! Codec bridge: encodes on the way into the store, decodes and checks
//! freshness on the way out.

use crate::{
    codec::TicketCodec,
    error::{RegistryError, RegistryResult},
    outcome::TicketLookup,
    ticket::Ticket,
};

/// Wraps a [`TicketCodec`] with the registry's read-side rules.
#[derive(Debug, Clone)]
pub struct CodecBridge<C> {
    codec: C,
}

impl<C: TicketCodec> CodecBridge<C> {
    /// Wraps `codec`.
    pub fn new(codec: C) -> Self {
        Self { codec }
    }

    /// The wrapped codec.
    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Document ID for a ticket ID, or `None` if the codec cannot encode it.
    pub fn storage_id(&self, ticket_id: &str) -> Option<String> {
        self.codec.encode_id(ticket_id)
    }

    /// Encodes a ticket body.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Codec`] if the codec fails.
    pub fn encode(&self, ticket: &C::Ticket) -> RegistryResult<Vec<u8>> {
        self.codec.encode(ticket).map_err(RegistryError::from)
    }

    /// Decodes a document body into a lookup outcome.
    ///
    /// A body that decodes to nothing is [`TicketLookup::Undecodable`]; a
    /// ticket that reports itself expired is [`TicketLookup::Expired`].
    pub fn decode(&self, bytes: &[u8]) -> TicketLookup<C::Ticket> {
        match self.codec.decode(bytes) {
            Ok(Some(ticket)) if ticket.is_expired() => TicketLookup::Expired,
            Ok(Some(ticket)) => TicketLookup::Found(ticket),
            Ok(None) => TicketLookup::Undecodable,
            Err(err) => TicketLookup::Failed(err.into()),
        }
    }
}
