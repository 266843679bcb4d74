//! Per-ticket read outcome.

use crate::error::RegistryError;

/// Result of reading one ticket.
///
/// Public registry operations collapse this to an `Option` or skip the item;
/// the variants exist so that logging, metrics and tests can tell the
/// not-found cases apart.
#[derive(Debug)]
pub enum TicketLookup<T> {
    /// A live, decoded ticket.
    Found(T),
    /// No document under the ID, or the ID cannot be encoded.
    Missing,
    /// The document decoded to a ticket that reports itself expired.
    Expired,
    /// The document decoded to nothing.
    Undecodable,
    /// The store or codec failed.
    Failed(RegistryError),
}

impl<T> TicketLookup<T> {
    /// Returns the ticket if one was found.
    pub fn into_ticket(self) -> Option<T> {
        match self {
            Self::Found(ticket) => Some(ticket),
            _ => None,
        }
    }

    /// Returns `true` for [`TicketLookup::Found`].
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// Returns the failure, if the lookup failed.
    pub fn error(&self) -> Option<&RegistryError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Short label recorded as the `outcome` field of lookup logs.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Found(_) => "found",
            Self::Missing => "missing",
            Self::Expired => "expired",
            Self::Undecodable => "undecodable",
            Self::Failed(_) => "failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_found_yields_a_ticket() {
        assert_eq!(TicketLookup::Found(7).into_ticket(), Some(7));
        assert_eq!(TicketLookup::<i32>::Missing.into_ticket(), None);
        assert_eq!(TicketLookup::<i32>::Expired.into_ticket(), None);
        assert_eq!(TicketLookup::<i32>::Undecodable.into_ticket(), None);
        assert_eq!(TicketLookup::<i32>::Failed(RegistryError::Closed).into_ticket(), None);
    }

    #[test]
    fn labels_and_errors() {
        let failed = TicketLookup::<()>::Failed(RegistryError::Closed);
        assert_eq!(failed.label(), "failed");
        assert!(failed.error().is_some_and(RegistryError::is_closed));
        assert!(TicketLookup::Found(()).is_found());
        assert!(TicketLookup::<()>::Expired.error().is_none());
    }
}
