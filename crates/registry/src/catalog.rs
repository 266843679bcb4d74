//! Ticket catalog: which ticket types exist and what their IDs start with.
//!
//! Enumerating and deleting tickets walks the catalog, issuing one index
//! range scan per definition. Prefixes must therefore partition the ID
//! space: no definition's ID prefix may be a prefix of another's, or the
//! same ticket would be visited twice.

use crate::{
    error::CatalogError,
    ticket::{ID_SEPARATOR, TicketKind},
};

/// One registered ticket type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketDefinition {
    prefix: String,
    kind: TicketKind,
}

impl TicketDefinition {
    /// Creates a definition for `kind` with an explicit prefix.
    pub fn new(prefix: impl Into<String>, kind: TicketKind) -> Self {
        Self { prefix: prefix.into(), kind }
    }

    /// Creates a definition using the kind's own prefix.
    #[must_use]
    pub fn for_kind(kind: TicketKind) -> Self {
        Self { prefix: kind.prefix().to_owned(), kind }
    }

    /// Type prefix, without separator.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Ticket kind.
    #[must_use]
    pub fn kind(&self) -> &TicketKind {
        &self.kind
    }

    /// Prefix plus separator, the string used for index range scans.
    #[must_use]
    pub fn id_prefix(&self) -> String {
        format!("{}{ID_SEPARATOR}", self.prefix)
    }
}

/// Read-only source of ticket definitions.
pub trait TicketCatalog: Send + Sync {
    /// Every registered definition, in registration order.
    fn find_all(&self) -> Vec<TicketDefinition>;

    /// The definition whose ID prefix matches `id`, if any.
    fn find_for_id(&self, id: &str) -> Option<TicketDefinition> {
        self.find_all().into_iter().find(|def| id.starts_with(&def.id_prefix()))
    }
}

/// In-process catalog validated at registration.
///
/// # Examples
///
/// ```
/// use ticket_registry::{DefaultTicketCatalog, TicketCatalog, TicketDefinition, TicketKind};
///
/// let mut catalog = DefaultTicketCatalog::standard();
/// catalog.register(TicketDefinition::new("OC", TicketKind::Custom("OC".into()))).unwrap();
///
/// assert_eq!(catalog.find_all().len(), 6);
/// assert!(catalog.register(TicketDefinition::for_kind(TicketKind::ServiceTicket)).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct DefaultTicketCatalog {
    definitions: Vec<TicketDefinition>,
}

impl DefaultTicketCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog of the five standard kinds: TGT, ST, PGT, PT, TST.
    #[must_use]
    pub fn standard() -> Self {
        let definitions = [
            TicketKind::TicketGrantingTicket,
            TicketKind::ServiceTicket,
            TicketKind::ProxyGrantingTicket,
            TicketKind::ProxyTicket,
            TicketKind::TransientSessionTicket,
        ]
        .into_iter()
        .map(TicketDefinition::for_kind)
        .collect();
        Self { definitions }
    }

    /// Builds a catalog from definitions, validating each in order.
    ///
    /// # Errors
    ///
    /// See [`register`](Self::register).
    pub fn with_definitions(
        definitions: impl IntoIterator<Item = TicketDefinition>,
    ) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        for definition in definitions {
            catalog.register(definition)?;
        }
        Ok(catalog)
    }

    /// Adds a definition.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::EmptyPrefix`] for an empty prefix
    /// - [`CatalogError::DuplicatePrefix`] if the prefix is already registered
    /// - [`CatalogError::AmbiguousPrefix`] if either ID prefix starts with the
    ///   other
    pub fn register(&mut self, definition: TicketDefinition) -> Result<(), CatalogError> {
        if definition.prefix.is_empty() {
            return Err(CatalogError::EmptyPrefix);
        }

        let candidate = definition.id_prefix();
        for existing in &self.definitions {
            if existing.prefix == definition.prefix {
                return Err(CatalogError::DuplicatePrefix { prefix: definition.prefix });
            }
            let registered = existing.id_prefix();
            if candidate.starts_with(&registered) {
                return Err(CatalogError::AmbiguousPrefix {
                    shorter: registered,
                    longer: candidate,
                });
            }
            if registered.starts_with(&candidate) {
                return Err(CatalogError::AmbiguousPrefix {
                    shorter: candidate,
                    longer: registered,
                });
            }
        }

        self.definitions.push(definition);
        Ok(())
    }
}

impl TicketCatalog for DefaultTicketCatalog {
    fn find_all(&self) -> Vec<TicketDefinition> {
        self.definitions.clone()
    }
}
