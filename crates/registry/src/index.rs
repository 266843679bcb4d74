//! Secondary index over ticket IDs.
//!
//! The store offers no native prefix scan, so the registry installs a view
//! whose map function emits every document's ID and whose reducer counts
//! rows. A prefix `P` becomes the key range `[P, P + end_token)`.

use ticket_registry_storage::{
    DesignDocument, DocumentStore, MapFunction, Reducer, StorageResult, ViewDefinition, ViewQuery,
    ViewRow,
};

use crate::config::RegistryConfig;

/// Queries against the ticket index view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketIndex {
    design_document: String,
    view_name: String,
    end_token: char,
}

impl TicketIndex {
    /// Creates an index addressing `view_name` in `design_document`.
    pub fn new(
        design_document: impl Into<String>,
        view_name: impl Into<String>,
        end_token: char,
    ) -> Self {
        Self { design_document: design_document.into(), view_name: view_name.into(), end_token }
    }

    /// Creates an index from registry configuration.
    #[must_use]
    pub fn from_config(config: &RegistryConfig) -> Self {
        Self::new(config.design_document(), config.view_name(), config.end_token())
    }

    /// The design document to install for this index.
    #[must_use]
    pub fn design_document(&self) -> DesignDocument {
        DesignDocument::new(
            self.design_document.clone(),
            [ViewDefinition::new(
                self.view_name.clone(),
                MapFunction::EmitDocumentId,
                Some(Reducer::Count),
            )],
        )
    }

    fn range_query(&self, prefix: &str) -> ViewQuery {
        ViewQuery::new(self.design_document.as_str(), self.view_name.as_str())
            .start_key(prefix)
            .end_key(format!("{prefix}{}", self.end_token))
            .inclusive_end(false)
    }

    /// Rows for every document whose ID starts with `prefix`, with bodies.
    #[must_use]
    pub fn scan_query(&self, prefix: &str) -> ViewQuery {
        self.range_query(prefix).reduce(false).include_docs(true)
    }

    /// Rows for every document whose ID starts with `prefix`, IDs only.
    #[must_use]
    pub fn ids_query(&self, prefix: &str) -> ViewQuery {
        self.range_query(prefix).reduce(false)
    }

    /// Reduced count of documents whose ID starts with `prefix`.
    #[must_use]
    pub fn count_query(&self, prefix: &str) -> ViewQuery {
        self.range_query(prefix).reduce(true)
    }

    /// Runs [`scan_query`](Self::scan_query).
    ///
    /// # Errors
    ///
    /// Propagates the store's error, including
    /// [`StorageError::ViewNotFound`](ticket_registry_storage::StorageError::ViewNotFound).
    pub async fn scan(
        &self,
        store: &dyn DocumentStore,
        prefix: &str,
    ) -> StorageResult<Vec<ViewRow>> {
        store.query(&self.scan_query(prefix)).await
    }

    /// Runs [`ids_query`](Self::ids_query) and returns the document IDs.
    ///
    /// # Errors
    ///
    /// Propagates the store's error.
    pub async fn ids(&self, store: &dyn DocumentStore, prefix: &str) -> StorageResult<Vec<String>> {
        let rows = store.query(&self.ids_query(prefix)).await?;
        Ok(rows.into_iter().filter_map(|row| row.id).collect())
    }

    /// Runs [`count_query`](Self::count_query).
    ///
    /// An empty range produces no aggregate row and counts as zero.
    ///
    /// # Errors
    ///
    /// Propagates the store's error.
    pub async fn count(&self, store: &dyn DocumentStore, prefix: &str) -> StorageResult<u64> {
        let rows = store.query(&self.count_query(prefix)).await?;
        Ok(rows.first().and_then(ViewRow::count).unwrap_or(0))
    }
}
