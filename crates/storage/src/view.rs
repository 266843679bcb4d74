//! Materialized views: the secondary-index facility of a document store.
//!
//! A plain document store only answers "give me document `id`". Views add an
//! ordered, store-maintained projection over every document so callers can
//! run range scans and aggregates. A view is defined by a map function (what
//! each document emits) and an optional reducer (how rows are aggregated).
//! Views live inside named design documents.
//!
//! ```text
//! design document "statistics"
//! └── view "all_tickets"
//!     ├── map:    emit(meta.id)        one row per document, keyed by ID
//!     └── reduce: _count               number of rows in the range
//! ```
//!
//! Queries address a view by `(design document, view)` and select rows by
//! key range. Index maintenance is the store's job; a view may lag behind the
//! documents it indexes.

use std::collections::BTreeMap;

/// Map function applied to every document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapFunction {
    /// Emits one row per document with the document's ID as key and no value.
    EmitDocumentId,
}

impl MapFunction {
    /// JavaScript source of this map function, for stores that install views
    /// from source text.
    #[must_use]
    pub fn source(&self) -> &'static str {
        match self {
            Self::EmitDocumentId => "function(d,m) {emit(m.id);}",
        }
    }
}

/// Built-in reducer applied to map rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reducer {
    /// Counts the rows in the selected range.
    Count,
}

impl Reducer {
    /// Name of the built-in reducer as understood by view engines.
    #[must_use]
    pub fn source(&self) -> &'static str {
        match self {
            Self::Count => "_count",
        }
    }
}

/// A single view definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewDefinition {
    name: String,
    map: MapFunction,
    reduce: Option<Reducer>,
}

impl ViewDefinition {
    /// Creates a view definition.
    pub fn new(name: impl Into<String>, map: MapFunction, reduce: Option<Reducer>) -> Self {
        Self { name: name.into(), map, reduce }
    }

    /// View name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Map function.
    #[must_use]
    pub fn map(&self) -> MapFunction {
        self.map
    }

    /// Reducer, if the view supports aggregation.
    #[must_use]
    pub fn reduce(&self) -> Option<Reducer> {
        self.reduce
    }
}

/// A named group of views installed together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesignDocument {
    name: String,
    views: BTreeMap<String, ViewDefinition>,
}

impl DesignDocument {
    /// Creates a design document containing the given views.
    ///
    /// Later views replace earlier ones with the same name.
    pub fn new(name: impl Into<String>, views: impl IntoIterator<Item = ViewDefinition>) -> Self {
        let views = views.into_iter().map(|view| (view.name.clone(), view)).collect();
        Self { name: name.into(), views }
    }

    /// Design document name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks up a view by name.
    #[must_use]
    pub fn view(&self, name: &str) -> Option<&ViewDefinition> {
        self.views.get(name)
    }

    /// Iterates the views in name order.
    pub fn views(&self) -> impl Iterator<Item = &ViewDefinition> {
        self.views.values()
    }
}

/// A range query against a view.
///
/// Defaults follow view-engine conventions: end key inclusive, no reduction,
/// no document bodies, no limit.
///
/// # Examples
///
/// ```
/// use ticket_registry_storage::ViewQuery;
///
/// let query = ViewQuery::new("statistics", "all_tickets")
///     .start_key("ST-")
///     .end_key("ST-\u{02AD}")
///     .inclusive_end(false)
///     .reduce(true);
///
/// assert_eq!(query.design_document(), "statistics");
/// assert!(query.is_reduce());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewQuery {
    design_document: String,
    view: String,
    start_key: Option<String>,
    end_key: Option<String>,
    inclusive_end: bool,
    reduce: bool,
    include_docs: bool,
    limit: Option<usize>,
}

impl ViewQuery {
    /// Starts a query against `view` in `design_document`.
    pub fn new(design_document: impl Into<String>, view: impl Into<String>) -> Self {
        Self {
            design_document: design_document.into(),
            view: view.into(),
            start_key: None,
            end_key: None,
            inclusive_end: true,
            reduce: false,
            include_docs: false,
            limit: None,
        }
    }

    /// Sets the (inclusive) start key.
    #[must_use]
    pub fn start_key(mut self, key: impl Into<String>) -> Self {
        self.start_key = Some(key.into());
        self
    }

    /// Sets the end key.
    #[must_use]
    pub fn end_key(mut self, key: impl Into<String>) -> Self {
        self.end_key = Some(key.into());
        self
    }

    /// Controls whether the end key itself is part of the range.
    #[must_use]
    pub fn inclusive_end(mut self, inclusive: bool) -> Self {
        self.inclusive_end = inclusive;
        self
    }

    /// Requests the reduced aggregate instead of individual rows.
    #[must_use]
    pub fn reduce(mut self, reduce: bool) -> Self {
        self.reduce = reduce;
        self
    }

    /// Requests document bodies alongside map rows.
    #[must_use]
    pub fn include_docs(mut self, include: bool) -> Self {
        self.include_docs = include;
        self
    }

    /// Caps the number of map rows returned.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Design document name.
    #[must_use]
    pub fn design_document(&self) -> &str {
        &self.design_document
    }

    /// View name.
    #[must_use]
    pub fn view(&self) -> &str {
        &self.view
    }

    /// Start key, if set.
    #[must_use]
    pub fn start(&self) -> Option<&str> {
        self.start_key.as_deref()
    }

    /// End key, if set.
    #[must_use]
    pub fn end(&self) -> Option<&str> {
        self.end_key.as_deref()
    }

    /// Whether the end key is inclusive.
    #[must_use]
    pub fn is_inclusive_end(&self) -> bool {
        self.inclusive_end
    }

    /// Whether the query is reduced.
    #[must_use]
    pub fn is_reduce(&self) -> bool {
        self.reduce
    }

    /// Whether document bodies are requested.
    #[must_use]
    pub fn includes_docs(&self) -> bool {
        self.include_docs
    }

    /// Row limit, if set.
    #[must_use]
    pub fn row_limit(&self) -> Option<usize> {
        self.limit
    }
}
