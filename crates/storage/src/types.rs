//! Common types returned by document store queries.

use bytes::Bytes;

/// Value column of a view row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowValue {
    /// Map rows emit no value.
    Null,
    /// Aggregate produced by a counting reducer.
    Count(u64),
}

/// One row of a view query result.
///
/// Map rows carry the source document ID, the emitted key and, when the
/// query asked for them, the document body. A reduced query yields a single
/// row with no ID or key and a [`RowValue::Count`] value.
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use ticket_registry_storage::{RowValue, ViewRow};
///
/// let row = ViewRow::mapped("ST-1", Some(Bytes::from_static(b"{}")));
/// assert_eq!(row.id.as_deref(), Some("ST-1"));
/// assert_eq!(row.value, RowValue::Null);
///
/// let total = ViewRow::reduced(3);
/// assert_eq!(total.count(), Some(3));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewRow {
    /// ID of the document that emitted this row.
    pub id: Option<String>,
    /// Emitted key.
    pub key: Option<String>,
    /// Emitted or reduced value.
    pub value: RowValue,
    /// Document body, present only when the query included documents.
    pub document: Option<Bytes>,
}

impl ViewRow {
    /// Creates a map row whose key is the document's own ID.
    pub fn mapped(id: impl Into<String>, document: Option<Bytes>) -> Self {
        let id = id.into();
        Self { key: Some(id.clone()), id: Some(id), value: RowValue::Null, document }
    }

    /// Creates the single aggregate row of a reduced query.
    #[must_use]
    pub fn reduced(count: u64) -> Self {
        Self { id: None, key: None, value: RowValue::Count(count), document: None }
    }

    /// Returns the reduced count carried by this row, if any.
    #[must_use]
    pub fn count(&self) -> Option<u64> {
        match self.value {
            RowValue::Count(count) => Some(count),
            RowValue::Null => None,
        }
    }
}
