//! Table row records.
//!
//! A [`TableRow`] is an immutable value map with an optional layer label and
//! an optional stable identity key. The identity key is what survives a full
//! row-set replacement: selection and cursor position are reconciled by key,
//! not by position.

use std::collections::BTreeMap;

/// A single row in a layered table.
///
/// Construct with [`TableRow::new`] and the builder-style [`TableRow::layer`]
/// / [`TableRow::key`] methods. Rows are replaced wholesale rather than
/// mutated; the one exception is single-cell updates routed through
/// [`crate::TableState::update_cell`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    values: BTreeMap<String, String>,
    layer: Option<String>,
    row_key: Option<String>,
}

impl TableRow {
    /// Create a row from `(column, value)` pairs.
    pub fn new<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: values.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            layer: None,
            row_key: None,
        }
    }

    /// Assign a layer grouping label.
    #[must_use]
    pub fn layer(mut self, layer: impl Into<String>) -> Self {
        self.layer = Some(layer.into());
        self
    }

    /// Assign a stable identity key.
    ///
    /// Required for selection and cursor continuity across
    /// [`crate::TableState::set_rows`]. Uniqueness is caller-enforced.
    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.row_key = Some(key.into());
        self
    }

    /// Value for `column`, if present.
    pub fn value(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }

    /// All `(column, value)` pairs.
    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    /// Layer label, if any.
    pub fn layer_name(&self) -> Option<&str> {
        self.layer.as_deref()
    }

    /// Caller-supplied identity key, if any.
    pub fn row_key(&self) -> Option<&str> {
        self.row_key.as_deref()
    }

    /// Effective identity: the caller-supplied key, or a positional fallback.
    ///
    /// Rows without an explicit key get `row-{index}` derived from their
    /// position in the row set. Positional identities do not survive
    /// reordering, which is why callers that use live updates supply keys.
    pub(crate) fn effective_key(&self, index: usize) -> String {
        self.row_key.clone().unwrap_or_else(|| format!("row-{index}"))
    }

    pub(crate) fn set_value(&mut self, column: &str, value: String) {
        self.values.insert(column.to_owned(), value);
    }

    /// True if any column value contains `needle` case-insensitively.
    pub(crate) fn matches(&self, needle: &str) -> bool {
        self.values.values().any(|v| v.to_lowercase().contains(needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_key_prefers_explicit() {
        let row = TableRow::new([("Name", "auth")]).key("auth");
        assert_eq!(row.effective_key(3), "auth");
    }

    #[test]
    fn effective_key_falls_back_to_position() {
        let row = TableRow::new([("Name", "auth")]);
        assert_eq!(row.effective_key(3), "row-3");
    }

    #[test]
    fn matches_is_case_insensitive() {
        let row = TableRow::new([("Service", "Auth-Gateway"), ("Status", "Running")]);
        assert!(row.matches("gateway"));
        assert!(row.matches("run"));
        assert!(!row.matches("stopped"));
    }
}
