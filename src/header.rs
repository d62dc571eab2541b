//! Header capture and row alignment.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use std::sync::Arc;

/// Column names taken from a sheet's first row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderRow {
    columns: Arc<[String]>,
}

impl HeaderRow {
    /// Bind a list of values as the header.
    ///
    /// Fails with `HeaderEmpty` when `values` is empty.
    pub fn bind(values: Vec<String>) -> Result<Self> {
        if values.is_empty() {
            return Err(Error::HeaderEmpty);
        }
        Ok(Self {
            columns: values.into(),
        })
    }

    /// Column names in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Always false for a bound header; present for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Align a row to the header.
    ///
    /// Short rows are padded with `None`, long rows are truncated, so the
    /// result always has exactly [`len`](Self::len) entries.
    pub fn align(&self, values: Vec<String>) -> AlignedRow {
        let mut values: Vec<Option<String>> = values.into_iter().map(Some).collect();
        values.resize(self.columns.len(), None);
        AlignedRow {
            columns: Arc::clone(&self.columns),
            values,
        }
    }
}

/// A row paired position by position with the header columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedRow {
    columns: Arc<[String]>,
    values: Vec<Option<String>>,
}

impl AlignedRow {
    /// Number of entries (the header length).
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value under a column name.
    ///
    /// With duplicate column names the last one wins, matching [`into_map`](Self::into_map).
    /// Returns `None` both for unknown columns and for padded entries.
    pub fn get(&self, column: &str) -> Option<&str> {
        let idx = self.columns.iter().rposition(|c| c == column)?;
        self.values[idx].as_deref()
    }

    /// Entries as (column, value) pairs in header order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(Option::as_deref))
    }

    /// Values in header order.
    pub fn values(&self) -> &[Option<String>] {
        &self.values
    }

    /// Build a column-keyed map.
    ///
    /// Duplicate column names collapse into one key holding the last value.
    pub fn into_map(self) -> IndexMap<String, Option<String>> {
        let mut map = IndexMap::with_capacity(self.columns.len());
        for (column, value) in self.columns.iter().zip(self.values) {
            map.insert(column.clone(), value);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_header_is_rejected() {
        assert!(matches!(HeaderRow::bind(Vec::new()), Err(Error::HeaderEmpty)));
    }

    #[test]
    fn test_alignment_arity() {
        let header = HeaderRow::bind(strings(&["id", "name", "city"])).unwrap();

        for row_len in 0..6 {
            let row: Vec<String> = (0..row_len).map(|i| i.to_string()).collect();
            let aligned = header.align(row);
            assert_eq!(aligned.len(), header.len(), "row of length {}", row_len);
        }
    }

    #[test]
    fn test_short_row_is_padded() {
        let header = HeaderRow::bind(strings(&["id", "name", "city"])).unwrap();
        let aligned = header.align(strings(&["7"]));

        assert_eq!(aligned.get("id"), Some("7"));
        assert_eq!(aligned.get("city"), None);
        assert_eq!(aligned.values(), &[Some("7".to_string()), None, None]);
    }

    #[test]
    fn test_long_row_is_truncated() {
        let header = HeaderRow::bind(strings(&["id", "name"])).unwrap();
        let aligned = header.align(strings(&["7", "Ann", "extra", "more"]));

        let pairs: Vec<(&str, Option<&str>)> = aligned.iter().collect();
        assert_eq!(pairs, [("id", Some("7")), ("name", Some("Ann"))]);
    }

    #[test]
    fn test_duplicate_columns_collapse_to_last() {
        let header = HeaderRow::bind(strings(&["key", "key", "other"])).unwrap();
        let aligned = header.align(strings(&["first", "second", "x"]));

        assert_eq!(aligned.get("key"), Some("second"));
        let map = aligned.into_map();
        assert_eq!(map.len(), 2);
        assert_eq!(map["key"], Some("second".to_string()));
    }
}
