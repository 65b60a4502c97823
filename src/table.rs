//! Aligned multi-tag tables with attribute side-channel
//!
//! A [`SampledTable`] is the assembled result of a retrieval: rows indexed
//! by the canonical time grid, one numeric column per requested tag in input
//! order, and a per-column attribute map carried beside the data. Column
//! access goes through explicit name lookup, never dynamic attribute-style
//! access, so the attribute map and the columns stay independently
//! addressable.
//!
//! Column names are sanitized on assembly: `.` and `-` are stripped (they
//! would break attribute-style access in downstream tooling). Two tags
//! collapsing to the same sanitized name is an error, never a silent rename.

use crate::error::{Error, Result};
use crate::fetch::RetryPolicy;
use crate::connection::HistorianConnection;
use crate::grid::TimeGrid;
use crate::sample::TagSampler;
use crate::types::{SamplingInterval, TagAttributes, TagSeries, TimeRange};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Strip characters that would break attribute-style column access
///
/// # Example
///
/// ```rust
/// use tagsampler::table::sanitize_column_name;
///
/// assert_eq!(sanitize_column_name("FI-290.033.PV"), "FI290033PV");
/// ```
pub fn sanitize_column_name(tag_name: &str) -> String {
    tag_name.chars().filter(|c| *c != '.' && *c != '-').collect()
}

/// Time-indexed table of sampled tag data
///
/// Invariants, enforced at construction:
/// - every column has exactly as many values as the index has rows
/// - column order equals the input tag order
/// - each column has an attribute entry under the same (sanitized) name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampledTable {
    index: Vec<NaiveDateTime>,
    columns: Vec<TagSeries>,
    attributes: HashMap<String, TagAttributes>,
}

impl SampledTable {
    pub(crate) fn from_parts(
        index: Vec<NaiveDateTime>,
        columns: Vec<TagSeries>,
        attributes: HashMap<String, TagAttributes>,
    ) -> Self {
        Self {
            index,
            columns,
            attributes,
        }
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// The row index (canonical time grid)
    pub fn index(&self) -> &[NaiveDateTime] {
        &self.index
    }

    /// Column names in input tag order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// All columns in input tag order
    pub fn columns(&self) -> &[TagSeries] {
        &self.columns
    }

    /// Values of one column, by sanitized name
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Attribute metadata for one column, by sanitized name
    pub fn column_attributes(&self, name: &str) -> Option<&TagAttributes> {
        self.attributes.get(name)
    }

    /// The full column → attributes side-channel
    pub fn attributes(&self) -> &HashMap<String, TagAttributes> {
        &self.attributes
    }

    /// Replace the attribute side-channel
    ///
    /// Concatenation does not carry attributes; the bulk retriever uses this
    /// to re-attach the map captured from the first chunk.
    pub(crate) fn set_attributes(&mut self, attributes: HashMap<String, TagAttributes>) {
        self.attributes = attributes;
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        Vec<NaiveDateTime>,
        Vec<TagSeries>,
        HashMap<String, TagAttributes>,
    ) {
        (self.index, self.columns, self.attributes)
    }
}

/// Assembles multiple tags' series into one aligned table
pub struct TableAssembler<'c> {
    sampler: TagSampler<'c>,
}

impl<'c> TableAssembler<'c> {
    /// Create an assembler over `conn` with the given retry policy
    pub fn new(conn: &'c dyn HistorianConnection, policy: RetryPolicy) -> Self {
        Self {
            sampler: TagSampler::new(conn, policy),
        }
    }

    /// Assemble one table for `tag_names` over `(range, interval)`
    ///
    /// Tags are fetched strictly in input order; the row index is the
    /// canonical time grid. Name collisions are checked up front so no
    /// historian traffic is wasted on a doomed request.
    ///
    /// # Errors
    ///
    /// - [`Error::DuplicateColumnName`] when two tags sanitize identically
    /// - [`Error::RowCountMismatch`] when a fetched series does not match
    ///   the grid length (a mis-sized fallback would corrupt alignment, so
    ///   it fails loudly here instead)
    /// - everything [`TagSampler::sample`] propagates
    pub fn assemble(
        &self,
        tag_names: &[&str],
        range: &TimeRange,
        interval: &SamplingInterval,
    ) -> Result<SampledTable> {
        let grid = TimeGrid::generate(range, interval)?;

        let mut seen: HashMap<String, &str> = HashMap::with_capacity(tag_names.len());
        for name in tag_names {
            let sanitized = sanitize_column_name(name);
            if let Some(first) = seen.insert(sanitized.clone(), *name) {
                return Err(Error::DuplicateColumnName {
                    name: sanitized,
                    first: first.to_string(),
                    second: name.to_string(),
                });
            }
        }

        let mut columns = Vec::with_capacity(tag_names.len());
        let mut attributes = HashMap::with_capacity(tag_names.len());
        for name in tag_names {
            let sanitized = sanitize_column_name(name);
            let (series, attrs) = self.sampler.sample(name, range, interval)?;
            if series.values.len() != grid.len() {
                return Err(Error::RowCountMismatch {
                    column: sanitized,
                    expected: grid.len(),
                    actual: series.values.len(),
                });
            }
            columns.push(TagSeries {
                name: sanitized.clone(),
                values: series.values,
            });
            attributes.insert(sanitized, attrs);
        }

        debug!(
            rows = grid.len(),
            columns = columns.len(),
            range = %range,
            "assembled table"
        );

        Ok(SampledTable::from_parts(
            grid.into_timestamps(),
            columns,
            attributes,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitization_strips_dots_and_dashes_only() {
        assert_eq!(sanitize_column_name("TI-290.091A.PV"), "TI290091APV");
        assert_eq!(sanitize_column_name("VI-290.003X_Not1X"), "VI290003X_Not1X");
        assert_eq!(sanitize_column_name("plain"), "plain");
    }

    #[test]
    fn column_lookup_uses_sanitized_names() {
        let table = SampledTable::from_parts(
            vec![],
            vec![TagSeries {
                name: "FI290033".to_string(),
                values: vec![],
            }],
            HashMap::from([("FI290033".to_string(), TagAttributes::new())]),
        );
        assert!(table.column("FI290033").is_some());
        assert!(table.column("FI-290.033").is_none());
        assert!(table.column_attributes("FI290033").is_some());
    }
}
