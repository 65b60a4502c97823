//! Bulk retrieval across chunk boundaries
//!
//! [`BulkRetriever`] is the top-level orchestrator: it plans chunks,
//! assembles each chunk's table sequentially (one in-flight historian
//! request at a time, with a progress event per chunk), concatenates the
//! results in chunk order, and repairs anything the seams introduced.
//!
//! Two things make the chunk boundary invisible to callers:
//!
//! - **Metadata carry-forward.** Row concatenation does not merge per-column
//!   attribute maps, so the retriever captures the attribute side-channel
//!   from the first chunk's table and re-attaches it to the concatenated
//!   result. All chunks request the same tags, hence identical attributes.
//! - **Index re-regularization.** After concatenation the row index is
//!   resampled onto the canonical grid for the full range: duplicate
//!   boundary stamps (possible with end-inclusive historian semantics) are
//!   averaged NaN-aware, and any stamp the seams dropped comes back as a
//!   NaN row.

use crate::chunk;
use crate::config::OutputConfig;
use crate::connection::HistorianConnection;
use crate::error::{Error, Result};
use crate::fetch::RetryPolicy;
use crate::grid::TimeGrid;
use crate::persist;
use crate::table::{SampledTable, TableAssembler};
use crate::types::{SamplingInterval, TagSeries, TimeRange};
use chrono::NaiveDateTime;
use std::collections::HashMap;
use tracing::{debug, info};

/// Orchestrates chunked retrieval into one seamless table
pub struct BulkRetriever<'c> {
    conn: &'c dyn HistorianConnection,
    policy: RetryPolicy,
}

impl<'c> BulkRetriever<'c> {
    /// Create a retriever over `conn` with the given retry policy
    pub fn new(conn: &'c dyn HistorianConnection, policy: RetryPolicy) -> Self {
        Self { conn, policy }
    }

    /// Retrieve `tag_names` over `(range, interval)`, chunked as needed
    ///
    /// A single-chunk plan delegates straight to
    /// [`TableAssembler::assemble`] with no concatenation overhead. A
    /// failure in any chunk aborts the whole retrieval; retry lives only in
    /// the fetcher, at single-tag granularity.
    ///
    /// # Errors
    ///
    /// Everything [`TableAssembler::assemble`] propagates, from any chunk.
    pub fn retrieve(
        &self,
        tag_names: &[&str],
        range: &TimeRange,
        interval: &SamplingInterval,
    ) -> Result<SampledTable> {
        let chunks = chunk::plan(range, interval)?;
        let assembler = TableAssembler::new(self.conn, self.policy.clone());

        if chunks.len() == 1 {
            debug!(range = %range, "range fits in one chunk, assembling directly");
            return assembler.assemble(tag_names, &chunks[0], interval);
        }

        let total = chunks.len();
        let mut parts = Vec::with_capacity(total);
        for (i, chunk_range) in chunks.iter().enumerate() {
            info!(
                chunk = i + 1,
                total,
                range = %chunk_range,
                tags = tag_names.len(),
                "retrieving chunk"
            );
            parts.push(assembler.assemble(tag_names, chunk_range, interval)?);
        }

        // attributes do not survive concatenation; capture them up front
        let attributes = parts[0].attributes().clone();

        let mut table = concat_rows(parts)?;
        table = regularize(table, range, interval)?;
        table.set_attributes(attributes);

        info!(
            rows = table.len(),
            columns = table.columns().len(),
            chunks = total,
            "bulk retrieval complete"
        );
        Ok(table)
    }

    /// Run a retrieval job from string parameters, as a script would drive it
    ///
    /// Boundaries are parsed from the historian's native timestamp format
    /// and the interval from its span notation. When `output.save_to_disk`
    /// is set, the table is saved under `output.data_dir` before being
    /// returned.
    ///
    /// # Errors
    ///
    /// Everything [`BulkRetriever::retrieve`] propagates, plus parse errors
    /// for the boundaries and interval, plus persistence errors when saving
    /// is enabled.
    pub fn retrieve_job(
        &self,
        tag_names: &[&str],
        time_range: (&str, &str),
        interval_spec: &str,
        output: &OutputConfig,
    ) -> Result<SampledTable> {
        let range = TimeRange::parse(time_range.0, time_range.1)?;
        let interval: SamplingInterval = interval_spec.parse()?;
        let table = self.retrieve(tag_names, &range, &interval)?;
        if output.save_to_disk {
            persist::save_table(&table, &interval, &output.data_dir)?;
        }
        Ok(table)
    }
}

/// Concatenate chunk tables along the row axis, in the given order
///
/// The result carries no attribute side-channel; the caller re-attaches it.
///
/// # Errors
///
/// [`Error::EmptyTable`] for an empty input, [`Error::RowCountMismatch`]
/// when a later chunk's column set differs from the first chunk's.
fn concat_rows(parts: Vec<SampledTable>) -> Result<SampledTable> {
    let mut iter = parts.into_iter();
    let first = iter.next().ok_or(Error::EmptyTable)?;
    let (mut index, mut columns, _) = first.into_parts();

    for part in iter {
        let (part_index, part_columns, _) = part.into_parts();
        if part_columns.len() != columns.len()
            || part_columns
                .iter()
                .zip(columns.iter())
                .any(|(a, b)| a.name != b.name)
        {
            return Err(Error::RowCountMismatch {
                column: "<column set>".to_string(),
                expected: columns.len(),
                actual: part_columns.len(),
            });
        }
        index.extend(part_index);
        for (target, source) in columns.iter_mut().zip(part_columns) {
            target.values.extend(source.values);
        }
    }

    Ok(SampledTable::from_parts(index, columns, HashMap::new()))
}

/// Resample a concatenated table onto the canonical grid for `range`
///
/// Duplicate stamps are reduced to their NaN-aware mean (all-NaN stays NaN);
/// grid stamps absent from the input become NaN rows. The output index is
/// exactly `TimeGrid::generate(range, interval)`.
fn regularize(
    table: SampledTable,
    range: &TimeRange,
    interval: &SamplingInterval,
) -> Result<SampledTable> {
    let grid = TimeGrid::generate(range, interval)?;
    let (index, columns, _) = table.into_parts();

    // stamp → positions, preserving arrival order within a stamp
    let mut positions: HashMap<NaiveDateTime, Vec<usize>> = HashMap::with_capacity(index.len());
    for (row, stamp) in index.iter().enumerate() {
        positions.entry(*stamp).or_default().push(row);
    }

    let columns = columns
        .into_iter()
        .map(|series| {
            let values = grid
                .timestamps()
                .iter()
                .map(|stamp| match positions.get(stamp) {
                    Some(rows) => nan_mean(rows.iter().map(|&r| series.values[r])),
                    None => f64::NAN,
                })
                .collect();
            TagSeries {
                name: series.name,
                values,
            }
        })
        .collect();

    Ok(SampledTable::from_parts(
        grid.into_timestamps(),
        columns,
        HashMap::new(),
    ))
}

/// Mean over the non-NaN values; NaN when every value is missing
fn nan_mean(values: impl Iterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for v in values {
        if !v.is_nan() {
            sum += v;
            count += 1;
        }
    }
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}
