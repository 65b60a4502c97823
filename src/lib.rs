//! tagsampler - Chunked, resilient bulk retrieval of interpolated
//! process-historian tag data
//!
//! This library turns a time range, a sampling interval and a list of tag
//! names into one correctly time-indexed, numerically typed,
//! metadata-annotated table, fetched from a remote historian that imposes
//! per-call limits and transient failures:
//!
//! - Deterministic time grids as the single source of row indexing
//! - Per-call chunk limits handled by an exact grid-index partition
//! - Bounded retry with degrade-to-missing for transient failures
//! - Per-column attribute metadata carried across chunk concatenation
//!
//! The historian protocol itself lives behind the
//! [`HistorianConnection`](connection::HistorianConnection) trait; this
//! crate never opens sockets or handles credentials beyond passing them
//! through.
//!
//! # Example
//!
//! ```rust,no_run
//! use tagsampler::bulk::BulkRetriever;
//! use tagsampler::connection::HistorianConnection;
//! use tagsampler::fetch::RetryPolicy;
//! use tagsampler::types::TimeRange;
//!
//! # fn connect() -> Box<dyn HistorianConnection> { unimplemented!() }
//! # fn main() -> tagsampler::error::Result<()> {
//! let conn = connect();
//! let retriever = BulkRetriever::new(conn.as_ref(), RetryPolicy::default());
//!
//! let range = TimeRange::parse("01/01/2015 01:00:00", "31/12/2015 01:00:00")?;
//! let table = retriever.retrieve(
//!     &["FI-290.033.PV", "TI-290.017.PV"],
//!     &range,
//!     &"1d".parse()?,
//! )?;
//!
//! assert_eq!(table.column_names(), vec!["FI290033PV", "TI290017PV"]);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod types;

/// Historian connection seam (injected collaborator)
pub mod connection;

/// Canonical time grid generation
pub mod grid;

/// Bounded retry with degrade-to-missing fallback
pub mod fetch;

/// Single-tag sampling (series + attributes)
pub mod sample;

/// Aligned tables with attribute side-channel
pub mod table;

/// Chunk planning for bounded requests
pub mod chunk;

/// Bulk retrieval across chunk boundaries
pub mod bulk;

/// Configuration management with TOML support
pub mod config;

/// Saving retrieved tables to disk
pub mod persist;

// Re-export main types
pub use bulk::BulkRetriever;
pub use connection::HistorianConnection;
pub use error::{ConnectionError, Error, FetchError, Result};
pub use fetch::{RetryPolicy, RetryingFetcher};
pub use grid::TimeGrid;
pub use sample::TagSampler;
pub use table::{sanitize_column_name, SampledTable, TableAssembler};
pub use types::{RawValue, SamplingInterval, TagAttributes, TagHandle, TagSeries, TimeRange};
