//! Error types for historian sampling

use thiserror::Error;

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for sampling operations
///
/// Structural problems (bad range, bad interval, unresolvable tag, column
/// collisions) are loud and immediate. Data-availability problems (timeouts,
/// missing samples) never appear here: they degrade to NaN inside
/// [`RetryingFetcher`](crate::fetch::RetryingFetcher) instead.
#[derive(Error, Debug)]
pub enum Error {
    /// The sampling interval string or parameters have no known mapping
    #[error("invalid sampling interval: {0}")]
    InvalidInterval(String),

    /// The time range is malformed (unparseable timestamp or start > end)
    #[error("invalid time range: {0}")]
    InvalidRange(String),

    /// Tag name could not be resolved on the historian
    #[error("unknown tag: {0}")]
    UnknownTag(String),

    /// Attribute metadata retrieval failed for a resolved tag
    ///
    /// Partial metadata is never returned; the whole sample fails.
    #[error("attribute fetch failed for tag '{tag}': {reason}")]
    AttributeFetch {
        /// The tag whose attributes were requested
        tag: String,
        /// Backend-reported reason
        reason: String,
    },

    /// A column's series length does not match the time grid length
    #[error("row count mismatch for column '{column}': expected {expected}, got {actual}")]
    RowCountMismatch {
        /// Sanitized column name
        column: String,
        /// Grid length for the requested range
        expected: usize,
        /// Actual series length delivered by the fetcher
        actual: usize,
    },

    /// Two distinct tag names sanitized to the same column name
    #[error("duplicate column name '{name}': tags '{first}' and '{second}' collide after sanitization")]
    DuplicateColumnName {
        /// The colliding sanitized name
        name: String,
        /// First tag that produced it
        first: String,
        /// Second tag that produced it
        second: String,
    },

    /// A table with no rows was handed to an operation that needs data
    #[error("table has no rows")]
    EmptyTable,

    /// Configuration file or value problem
    #[error("configuration error: {0}")]
    Configuration(String),

    /// IO error (persistence)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error (persistence)
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failure classes reported by the historian's value retrieval call
///
/// `Transient` is retried up to the policy budget, then converted into an
/// all-missing fallback. `Fatal` skips remaining retries and falls back
/// immediately. Neither class ever reaches the caller of a sample operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Timeout-class failure worth retrying
    #[error("transient historian failure: {0}")]
    Transient(String),

    /// Historian-side failure that will not succeed on retry
    #[error("fatal historian failure: {0}")]
    Fatal(String),
}

/// Failure classes for the historian's lookup-style calls
///
/// Raised by tag resolution, attribute retrieval and mask search. These are
/// mapped onto [`Error`] variants at the sampling layer, where the tag
/// context is known.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// No point with the given name exists on the server
    #[error("tag not found: {0}")]
    TagNotFound(String),

    /// Attribute retrieval failed
    #[error("attribute retrieval failed: {0}")]
    Attributes(String),

    /// Any other backend failure (search, connectivity)
    #[error("historian backend error: {0}")]
    Backend(String),
}
