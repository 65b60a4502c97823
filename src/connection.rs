//! Historian connection seam
//!
//! The wire protocol, authentication and point lookup all live behind
//! [`HistorianConnection`]. The sampling pipeline only ever talks to this
//! trait, which keeps the core testable against in-memory fakes and keeps
//! server topology and credentials out of scope.
//!
//! Calls are blocking. Implementations must be `Send + Sync`; if one
//! connection object is shared across threads, serializing access to the
//! underlying session is the implementor's concern.

use crate::error::{ConnectionError, FetchError};
use crate::types::{RawValue, SamplingInterval, TagAttributes, TagHandle, TimeRange};

/// Capability interface to a process historian
///
/// The four calls mirror what a PI-style server offers a client: name
/// resolution, interpolated value retrieval over a range, per-point attribute
/// metadata, and wildcard mask search.
pub trait HistorianConnection: Send + Sync {
    /// Resolve a tag name to a point handle
    ///
    /// # Errors
    ///
    /// [`ConnectionError::TagNotFound`] when no point with this name exists.
    fn resolve(&self, tag_name: &str) -> Result<TagHandle, ConnectionError>;

    /// Fetch values interpolated onto the regular grid implied by
    /// `(range, interval)`, boundaries included
    ///
    /// # Errors
    ///
    /// [`FetchError::Transient`] for timeout-class failures worth retrying,
    /// [`FetchError::Fatal`] for failures that will not succeed on retry.
    fn interpolated_values(
        &self,
        handle: &TagHandle,
        range: &TimeRange,
        interval: &SamplingInterval,
    ) -> Result<Vec<RawValue>, FetchError>;

    /// Fetch descriptive attributes for a resolved point
    ///
    /// # Errors
    ///
    /// [`ConnectionError::Attributes`] on any retrieval failure; partial
    /// attribute maps are not returned.
    fn attributes(&self, handle: &TagHandle) -> Result<TagAttributes, ConnectionError>;

    /// Search tag names by wildcard mask (e.g. `*FI*290.033*`)
    ///
    /// # Errors
    ///
    /// [`ConnectionError::Backend`] on search failure.
    fn search(&self, mask: &str) -> Result<Vec<String>, ConnectionError>;
}
