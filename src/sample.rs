//! Single-tag sampling: series plus attributes
//!
//! A [`TagSampler`] turns a tag name into a named numeric series and its
//! attribute metadata. Resolution failures and attribute failures are
//! structural and propagate; value retrieval goes through the
//! [`RetryingFetcher`](crate::fetch::RetryingFetcher) and therefore degrades
//! to NaN instead of failing.

use crate::connection::HistorianConnection;
use crate::error::{ConnectionError, Error, Result};
use crate::fetch::{RetryPolicy, RetryingFetcher};
use crate::types::{SamplingInterval, TagAttributes, TagSeries, TimeRange};
use tracing::debug;

/// Fetches one tag's interpolated series and its descriptive attributes
pub struct TagSampler<'c> {
    conn: &'c dyn HistorianConnection,
    fetcher: RetryingFetcher<'c>,
}

impl<'c> TagSampler<'c> {
    /// Create a sampler over `conn` with the given retry policy
    pub fn new(conn: &'c dyn HistorianConnection, policy: RetryPolicy) -> Self {
        Self {
            conn,
            fetcher: RetryingFetcher::new(conn, policy),
        }
    }

    /// Sample one tag over a range at an interval
    ///
    /// Resolves the tag, retrieves its attributes once, then fetches and
    /// numerically coerces the series. Attribute retrieval failure fails the
    /// whole sample; there is no partial-metadata result.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownTag`] when the name does not resolve (not retried)
    /// - [`Error::AttributeFetch`] when attribute retrieval fails
    /// - [`Error::InvalidRange`] from grid sizing of the fallback series
    pub fn sample(
        &self,
        tag_name: &str,
        range: &TimeRange,
        interval: &SamplingInterval,
    ) -> Result<(TagSeries, TagAttributes)> {
        let handle = self.conn.resolve(tag_name).map_err(|e| match e {
            ConnectionError::TagNotFound(name) => Error::UnknownTag(name),
            other => Error::UnknownTag(format!("{}: {}", tag_name, other)),
        })?;

        let attributes = self
            .conn
            .attributes(&handle)
            .map_err(|e| Error::AttributeFetch {
                tag: tag_name.to_string(),
                reason: e.to_string(),
            })?;

        let values = self.fetcher.fetch(&handle, range, interval)?;
        debug!(
            tag = tag_name,
            points = values.len(),
            attributes = attributes.len(),
            "sampled tag"
        );

        Ok((
            TagSeries {
                name: tag_name.to_string(),
                values,
            },
            attributes,
        ))
    }
}
