//! Core data types used throughout the sampling pipeline
//!
//! # Key Types
//!
//! - **`TimeRange`**: inclusive time window for a retrieval, in the
//!   historian's native wall-clock representation
//! - **`SamplingInterval`**: parsed span specifier (`"1s"`, `"1h"`, ...) with
//!   its canonical step and per-request chunk limit
//! - **`TagHandle`**: resolved reference to a historian point
//! - **`RawValue`**: the historian's value zoo (floats, ints, digital states,
//!   error markers)
//! - **`TagSeries`**: one named column of numeric samples, NaN for missing
//!
//! # Example
//!
//! ```rust
//! use tagsampler::types::{SamplingInterval, TimeRange};
//!
//! let range = TimeRange::parse("01/01/2020 00:00:00", "01/01/2020 00:00:09").unwrap();
//! let interval: SamplingInterval = "1s".parse().unwrap();
//! assert_eq!(interval.step(), chrono::Duration::seconds(1));
//! assert_eq!(interval.chunk_size(), 1000);
//! assert_eq!(range.duration(), chrono::Duration::seconds(9));
//! ```

use crate::error::{Error, Result};
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Timestamp format used by the historian for range boundaries
///
/// Full date+time precision, day-first, e.g. `26/03/2017 10:00:00`.
pub const HISTORIAN_TIME_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Attribute metadata for one tag, keyed by attribute name
pub type TagAttributes = HashMap<String, String>;

/// Inclusive time window for a retrieval
///
/// Both boundaries are part of the window, matching the historian's
/// end-inclusive range semantics. Invariant: `start <= end`, enforced by
/// [`TimeRange::new`] and [`TimeRange::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl TimeRange {
    /// Create a new time range with validation
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRange`] if `start > end`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tagsampler::types::TimeRange;
    ///
    /// let range = TimeRange::parse("01/01/2015 01:00:00", "31/12/2015 01:00:00").unwrap();
    /// assert!(TimeRange::new(range.end(), range.start()).is_err());
    /// ```
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidRange(format!(
                "start {} is after end {}",
                start.format(HISTORIAN_TIME_FORMAT),
                end.format(HISTORIAN_TIME_FORMAT)
            )));
        }
        Ok(Self { start, end })
    }

    /// Create a range without the ordering check
    ///
    /// Only for inputs already known to be ordered, such as consecutive grid
    /// points handed out by the chunk planner.
    pub(crate) fn new_unchecked(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// Parse a range from the historian's native boundary strings
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRange`] when either boundary does not match
    /// [`HISTORIAN_TIME_FORMAT`] or when `start > end`.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let parse_one = |s: &str| {
            NaiveDateTime::parse_from_str(s, HISTORIAN_TIME_FORMAT).map_err(|e| {
                Error::InvalidRange(format!("unparseable timestamp '{}': {}", s, e))
            })
        };
        Self::new(parse_one(start)?, parse_one(end)?)
    }

    /// Start of the window (inclusive)
    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// End of the window (inclusive)
    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// Check if a timestamp falls within this range (boundaries included)
    pub fn contains(&self, timestamp: NaiveDateTime) -> bool {
        timestamp >= self.start && timestamp <= self.end
    }

    /// Duration of the window
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            self.start.format(HISTORIAN_TIME_FORMAT),
            self.end.format(HISTORIAN_TIME_FORMAT)
        )
    }
}

/// Span unit supported by the historian's interval parser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanUnit {
    /// Second-resolution sampling
    Seconds,
    /// Minute-resolution sampling
    Minutes,
    /// Hour-resolution sampling
    Hours,
    /// Day-resolution sampling
    Days,
}

impl SpanUnit {
    fn seconds(self) -> i64 {
        match self {
            SpanUnit::Seconds => 1,
            SpanUnit::Minutes => 60,
            SpanUnit::Hours => 3_600,
            SpanUnit::Days => 86_400,
        }
    }

    /// Maximum grid points per historian sub-request for this unit
    ///
    /// Denser intervals tolerate more points per call; the limit scales
    /// inversely with interval density so each sub-request stays within the
    /// historian's response-size comfort zone.
    fn chunk_size(self) -> usize {
        match self {
            SpanUnit::Seconds => 1_000,
            SpanUnit::Minutes => 600,
            SpanUnit::Hours => 100,
            SpanUnit::Days => 10,
        }
    }

    fn suffix(self) -> char {
        match self {
            SpanUnit::Seconds => 's',
            SpanUnit::Minutes => 'm',
            SpanUnit::Hours => 'h',
            SpanUnit::Days => 'd',
        }
    }
}

/// Sampling interval specifier
///
/// Parsed from historian span strings such as `"1s"`, `"30s"`, `"1h"` or
/// `"1d"`. Every supported interval maps to exactly one step duration
/// ([`SamplingInterval::step`]) and one per-request chunk limit
/// ([`SamplingInterval::chunk_size`]).
///
/// # Example
///
/// ```rust
/// use tagsampler::types::SamplingInterval;
///
/// let interval: SamplingInterval = "1d".parse().unwrap();
/// assert_eq!(interval.step(), chrono::Duration::days(1));
/// assert_eq!(interval.chunk_size(), 10);
/// assert_eq!(interval.to_string(), "1d");
///
/// assert!("1x".parse::<SamplingInterval>().is_err());
/// assert!("0s".parse::<SamplingInterval>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingInterval {
    count: u32,
    unit: SpanUnit,
}

impl SamplingInterval {
    /// Create an interval with validation
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInterval`] when `count` is zero.
    pub fn new(count: u32, unit: SpanUnit) -> Result<Self> {
        if count == 0 {
            return Err(Error::InvalidInterval(
                "interval count must be at least 1".to_string(),
            ));
        }
        Ok(Self { count, unit })
    }

    /// Step between two consecutive grid points
    pub fn step(&self) -> Duration {
        Duration::seconds(i64::from(self.count) * self.unit.seconds())
    }

    /// Maximum grid points per historian sub-request
    pub fn chunk_size(&self) -> usize {
        self.unit.chunk_size()
    }

    /// Frequency label used in derived filenames (e.g. `"10s"`)
    pub fn label(&self) -> String {
        format!("{}{}", self.count, self.unit.suffix())
    }
}

impl FromStr for SamplingInterval {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
        let rest = &s[digits.len()..];
        if digits.is_empty() {
            return Err(Error::InvalidInterval(format!(
                "'{}' has no leading count",
                s
            )));
        }
        let count: u32 = digits
            .parse()
            .map_err(|_| Error::InvalidInterval(format!("'{}' count out of range", s)))?;
        let unit = match rest.to_ascii_lowercase().as_str() {
            "s" => SpanUnit::Seconds,
            "m" => SpanUnit::Minutes,
            "h" => SpanUnit::Hours,
            "d" => SpanUnit::Days,
            other => {
                return Err(Error::InvalidInterval(format!(
                    "unknown span unit '{}' in '{}'",
                    other, s
                )))
            }
        };
        Self::new(count, unit)
    }
}

impl fmt::Display for SamplingInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Resolved reference to a historian point
///
/// Produced by [`HistorianConnection::resolve`](crate::connection::HistorianConnection::resolve)
/// and handed back to the connection for value and attribute retrieval.
/// `point_id` is opaque to this crate; backends are free to encode whatever
/// they need in it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TagHandle {
    /// Tag name as resolved on the server
    pub name: String,
    /// Backend-specific point identifier
    pub point_id: u64,
}

/// A single value as delivered by the historian
///
/// Interpolated retrieval can return plain numbers, digital state labels
/// ("ON", "Pt Created") and error/status markers ("Bad Input", "Shutdown").
/// Only the numeric shapes survive coercion; everything else becomes NaN.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// Floating-point sample
    Float(f64),
    /// Integer sample
    Int(i64),
    /// Digital state label
    Digital(String),
    /// Bad/questionable status marker
    Error(String),
}

impl RawValue {
    /// Coerce to a numeric sample, NaN for anything non-numeric
    pub fn to_f64(&self) -> f64 {
        match self {
            RawValue::Float(v) => *v,
            RawValue::Int(v) => *v as f64,
            RawValue::Digital(_) | RawValue::Error(_) => f64::NAN,
        }
    }
}

/// One named column of numeric samples
///
/// Gaps, coercion failures and degraded fetches are NaN, never zero, so that
/// missing data stays distinguishable from a measured zero all the way into
/// the assembled table. On the wire NaN travels as `null` (JSON has no NaN),
/// round-tripping losslessly through persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagSeries {
    /// Column name
    pub name: String,
    /// Sample values, one per grid point
    #[serde(with = "nan_as_null")]
    pub values: Vec<f64>,
}

mod nan_as_null {
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(values.len()))?;
        for v in values {
            if v.is_nan() {
                seq.serialize_element(&None::<f64>)?;
            } else {
                seq.serialize_element(&Some(*v))?;
            }
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
        let values: Vec<Option<f64>> = Deserialize::deserialize(deserializer)?;
        Ok(values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    }
}
