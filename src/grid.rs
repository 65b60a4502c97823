//! Canonical time grid generation
//!
//! A [`TimeGrid`] is the deterministic, evenly spaced timestamp sequence a
//! `(range, interval)` pair implies. It is the single source of truth for
//! row indexing: the chunk planner partitions it, the fetcher sizes its
//! fallback series against it, and the assembler verifies every column
//! against its length.

use crate::error::{Error, Result};
use crate::types::{SamplingInterval, TimeRange, HISTORIAN_TIME_FORMAT};
use chrono::{Duration, NaiveDateTime};

/// Evenly spaced timestamp sequence for a range and interval
///
/// Boundary-inclusive: the grid runs from `range.start()` in steps of
/// `interval.step()` up to the last point at or before `range.end()`, so its
/// length is `duration / step + 1`. Generation is pure; the same inputs
/// always produce the same sequence.
///
/// # Example
///
/// ```rust
/// use tagsampler::grid::TimeGrid;
/// use tagsampler::types::TimeRange;
///
/// let range = TimeRange::parse("01/01/2020 00:00:00", "01/01/2020 00:00:09").unwrap();
/// let grid = TimeGrid::generate(&range, &"1s".parse().unwrap()).unwrap();
/// assert_eq!(grid.len(), 10);
/// assert_eq!(grid.timestamps()[0], range.start());
/// assert_eq!(grid.timestamps()[9], range.end());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeGrid {
    points: Vec<NaiveDateTime>,
    step: Duration,
}

impl TimeGrid {
    /// Generate the grid for a range and interval
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRange`] when `range.start() > range.end()` or
    /// when stepping would overflow the timestamp domain.
    pub fn generate(range: &TimeRange, interval: &SamplingInterval) -> Result<Self> {
        if range.start() > range.end() {
            return Err(Error::InvalidRange(format!(
                "start {} is after end {}",
                range.start().format(HISTORIAN_TIME_FORMAT),
                range.end().format(HISTORIAN_TIME_FORMAT)
            )));
        }

        let step = interval.step();
        let step_secs = step.num_seconds();
        let count = range.duration().num_seconds() / step_secs + 1;

        let mut points = Vec::with_capacity(count as usize);
        for i in 0..count {
            let offset = Duration::seconds(i * step_secs);
            let point = range.start().checked_add_signed(offset).ok_or_else(|| {
                Error::InvalidRange(format!(
                    "grid overflows timestamp domain at point {} of {}",
                    i, count
                ))
            })?;
            points.push(point);
        }

        Ok(Self { points, step })
    }

    /// Number of grid points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the grid has no points (never true for a valid range)
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Step between consecutive points
    pub fn step(&self) -> Duration {
        self.step
    }

    /// The timestamp sequence
    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.points
    }

    /// Consume the grid, yielding its timestamp sequence
    pub fn into_timestamps(self) -> Vec<NaiveDateTime> {
        self.points
    }
}
