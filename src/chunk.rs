//! Chunk planning for bounded historian requests
//!
//! The historian limits how much one interpolated-values call may return, so
//! a large range is split into consecutive sub-ranges of at most
//! [`SamplingInterval::chunk_size`] grid points each. Planning is defined on
//! grid indices, which makes the partition exact: the sub-grids of the
//! planned chunks concatenate back to the full grid with no gaps, overlaps
//! or reordering.

use crate::error::Result;
use crate::grid::TimeGrid;
use crate::types::{SamplingInterval, TimeRange};

/// Partition a range into historian-sized sub-ranges
///
/// Each chunk spans a window of at most `interval.chunk_size()` grid points;
/// the next chunk starts at the following grid point. Boundary timestamps
/// keep full date+time precision and are end-inclusive, like every range in
/// this crate.
///
/// Edge cases:
/// - the whole grid fits in one chunk → a single chunk equal to the input
///   range (the caller can skip concatenation entirely)
/// - the final window would hold fewer than 2 points → it is merged backward
///   into the prior chunk, because a single-point historian query is
///   unreliable
///
/// # Errors
///
/// Propagates grid generation failures ([`crate::error::Error::InvalidRange`]).
///
/// # Example
///
/// ```rust
/// use tagsampler::chunk::plan;
/// use tagsampler::types::TimeRange;
///
/// let range = TimeRange::parse("01/01/2020 00:00:00", "01/01/2020 00:41:39").unwrap();
/// let chunks = plan(&range, &"1s".parse().unwrap()).unwrap();
/// // 2500 grid points at a 1000-point limit
/// assert_eq!(chunks.len(), 3);
/// assert_eq!(chunks[0].start(), range.start());
/// assert_eq!(chunks[2].end(), range.end());
/// ```
pub fn plan(range: &TimeRange, interval: &SamplingInterval) -> Result<Vec<TimeRange>> {
    let grid = TimeGrid::generate(range, interval)?;
    let n = grid.len();
    let size = interval.chunk_size();

    if n <= size {
        return Ok(vec![*range]);
    }

    let points = grid.timestamps();
    let mut windows: Vec<(usize, usize)> = (0..n)
        .step_by(size)
        .map(|start| (start, (start + size - 1).min(n - 1)))
        .collect();

    // a degenerate final window merges backward rather than becoming a
    // single-point query
    let (last_start, last_end) = windows[windows.len() - 1];
    if last_end - last_start < 1 {
        windows.pop();
        if let Some(prev) = windows.last_mut() {
            prev.1 = last_end;
        }
    }

    Ok(windows
        .into_iter()
        .map(|(a, b)| TimeRange::new_unchecked(points[a], points[b]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn range(start: &str, end: &str) -> TimeRange {
        TimeRange::parse(start, end).unwrap()
    }

    fn interval(spec: &str) -> SamplingInterval {
        spec.parse().unwrap()
    }

    /// Concatenated chunk sub-grids must reproduce the full grid exactly.
    fn assert_partition_exact(r: &TimeRange, i: &SamplingInterval) {
        let full = TimeGrid::generate(r, i).unwrap();
        let chunks = plan(r, i).unwrap();

        let mut concatenated: Vec<NaiveDateTime> = Vec::new();
        for chunk in &chunks {
            concatenated.extend(TimeGrid::generate(chunk, i).unwrap().timestamps());
        }
        assert_eq!(concatenated, full.timestamps());
    }

    #[test]
    fn small_grid_yields_single_chunk_equal_to_range() {
        let r = range("01/01/2020 00:00:00", "01/01/2020 00:00:09");
        let chunks = plan(&r, &interval("1s")).unwrap();
        assert_eq!(chunks, vec![r]);
    }

    #[test]
    fn grid_exactly_one_chunk_is_not_split() {
        // 1000 points at 1s = 999 seconds of range
        let r = range("01/01/2020 00:00:00", "01/01/2020 00:16:39");
        assert_eq!(plan(&r, &interval("1s")).unwrap().len(), 1);
    }

    #[test]
    fn partition_reproduces_full_grid() {
        assert_partition_exact(
            &range("01/01/2020 00:00:00", "01/01/2020 00:41:39"),
            &interval("1s"),
        );
        assert_partition_exact(
            &range("01/01/2015 01:00:00", "31/12/2015 01:00:00"),
            &interval("1d"),
        );
        assert_partition_exact(
            &range("01/01/2015 00:00:00", "01/06/2015 00:00:00"),
            &interval("1h"),
        );
    }

    #[test]
    fn chunks_do_not_overlap_and_stay_ordered() {
        let i = interval("1d");
        // 365 points at a 10-point limit
        let chunks = plan(
            &range("01/01/2015 01:00:00", "31/12/2015 01:00:00"),
            &i,
        )
        .unwrap();
        assert_eq!(chunks.len(), 37);
        for pair in chunks.windows(2) {
            assert!(pair[0].end() < pair[1].start());
            assert_eq!(pair[1].start() - pair[0].end(), i.step());
        }
    }

    #[test]
    fn degenerate_final_chunk_merges_backward() {
        // 1001 points at 1s: last window would hold a single point
        let r = range("01/01/2020 00:00:00", "01/01/2020 00:16:40");
        let i = interval("1s");
        let chunks = plan(&r, &i).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].end(), r.end());
        assert_partition_exact(&r, &i);
    }

    #[test]
    fn two_point_final_chunk_is_kept() {
        // 1002 points at 1s: final window holds exactly 2 points
        let r = range("01/01/2020 00:00:00", "01/01/2020 00:16:41");
        let chunks = plan(&r, &interval("1s")).unwrap();
        assert_eq!(chunks.len(), 2);
        let last = TimeGrid::generate(&chunks[1], &interval("1s")).unwrap();
        assert_eq!(last.len(), 2);
    }

    #[test]
    fn boundaries_keep_full_datetime_precision() {
        let chunks = plan(
            &range("01/01/2015 01:30:45", "31/12/2015 01:30:45"),
            &interval("1d"),
        )
        .unwrap();
        let rendered = chunks[1].to_string();
        assert!(rendered.contains("01:30:45"), "got {}", rendered);
    }
}
