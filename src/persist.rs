//! Saving retrieved tables to disk
//!
//! A saved table is one JSON document holding the index, the columns and the
//! attribute side-channel together, so reloading never loses metadata. The
//! filename is derived deterministically from the table's first and last
//! index timestamp plus the interval's frequency label; `:`, `/` and spaces
//! are replaced by `_` to keep it filesystem-safe.

use crate::error::{Error, Result};
use crate::table::SampledTable;
use crate::types::{SamplingInterval, HISTORIAN_TIME_FORMAT};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::info;

fn filesystem_safe(stamp: &str) -> String {
    stamp
        .chars()
        .map(|c| match c {
            ':' | '/' | ' ' => '_',
            other => other,
        })
        .collect()
}

/// Derive the deterministic filename for a table
///
/// # Errors
///
/// [`Error::EmptyTable`] when the table has no rows to derive boundaries
/// from.
///
/// # Example
///
/// ```rust
/// # use tagsampler::persist::table_filename;
/// # use tagsampler::table::SampledTable;
/// # use tagsampler::types::SamplingInterval;
/// # fn demo(table: &SampledTable) -> tagsampler::error::Result<()> {
/// let name = table_filename(table, &"1s".parse()?)?;
/// // e.g. "01_01_2020_00_00_00__01_01_2020_00_00_09_1s.json"
/// # Ok(())
/// # }
/// ```
pub fn table_filename(table: &SampledTable, interval: &SamplingInterval) -> Result<String> {
    let first = table.index().first().ok_or(Error::EmptyTable)?;
    let last = table.index().last().ok_or(Error::EmptyTable)?;
    Ok(format!(
        "{}__{}_{}.json",
        filesystem_safe(&first.format(HISTORIAN_TIME_FORMAT).to_string()),
        filesystem_safe(&last.format(HISTORIAN_TIME_FORMAT).to_string()),
        interval.label(),
    ))
}

/// Save a table (data plus attribute side-channel) under `dir`
///
/// Returns the path of the written file.
///
/// # Errors
///
/// [`Error::EmptyTable`] for a rowless table, [`Error::Io`] /
/// [`Error::Serialization`] on write failures.
pub fn save_table(
    table: &SampledTable,
    interval: &SamplingInterval,
    dir: impl AsRef<Path>,
) -> Result<PathBuf> {
    std::fs::create_dir_all(dir.as_ref())?;
    let path = dir.as_ref().join(table_filename(table, interval)?);
    let file = File::create(&path)?;
    serde_json::to_writer(BufWriter::new(file), table)?;
    info!(path = %path.display(), rows = table.len(), "saved table");
    Ok(path)
}

/// Load a previously saved table
///
/// # Errors
///
/// [`Error::Io`] / [`Error::Serialization`] on read failures.
pub fn load_table(path: impl AsRef<Path>) -> Result<SampledTable> {
    let file = File::open(path.as_ref())?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TagAttributes, TagSeries};
    use chrono::NaiveDateTime;
    use std::collections::HashMap;

    fn sample_table() -> SampledTable {
        let start =
            NaiveDateTime::parse_from_str("01/01/2020 00:00:00", HISTORIAN_TIME_FORMAT).unwrap();
        let index: Vec<NaiveDateTime> = (0..3)
            .map(|i| start + chrono::Duration::seconds(i))
            .collect();
        SampledTable::from_parts(
            index,
            vec![TagSeries {
                name: "FI290033PV".to_string(),
                values: vec![1.0, f64::NAN, 3.0],
            }],
            HashMap::from([(
                "FI290033PV".to_string(),
                TagAttributes::from([("descriptor".to_string(), "flow".to_string())]),
            )]),
        )
    }

    #[test]
    fn filename_is_deterministic_and_filesystem_safe() {
        let table = sample_table();
        let interval: SamplingInterval = "1s".parse().unwrap();
        let name = table_filename(&table, &interval).unwrap();
        assert_eq!(
            name,
            "01_01_2020_00_00_00__01_01_2020_00_00_02_1s.json"
        );
        assert_eq!(name, table_filename(&table, &interval).unwrap());
    }

    #[test]
    fn empty_table_has_no_filename() {
        let table = SampledTable::from_parts(vec![], vec![], HashMap::new());
        assert!(matches!(
            table_filename(&table, &"1s".parse().unwrap()),
            Err(Error::EmptyTable)
        ));
    }

    #[test]
    fn save_and_load_keeps_data_and_attributes() {
        let dir = tempfile::tempdir().unwrap();
        let table = sample_table();
        let interval: SamplingInterval = "1s".parse().unwrap();

        let path = save_table(&table, &interval, dir.path()).unwrap();
        let loaded = load_table(&path).unwrap();

        assert_eq!(loaded.index(), table.index());
        assert_eq!(loaded.column("FI290033PV").unwrap()[0], 1.0);
        assert!(loaded.column("FI290033PV").unwrap()[1].is_nan());
        assert_eq!(
            loaded
                .column_attributes("FI290033PV")
                .unwrap()
                .get("descriptor")
                .map(String::as_str),
            Some("flow")
        );
    }
}
