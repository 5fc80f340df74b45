use crate::naming::is_data_file_name;
use crate::table::{ColumnKey, ResultsTable};
use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the aggregate file written next to the results files.
pub const SUMMARY_FILE: &str = "full_data.csv";

/// Aggregate statistics of one results column.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SummaryRow {
    pub key: ColumnKey,
    /// Number of values, reported as 1 for an all-missing column.
    pub nit: usize,
    pub mean: Option<f64>,
    /// Standard error of the mean.
    pub error: Option<f64>,
    /// Same three figures restricted to iterations with an input-output
    /// path at the same (p, q, r).
    pub typical_nit: usize,
    pub typical_mean: Option<f64>,
    pub typical_error: Option<f64>,
}

/// Results files of a directory, sorted by name.
pub fn data_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))? {
        let entry = entry?;
        let name = entry.file_name();
        if name.to_str().is_some_and(is_data_file_name) && entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Loads every results file of a directory into one table.
///
/// Rows are appended file by file. Files that were reserved but never
/// written are skipped.
pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<ResultsTable> {
    let dir = dir.as_ref();
    let mut merged: Option<ResultsTable> = None;
    for path in data_files(dir)? {
        if fs::metadata(&path)?.len() == 0 {
            log::warn!("skipping empty results file {}", path.display());
            continue;
        }
        let table = ResultsTable::load(&path)?;
        log::info!("loaded {} iterations from {}", table.iterations(), path.display());
        match merged.as_mut() {
            Some(m) => m.append(&table),
            None => merged = Some(table),
        }
    }
    match merged {
        Some(table) => Ok(table),
        None => bail!("no results files in {}", dir.display()),
    }
}

fn cell(value: Option<f64>) -> String {
    value.map_or_else(String::new, |v| v.to_string())
}

/// Writes summary rows as CSV with a single header row.
pub fn write_summary<P: AsRef<Path>>(path: P, rows: &[SummaryRow]) -> Result<()> {
    let path = path.as_ref();
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("Failed to create {}", path.display()))?;
    writer.write_record([
        "p",
        "q",
        "r",
        "metric",
        "nit",
        "mean",
        "error",
        "typical_nit",
        "typical_mean",
        "typical_error",
    ])?;
    for row in rows {
        writer.write_record([
            row.key.p.to_string(),
            row.key.q.to_string(),
            row.key.r.to_string(),
            row.key.metric.name().to_string(),
            row.nit.to_string(),
            cell(row.mean),
            cell(row.error),
            row.typical_nit.to_string(),
            cell(row.typical_mean),
            cell(row.typical_error),
        ])?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use perc_common::metrics::Metric;
    use perc_core::metrics::SampleMetrics;

    #[test]
    fn test_load_dir_merges_and_skips_reserved() {
        let dir = tempfile::tempdir().unwrap();
        let m = SampleMetrics {
            lc: 0.5,
            ..SampleMetrics::default()
        };
        let mut a = ResultsTable::new(&[0.1], &[0.5], &[0.1], 2);
        a.record(0, (0.1, 0.5, 0.1), &m).unwrap();
        a.save(dir.path().join("data.csv")).unwrap();
        let mut b = ResultsTable::new(&[0.1], &[0.5], &[0.1], 1);
        b.record(0, (0.1, 0.5, 0.1), &m).unwrap();
        b.save(dir.path().join("data1.csv")).unwrap();
        fs::write(dir.path().join("data2.csv"), "").unwrap();
        fs::write(dir.path().join(SUMMARY_FILE), "ignored").unwrap();

        let merged = load_dir(dir.path()).unwrap();
        assert_eq!(merged.iterations(), 3);
        assert_eq!(merged.filled(), 12);
    }

    #[test]
    fn test_empty_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_dir(dir.path()).is_err());
    }

    #[test]
    fn test_write_summary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SUMMARY_FILE);
        let row = SummaryRow {
            key: ColumnKey {
                p: 0.1,
                q: 0.5,
                r: 0.1,
                metric: Metric::MinCutX,
            },
            nit: 1,
            mean: None,
            error: None,
            typical_nit: 1,
            typical_mean: None,
            typical_error: None,
        };
        write_summary(&path, &[row]).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "p,q,r,metric,nit,mean,error,typical_nit,typical_mean,typical_error");
        assert_eq!(lines[1], "0.1,0.5,0.1,min_cut_X,1,,,1,,");
    }
}
