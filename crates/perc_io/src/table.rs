//! Results table persistence.
//!
//! On disk the table is a CSV file with four header rows and one row per
//! iteration:
//!
//! ```text
//! p,0.1,0.1,...
//! q,0.5,0.5,...
//! r,0.1,0.1,...
//! metric,lc,slc,...
//! 0,0.21,0.08,...
//! 1,,,...
//! ```
//!
//! The first cell of each header row names the key level and the first
//! cell of each data row is the iteration index. An empty cell is a value
//! that has not been computed.

use anyhow::{Context, Result, anyhow, bail};
use perc_common::metrics::Metric;
use perc_core::metrics::SampleMetrics;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

const LEVELS: [&str; 4] = ["p", "q", "r", "metric"];

/// Composite column key.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColumnKey {
    pub p: f64,
    pub q: f64,
    pub r: f64,
    pub metric: Metric,
}

/// Dense table of optional values, `iterations x columns`.
#[derive(Clone, Debug, PartialEq)]
pub struct ResultsTable {
    columns: Vec<ColumnKey>,
    iterations: usize,
    cells: Vec<Option<f64>>,
}

impl ResultsTable {
    /// Creates an empty table for the Cartesian product of the value lists.
    ///
    /// Columns are ordered by p, then q, then r, then metric, each in the
    /// order given. Every cell starts out missing.
    pub fn new(ps: &[f64], qs: &[f64], rs: &[f64], iterations: usize) -> Self {
        let mut columns = Vec::with_capacity(ps.len() * qs.len() * rs.len() * Metric::ALL.len());
        for &p in ps {
            for &q in qs {
                for &r in rs {
                    for metric in Metric::ALL {
                        columns.push(ColumnKey { p, q, r, metric });
                    }
                }
            }
        }
        Self::with_columns(columns, iterations)
    }

    pub fn with_columns(columns: Vec<ColumnKey>, iterations: usize) -> Self {
        let cells = vec![None; columns.len() * iterations];
        Self {
            columns,
            iterations,
            cells,
        }
    }

    pub fn columns(&self) -> &[ColumnKey] {
        &self.columns
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn column_index(&self, key: &ColumnKey) -> Option<usize> {
        self.columns.iter().position(|c| c == key)
    }

    pub fn get(&self, iteration: usize, column: usize) -> Option<f64> {
        if iteration >= self.iterations || column >= self.columns.len() {
            return None;
        }
        self.cells[iteration * self.columns.len() + column]
    }

    /// Values of one column, one entry per iteration.
    pub fn column(&self, column: usize) -> impl Iterator<Item = Option<f64>> + '_ {
        (0..self.iterations).map(move |i| self.get(i, column))
    }

    /// Number of cells that hold a value.
    pub fn filled(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Stores one value.
    ///
    /// # Returns
    ///
    /// An error if the iteration is out of range or no column has this key.
    pub fn set(&mut self, iteration: usize, key: &ColumnKey, value: Option<f64>) -> Result<()> {
        let column = self
            .column_index(key)
            .ok_or_else(|| anyhow!("no column for {:?}", key))?;
        if iteration >= self.iterations {
            bail!(
                "iteration {} out of range (table has {})",
                iteration,
                self.iterations
            );
        }
        let width = self.columns.len();
        self.cells[iteration * width + column] = value;
        Ok(())
    }

    /// Stores all metrics of one sample at `(iteration, p, q, r)`.
    pub fn record(
        &mut self,
        iteration: usize,
        (p, q, r): (f64, f64, f64),
        metrics: &SampleMetrics,
    ) -> Result<()> {
        for (metric, value) in metrics.values() {
            self.set(iteration, &ColumnKey { p, q, r, metric }, Some(value))?;
        }
        Ok(())
    }

    /// Appends the rows of `other`, widening the column set as needed.
    ///
    /// Columns only present on one side are missing on the other side's
    /// rows.
    pub fn append(&mut self, other: &ResultsTable) {
        let mut columns = self.columns.clone();
        for key in &other.columns {
            if !columns.contains(key) {
                columns.push(*key);
            }
        }
        let mut merged = ResultsTable::with_columns(columns, self.iterations + other.iterations);
        let width = merged.columns.len();
        for (source, offset) in [(&*self, 0), (other, self.iterations)] {
            for (c, key) in source.columns.iter().enumerate() {
                let Some(target) = merged.column_index(key) else {
                    continue;
                };
                for i in 0..source.iterations {
                    merged.cells[(offset + i) * width + target] = source.get(i, c);
                }
            }
        }
        *self = merged;
    }

    fn to_records(&self) -> Vec<Vec<String>> {
        let mut records = Vec::with_capacity(LEVELS.len() + self.iterations);
        for (level, name) in LEVELS.iter().enumerate() {
            let mut row = vec![name.to_string()];
            row.extend(self.columns.iter().map(|k| match level {
                0 => k.p.to_string(),
                1 => k.q.to_string(),
                2 => k.r.to_string(),
                _ => k.metric.name().to_string(),
            }));
            records.push(row);
        }
        for i in 0..self.iterations {
            let mut row = vec![i.to_string()];
            row.extend(
                (0..self.columns.len()).map(|c| self.get(i, c).map_or_else(String::new, |v| v.to_string())),
            );
            records.push(row);
        }
        records
    }

    /// Writes the table to `path`, replacing any previous content.
    ///
    /// The table is written to `<path>.tmp` first and then renamed over
    /// `path`, so a reader never sees a partially written file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let tmp = tmp_path(path);
        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_path(&tmp)
                .with_context(|| format!("Failed to create {}", tmp.display()))?;
            for record in self.to_records() {
                writer.write_record(&record)?;
            }
            writer
                .flush()
                .with_context(|| format!("Failed to write {}", tmp.display()))?;
        }
        fs::rename(&tmp, path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }

    /// Reads a table written by [`ResultsTable::save`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(path)
            .with_context(|| format!("Failed to open results table {}", path.display()))?;

        let mut records = Vec::new();
        for record in reader.records() {
            records.push(record.with_context(|| format!("Failed to read {}", path.display()))?);
        }
        if records.len() < LEVELS.len() {
            bail!("{}: missing header rows", path.display());
        }

        let mut header: Vec<Vec<&str>> = Vec::with_capacity(LEVELS.len());
        for (record, level) in records.iter().zip(LEVELS) {
            if record.get(0) != Some(level) {
                bail!(
                    "{}: expected header row {:?}, found {:?}",
                    path.display(),
                    level,
                    record.get(0)
                );
            }
            header.push(record.iter().skip(1).collect());
        }

        let width = header[0].len();
        if header.iter().any(|h| h.len() != width) {
            bail!("{}: header rows differ in length", path.display());
        }
        let mut columns = Vec::with_capacity(width);
        for c in 0..width {
            let metric = Metric::from_name(header[3][c])
                .ok_or_else(|| anyhow!("{}: unknown metric {:?}", path.display(), header[3][c]))?;
            columns.push(ColumnKey {
                p: parse_float(header[0][c], path)?,
                q: parse_float(header[1][c], path)?,
                r: parse_float(header[2][c], path)?,
                metric,
            });
        }

        let rows = &records[LEVELS.len()..];
        let mut table = ResultsTable::with_columns(columns, rows.len());
        for (i, record) in rows.iter().enumerate() {
            if record.len() != width + 1 {
                bail!("{}: row {} has {} cells, expected {}", path.display(), i, record.len(), width + 1);
            }
            for (c, cell) in record.iter().skip(1).enumerate() {
                if !cell.is_empty() {
                    table.cells[i * width + c] = Some(parse_float(cell, path)?);
                }
            }
        }
        Ok(table)
    }
}

fn parse_float(text: &str, path: &Path) -> Result<f64> {
    text.trim()
        .parse::<f64>()
        .with_context(|| format!("{}: {:?} is not a number", path.display(), text))
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}
