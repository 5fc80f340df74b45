//! Column statistics for finished sweeps.
//!
//! Reduces every column of a results table to its mean and standard error,
//! both over all iterations and over the "typical" iterations in which an
//! input-output path existed.

use perc_common::metrics::Metric;
use perc_io::summary::SummaryRow;
use perc_io::table::{ColumnKey, ResultsTable};

/// Running mean and variance of a stream of values.
///
/// Uses Welford's update, so values can be added one at a time without
/// keeping them around.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ColumnStats {
    pub count: usize,
    mean: f64,
    m2: f64,
}

impl ColumnStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    /// Mean of the values seen, None before the first value.
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then_some(self.mean)
    }

    /// Sample standard deviation (n - 1 in the denominator).
    ///
    /// Zero for a single value, None for none.
    pub fn std(&self) -> Option<f64> {
        match self.count {
            0 => None,
            1 => Some(0.0),
            n => Some((self.m2 / (n - 1) as f64).sqrt()),
        }
    }

    /// Standard error of the mean.
    pub fn error(&self) -> Option<f64> {
        self.std().map(|s| s / (self.count as f64).sqrt())
    }

    /// Count as reported in summaries: never below one.
    pub fn nit(&self) -> usize {
        self.count.max(1)
    }
}

/// Summarizes every column of a table.
///
/// Typical statistics use the iterations whose `is_path` value at the same
/// (p, q, r) is 1. If the table has no `is_path` column for a triple, no
/// iteration counts as typical. The typical error divides the typical
/// standard deviation by the square root of the column's full `nit`.
pub fn summarize(table: &ResultsTable) -> Vec<SummaryRow> {
    let mut rows = Vec::with_capacity(table.columns().len());
    for (c, key) in table.columns().iter().enumerate() {
        let path_column = table.column_index(&ColumnKey {
            metric: Metric::IsPath,
            ..*key
        });

        let mut all = ColumnStats::new();
        let mut typical = ColumnStats::new();
        for i in 0..table.iterations() {
            let Some(value) = table.get(i, c) else {
                continue;
            };
            all.update(value);
            if path_column.and_then(|pc| table.get(i, pc)) == Some(1.0) {
                typical.update(value);
            }
        }

        rows.push(SummaryRow {
            key: *key,
            nit: all.nit(),
            mean: all.mean(),
            error: all.error(),
            typical_nit: typical.nit(),
            typical_mean: typical.mean(),
            typical_error: typical.std().map(|s| s / (all.nit() as f64).sqrt()),
        });
    }
    rows
}

/// Prints summary rows as an aligned table.
pub fn print_report(rows: &[SummaryRow]) {
    let fmt = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{:.4}", v));
    println!(
        "{:>6} {:>6} {:>6} {:>10} {:>5} {:>10} {:>10} {:>10}",
        "p", "q", "r", "metric", "nit", "mean", "error", "typical"
    );
    for row in rows {
        println!(
            "{:>6} {:>6} {:>6} {:>10} {:>5} {:>10} {:>10} {:>10}",
            row.key.p,
            row.key.q,
            row.key.r,
            row.key.metric.name(),
            row.nit,
            fmt(row.mean),
            fmt(row.error),
            fmt(row.typical_mean)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use perc_core::metrics::SampleMetrics;

    #[test]
    fn test_column_stats() {
        let mut s = ColumnStats::new();
        assert_eq!(s.mean(), None);
        assert_eq!(s.nit(), 1);
        s.update(2.0);
        assert_eq!(s.std(), Some(0.0));
        for v in [4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            s.update(v);
        }
        assert!((s.mean().unwrap() - 5.0).abs() < 1e-12);
        let std = (32.0f64 / 7.0).sqrt();
        assert!((s.std().unwrap() - std).abs() < 1e-12);
        assert!((s.error().unwrap() - std / 8f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_typical_restricted_to_paths() {
        let mut table = ResultsTable::new(&[0.2], &[0.5], &[0.5], 3);
        let key = (0.2, 0.5, 0.5);
        let with_path = SampleMetrics {
            lc: 0.8,
            is_path: true,
            min_cut: 2,
            ..SampleMetrics::default()
        };
        let without = SampleMetrics {
            lc: 0.2,
            ..SampleMetrics::default()
        };
        table.record(0, key, &with_path).unwrap();
        table.record(1, key, &without).unwrap();

        let rows = summarize(&table);
        assert_eq!(rows.len(), 6);
        let lc = &rows[0];
        assert_eq!(lc.key.metric, Metric::Lc);
        assert_eq!(lc.nit, 2);
        assert!((lc.mean.unwrap() - 0.5).abs() < 1e-12);
        assert_eq!(lc.typical_nit, 1);
        assert_eq!(lc.typical_mean, Some(0.8));
        assert_eq!(lc.typical_error, Some(0.0));

        let cut = &rows[3];
        assert_eq!(cut.key.metric, Metric::MinCut);
        assert_eq!(cut.typical_mean, Some(2.0));
    }

    #[test]
    fn test_typical_error_uses_full_count() {
        let mut table = ResultsTable::new(&[0.2], &[0.5], &[0.5], 3);
        let key = (0.2, 0.5, 0.5);
        for (i, lc, is_path) in [(0, 0.8, true), (1, 0.6, true), (2, 0.2, false)] {
            let m = SampleMetrics {
                lc,
                is_path,
                ..SampleMetrics::default()
            };
            table.record(i, key, &m).unwrap();
        }

        let lc = &summarize(&table)[0];
        assert_eq!(lc.nit, 3);
        assert_eq!(lc.typical_nit, 2);
        assert!((lc.typical_mean.unwrap() - 0.7).abs() < 1e-12);
        let std = 0.02f64.sqrt();
        assert!((lc.typical_error.unwrap() - std / 3f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_empty_column() {
        let table = ResultsTable::new(&[0.2], &[0.5], &[0.5], 2);
        let rows = summarize(&table);
        assert!(rows.iter().all(|r| r.nit == 1 && r.mean.is_none() && r.typical_mean.is_none()));
    }
}
