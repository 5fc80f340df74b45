use perc_common::metrics::Metric;
use perc_core::config::Lattice;
use perc_host::stats::summarize;
use perc_host::sweep::{FileCheckpoint, SweepConfig, run_sweep};
use perc_io::naming::reserve_data_name;
use perc_io::summary::{SUMMARY_FILE, load_dir, write_summary};
use perc_io::table::{ColumnKey, ResultsTable};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn config() -> SweepConfig {
    SweepConfig {
        lattice: Lattice::new(6, 1.0, false).unwrap(),
        ps: vec![0.3, 0.1],
        qs: vec![0.5],
        rs: vec![0.5],
        iterations: 3,
        seed: Some(17),
        checkpoint_every: 1,
        quiet: true,
    }
    .normalized()
    .unwrap()
}

fn filled_metrics(table: &ResultsTable, iteration: usize, p: f64) -> usize {
    Metric::ALL
        .iter()
        .filter(|&&metric| {
            let key = ColumnKey {
                p,
                q: 0.5,
                r: 0.5,
                metric,
            };
            let c = table.column_index(&key).unwrap();
            table.get(iteration, c).is_some()
        })
        .count()
}

#[test]
fn interrupted_sweep_keeps_completed_cells() {
    let dir = tempfile::tempdir().unwrap();
    let path = reserve_data_name(dir.path()).unwrap();
    let config = config();
    let mut sink = FileCheckpoint { path: path.clone() };

    let outcome = run_sweep(&config, &mut StdRng::seed_from_u64(17), &mut sink, |cell| {
        cell.index > 4
    })
    .unwrap();
    assert!(outcome.interrupted);
    assert_eq!(outcome.completed + outcome.failed, 4);

    let saved = ResultsTable::load(&path).unwrap();
    assert_eq!(saved.iterations(), 3);
    assert_eq!(saved.columns().len(), 12);

    // visiting order: (0, 0.1), (0, 0.3), (1, 0.1), (1, 0.3), (2, 0.1), (2, 0.3)
    let cells = [(0, 0.1), (0, 0.3), (1, 0.1), (1, 0.3), (2, 0.1), (2, 0.3)];
    for (k, &(iteration, p)) in cells.iter().enumerate() {
        let expected = if k < 4 { 6 } else { 0 };
        assert_eq!(filled_metrics(&saved, iteration, p), expected, "cell {}", k + 1);
    }
}

#[test]
fn completed_sweep_summarizes() {
    let dir = tempfile::tempdir().unwrap();
    let config = config();
    for seed in [1, 2] {
        let path = reserve_data_name(dir.path()).unwrap();
        let mut sink = FileCheckpoint { path };
        run_sweep(&config, &mut StdRng::seed_from_u64(seed), &mut sink, |_| false).unwrap();
    }

    let merged = load_dir(dir.path()).unwrap();
    assert_eq!(merged.iterations(), 6);
    let rows = summarize(&merged);
    assert_eq!(rows.len(), 12);
    for row in &rows {
        assert_eq!(row.nit, 6);
        assert!(row.mean.is_some());
        assert!(row.typical_nit >= 1);
    }

    let out = dir.path().join(SUMMARY_FILE);
    write_summary(&out, &rows).unwrap();
    // the summary file is not picked up as a results file
    assert_eq!(load_dir(dir.path()).unwrap().iterations(), 6);
}

#[test]
fn same_seed_gives_same_table() {
    let dir = tempfile::tempdir().unwrap();
    let config = config();
    let mut tables = Vec::new();
    for _ in 0..2 {
        let path = reserve_data_name(dir.path()).unwrap();
        let mut sink = FileCheckpoint { path };
        let outcome = run_sweep(&config, &mut StdRng::seed_from_u64(99), &mut sink, |_| false).unwrap();
        tables.push(outcome.table);
    }
    assert_eq!(tables[0], tables[1]);
}
