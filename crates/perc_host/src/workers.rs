//! Parallel sweeps.
//!
//! Splits the iterations of a sweep between independent workers. Worker k
//! gets its own random source seeded with `seed + k`, its own output file
//! and its own results table, so nothing is shared while they run.

use crate::sweep::{FileCheckpoint, SweepConfig, SweepOutcome, run_sweep};
use anyhow::Result;
use perc_io::naming::reserve_data_name;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// One worker's share of a sweep.
#[derive(Clone, Debug)]
pub struct WorkerPlan {
    pub worker: usize,
    pub seed: u64,
    pub iterations: usize,
    pub path: PathBuf,
}

/// Result of one worker.
#[derive(Debug)]
pub struct WorkerReport {
    pub plan: WorkerPlan,
    pub outcome: Result<SweepOutcome>,
}

/// Divides `iterations` into `workers` near-equal shares.
///
/// Earlier workers take the remainder. Never returns a zero share; with
/// fewer iterations than workers the surplus workers are dropped.
pub fn split_iterations(iterations: usize, workers: usize) -> Vec<usize> {
    let workers = workers.clamp(1, iterations.max(1));
    let base = iterations / workers;
    let extra = iterations % workers;
    (0..workers)
        .map(|k| base + usize::from(k < extra))
        .filter(|&n| n > 0)
        .collect()
}

/// Reserves one output file per worker in `dir`.
///
/// Names are claimed up front, in worker order, before any sampling.
pub fn plan_workers<P: AsRef<Path>>(
    config: &SweepConfig,
    dir: P,
    workers: usize,
    seed: u64,
) -> Result<Vec<WorkerPlan>> {
    let mut plans = Vec::new();
    for (worker, iterations) in split_iterations(config.iterations, workers).into_iter().enumerate() {
        plans.push(WorkerPlan {
            worker,
            seed: seed.wrapping_add(worker as u64),
            iterations,
            path: reserve_data_name(dir.as_ref())?,
        });
    }
    Ok(plans)
}

/// Runs the planned workers on the rayon pool.
///
/// A failing worker does not stop the others; each report carries its own
/// outcome.
pub fn run_workers(config: &SweepConfig, plans: Vec<WorkerPlan>) -> Vec<WorkerReport> {
    plans
        .into_par_iter()
        .map(|plan| {
            let worker_config = SweepConfig {
                iterations: plan.iterations,
                ..config.clone()
            };
            let mut rng = StdRng::seed_from_u64(plan.seed);
            let mut sink = FileCheckpoint {
                path: plan.path.clone(),
            };
            log::info!(
                "worker {} running {} iterations into {}",
                plan.worker,
                plan.iterations,
                plan.path.display()
            );
            let outcome = run_sweep(&worker_config, &mut rng, &mut sink, |_| false);
            WorkerReport { plan, outcome }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use perc_core::config::Lattice;

    #[test]
    fn test_split_iterations() {
        assert_eq!(split_iterations(10, 3), vec![4, 3, 3]);
        assert_eq!(split_iterations(2, 5), vec![1, 1]);
        assert_eq!(split_iterations(7, 1), vec![7]);
        assert_eq!(split_iterations(4, 0), vec![4]);
    }

    #[test]
    fn test_workers_write_separate_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = SweepConfig {
            lattice: Lattice::new(4, 1.0, true).unwrap(),
            ps: vec![0.2],
            qs: vec![0.5],
            rs: vec![0.5],
            iterations: 3,
            seed: Some(5),
            checkpoint_every: 1,
            quiet: true,
        }
        .normalized()
        .unwrap();
        let plans = plan_workers(&config, dir.path(), 2, 5).unwrap();
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[1].seed, 6);
        assert_ne!(plans[0].path, plans[1].path);

        let reports = run_workers(&config, plans);
        let mut iterations = 0;
        for report in &reports {
            let outcome = report.outcome.as_ref().unwrap();
            assert_eq!(outcome.table.iterations(), report.plan.iterations);
            let saved = perc_io::table::ResultsTable::load(&report.plan.path).unwrap();
            assert_eq!(&saved, &outcome.table);
            iterations += saved.iterations();
        }
        assert_eq!(iterations, 3);
    }
}
