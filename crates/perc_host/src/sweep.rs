//! Monte-Carlo sweep over the (p, q, r) grid.
//!
//! Cells are visited iteration by iteration, and within an iteration in
//! ascending p, q, r order. After each cell the whole results table is
//! handed to a checkpoint sink, so the file on disk after cell k holds
//! exactly the results of cells 1..k.

use anyhow::{Context, Result, bail};
use perc_core::PercResult;
use perc_core::config::{Lattice, Probabilities};
use perc_core::pipeline::{self, SampleReport};
use perc_io::table::ResultsTable;
use rand::Rng;
use std::path::PathBuf;

/// Parameters of one sweep.
#[derive(Clone, Debug)]
pub struct SweepConfig {
    pub lattice: Lattice,
    pub ps: Vec<f64>,
    pub qs: Vec<f64>,
    pub rs: Vec<f64>,
    pub iterations: usize,
    /// Base seed; drawn from the OS when absent.
    pub seed: Option<u64>,
    /// Number of cells between two checkpoints.
    pub checkpoint_every: usize,
    pub quiet: bool,
}

fn normalize(values: &mut Vec<f64>) {
    values.sort_by(f64::total_cmp);
    values.dedup();
}

impl SweepConfig {
    /// Sorts and deduplicates the value lists and checks every parameter.
    ///
    /// Fails before any sample is drawn if the lattice is invalid, a list
    /// is empty, a probability lies outside [0, 1], or a count is zero.
    pub fn normalized(mut self) -> Result<Self> {
        self.lattice.validate()?;
        for (name, values) in [("p", &mut self.ps), ("q", &mut self.qs), ("r", &mut self.rs)] {
            if values.is_empty() {
                bail!("no values given for {}", name);
            }
            normalize(values);
        }
        for &(p, q, r) in &self.combos() {
            Probabilities::new(p, q, r)?;
        }
        if self.iterations == 0 {
            bail!("iterations must be positive");
        }
        if self.checkpoint_every == 0 {
            bail!("checkpoint interval must be positive");
        }
        Ok(self)
    }

    /// The (p, q, r) grid in visiting order.
    pub fn combos(&self) -> Vec<(f64, f64, f64)> {
        let mut combos = Vec::with_capacity(self.ps.len() * self.qs.len() * self.rs.len());
        for &p in &self.ps {
            for &q in &self.qs {
                for &r in &self.rs {
                    combos.push((p, q, r));
                }
            }
        }
        combos
    }

    pub fn num_cells(&self) -> usize {
        self.iterations * self.ps.len() * self.qs.len() * self.rs.len()
    }

    pub fn empty_table(&self) -> ResultsTable {
        ResultsTable::new(&self.ps, &self.qs, &self.rs, self.iterations)
    }
}

/// Position of one sample in the sweep.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cell {
    /// 1-based position in visiting order.
    pub index: usize,
    pub iteration: usize,
    pub p: f64,
    pub q: f64,
    pub r: f64,
}

/// Destination of checkpoints.
pub trait Checkpoint {
    fn save(&mut self, table: &ResultsTable) -> Result<()>;
}

/// Checkpoints to a results file with a full atomic replace.
#[derive(Clone, Debug)]
pub struct FileCheckpoint {
    pub path: PathBuf,
}

impl Checkpoint for FileCheckpoint {
    fn save(&mut self, table: &ResultsTable) -> Result<()> {
        table.save(&self.path)
    }
}

/// What a sweep did.
#[derive(Clone, Debug)]
pub struct SweepOutcome {
    pub table: ResultsTable,
    /// Cells whose sample succeeded.
    pub completed: usize,
    /// Cells whose sample failed; their values stay missing.
    pub failed: usize,
    /// True if the stop hook ended the sweep early.
    pub interrupted: bool,
}

/// Runs a sweep with the default sample pipeline.
///
/// See [`run_sweep_with`].
pub fn run_sweep<R, C, F>(
    config: &SweepConfig,
    rng: &mut R,
    checkpoint: &mut C,
    should_stop: F,
) -> Result<SweepOutcome>
where
    R: Rng + ?Sized,
    C: Checkpoint + ?Sized,
    F: FnMut(&Cell) -> bool,
{
    run_sweep_with(config, rng, checkpoint, should_stop, |lattice, probs, rng| {
        pipeline::sample(lattice, probs, rng)
    })
}

/// Runs a sweep, drawing every cell through `sample`.
///
/// A failing sample is logged with its cell and leaves the cell missing.
/// A failing checkpoint is logged and retried after the next cell; if the
/// last checkpoint of the run fails, the run is reported as incomplete.
///
/// # Arguments
///
/// * `config` - Normalized sweep parameters
/// * `rng` - Random source for every sample, in visiting order
/// * `checkpoint` - Where the table is persisted
/// * `should_stop` - Asked before each cell; returning true ends the sweep
/// * `sample` - Produces one sample for a lattice and probability triple
///
/// # Returns
///
/// The final table and cell counts, or an error if the final checkpoint
/// could not be written.
pub fn run_sweep_with<R, C, F, S>(
    config: &SweepConfig,
    rng: &mut R,
    checkpoint: &mut C,
    mut should_stop: F,
    mut sample: S,
) -> Result<SweepOutcome>
where
    R: Rng + ?Sized,
    C: Checkpoint + ?Sized,
    F: FnMut(&Cell) -> bool,
    S: FnMut(&Lattice, &Probabilities, &mut R) -> PercResult<SampleReport>,
{
    let combos = config.combos();
    let total = config.num_cells();
    let mut outcome = SweepOutcome {
        table: config.empty_table(),
        completed: 0,
        failed: 0,
        interrupted: false,
    };
    let mut since_checkpoint = 0;
    let mut index = 0;

    log::info!(
        "sweeping {} cells (N={}, t_factor={}, periodic={})",
        total,
        config.lattice.n,
        config.lattice.t_factor,
        config.lattice.periodic
    );

    'sweep: for iteration in 0..config.iterations {
        for &(p, q, r) in &combos {
            index += 1;
            let cell = Cell {
                index,
                iteration,
                p,
                q,
                r,
            };
            if should_stop(&cell) {
                log::warn!("sweep interrupted before cell {}/{}", index, total);
                outcome.interrupted = true;
                break 'sweep;
            }

            match Probabilities::new(p, q, r).and_then(|probs| sample(&config.lattice, &probs, rng)) {
                Ok(report) => {
                    outcome.table.record(iteration, (p, q, r), &report.metrics)?;
                    outcome.completed += 1;
                }
                Err(e) => {
                    log::error!(
                        "sample failed at iteration {}, p={}, q={}, r={}: {:#}",
                        iteration,
                        p,
                        q,
                        r,
                        e
                    );
                    outcome.failed += 1;
                }
            }

            since_checkpoint += 1;
            if since_checkpoint >= config.checkpoint_every && index < total {
                match checkpoint.save(&outcome.table) {
                    Ok(()) => since_checkpoint = 0,
                    Err(e) => log::warn!("checkpoint after cell {} failed, retrying: {:#}", index, e),
                }
            }
        }
        if !config.quiet {
            log::info!("iteration {}/{} done", iteration + 1, config.iterations);
        }
    }

    checkpoint
        .save(&outcome.table)
        .context("final checkpoint failed; the run is incomplete")?;
    log::info!(
        "sweep finished: {} completed, {} failed{}",
        outcome.completed,
        outcome.failed,
        if outcome.interrupted { ", interrupted" } else { "" }
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn config(iterations: usize, checkpoint_every: usize) -> SweepConfig {
        SweepConfig {
            lattice: Lattice::new(4, 1.0, false).unwrap(),
            ps: vec![0.5, 0.0, 0.5],
            qs: vec![0.5],
            rs: vec![0.5],
            iterations,
            seed: Some(1),
            checkpoint_every,
            quiet: true,
        }
        .normalized()
        .unwrap()
    }

    /// Records every saved table and fails on the listed save calls.
    #[derive(Default)]
    struct Recorder {
        saved: Vec<usize>,
        fail_on: Vec<usize>,
        calls: usize,
    }

    impl Checkpoint for Recorder {
        fn save(&mut self, table: &ResultsTable) -> Result<()> {
            self.calls += 1;
            if self.fail_on.contains(&self.calls) {
                bail!("disk full");
            }
            self.saved.push(table.filled() / 6);
            Ok(())
        }
    }

    #[test]
    fn test_normalization() {
        let c = config(2, 1);
        assert_eq!(c.ps, vec![0.0, 0.5]);
        assert_eq!(c.num_cells(), 4);
        assert_eq!(c.combos()[1], (0.5, 0.5, 0.5));

        let mut bad = c.clone();
        bad.rs = vec![1.5];
        assert!(bad.normalized().is_err());
        let mut none = config(1, 1);
        none.qs.clear();
        assert!(none.normalized().is_err());
    }

    #[test]
    fn test_checkpoint_after_every_cell() {
        let c = config(2, 1);
        let mut sink = Recorder::default();
        let out = run_sweep(&c, &mut StdRng::seed_from_u64(0), &mut sink, |_| false).unwrap();
        assert_eq!(out.completed, 4);
        assert_eq!(sink.saved, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_checkpoint_interval() {
        let c = config(3, 4);
        let mut sink = Recorder::default();
        run_sweep(&c, &mut StdRng::seed_from_u64(0), &mut sink, |_| false).unwrap();
        assert_eq!(sink.saved, vec![4, 6]);
    }

    #[test]
    fn test_failed_checkpoint_retried_next_cell() {
        let c = config(2, 1);
        let mut sink = Recorder {
            fail_on: vec![2],
            ..Recorder::default()
        };
        let out = run_sweep(&c, &mut StdRng::seed_from_u64(0), &mut sink, |_| false).unwrap();
        assert_eq!(out.completed, 4);
        assert_eq!(sink.saved, vec![1, 3, 4]);
    }

    #[test]
    fn test_failed_final_checkpoint_is_an_error() {
        let c = config(1, 1);
        let mut sink = Recorder {
            fail_on: vec![2],
            ..Recorder::default()
        };
        assert!(run_sweep(&c, &mut StdRng::seed_from_u64(0), &mut sink, |_| false).is_err());
    }

    #[test]
    fn test_stop_hook_sees_cells_in_order() {
        let c = config(2, 1);
        let mut seen = Vec::new();
        let mut sink = Recorder::default();
        let out = run_sweep(&c, &mut StdRng::seed_from_u64(0), &mut sink, |cell| {
            seen.push((cell.index, cell.iteration, cell.p));
            cell.index == 3
        })
        .unwrap();
        assert!(out.interrupted);
        assert_eq!(out.completed, 2);
        assert_eq!(seen, vec![(1, 0, 0.0), (2, 0, 0.5), (3, 1, 0.0)]);
        assert_eq!(sink.saved.last(), Some(&2));
    }
}
