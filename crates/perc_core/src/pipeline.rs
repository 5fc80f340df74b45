//! Single-sample pipeline.
//!
//! Chains the stages for one `(iteration, p, q, r)` cell: resolve a gate
//! grid, build the diagram, simplify it and compute the metrics. The
//! pipeline holds no state between samples; everything it needs is passed
//! in, including the random source.

use crate::builder::build_diagram;
use crate::config::{Lattice, Probabilities};
use crate::graph::DiagramStats;
use crate::metrics::{SampleMetrics, compute_metrics};
use crate::rules::{RewriteEngine, SpiderRules};
use crate::sampler::{GateGrid, sample_gate_grid};
use crate::simplify::{SimplifyReport, simplify_with};
use crate::PercResult;
use rand::Rng;

/// Everything learned from one sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SampleReport {
    pub metrics: SampleMetrics,
    /// Diagram sizes straight out of the builder.
    pub before: DiagramStats,
    /// Diagram sizes at the simplification fixed point.
    pub after: DiagramStats,
    pub simplify: SimplifyReport,
}

/// Picks the gate grid for a sample.
///
/// An explicit grid takes precedence and is only checked against the
/// lattice. Without one, all three probabilities must be present and a grid
/// is drawn from `rng`.
///
/// # Returns
///
/// The grid, `MissingParameters` if neither a grid nor a full triple was
/// given, or the validation error of the lattice or probabilities. No
/// randomness is consumed when an error is returned.
pub fn resolve_grid<R: Rng + ?Sized>(
    lattice: &Lattice,
    grid: Option<GateGrid>,
    p: Option<f64>,
    q: Option<f64>,
    r: Option<f64>,
    rng: &mut R,
) -> PercResult<GateGrid> {
    lattice.validate()?;
    if let Some(grid) = grid {
        grid.check_shape(lattice)?;
        return Ok(grid);
    }
    let probs = Probabilities::from_parts(p, q, r)?;
    Ok(sample_gate_grid(lattice, &probs, rng)?.grid)
}

/// Runs one sample on a resolved grid.
///
/// # Arguments
///
/// * `lattice` - Lattice the grid was drawn for
/// * `grid` - Gate grid
/// * `rng` - Random source for gadget orientation
/// * `engine` - Rewrite rules for simplification
pub fn run_sample<R, E>(
    lattice: &Lattice,
    grid: &GateGrid,
    rng: &mut R,
    engine: &mut E,
) -> PercResult<SampleReport>
where
    R: Rng + ?Sized,
    E: RewriteEngine + ?Sized,
{
    let (mut diagram, _) = build_diagram(grid, lattice, rng)?;
    let before = diagram.stats();
    let simplify = simplify_with(&mut diagram, engine)?;
    let after = diagram.stats();
    let metrics = compute_metrics(&diagram, engine)?;
    log::debug!("sample metrics {:?}", metrics);
    Ok(SampleReport {
        metrics,
        before,
        after,
        simplify,
    })
}

/// Draws a grid and runs one sample on it with the default spider rules.
pub fn sample<R: Rng + ?Sized>(
    lattice: &Lattice,
    probs: &Probabilities,
    rng: &mut R,
) -> PercResult<SampleReport> {
    let grid = sample_gate_grid(lattice, probs, rng)?.grid;
    run_sample(lattice, &grid, rng, &mut SpiderRules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PercError;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_pure_swaps_give_independent_wires() {
        let lattice = Lattice::new(4, 1.0, false).unwrap();
        let probs = Probabilities::new(0.0, 0.5, 0.0).unwrap();
        let report = sample(&lattice, &probs, &mut StdRng::seed_from_u64(1)).unwrap();
        let m = report.metrics;
        assert_eq!(report.after.nodes, 8);
        assert_eq!(report.after.edges, 4);
        assert!((m.lc - 0.25).abs() < 1e-12);
        assert!((m.slc - 0.25).abs() < 1e-12);
        assert!(m.is_path);
        assert_eq!(m.min_cut, 4);
        assert_eq!(m.min_cut_ff, m.min_cut);
        assert_eq!(m.min_cut_x, 0);
    }

    #[test]
    fn test_pure_bell_projections_disconnect_inputs() {
        for periodic in [false, true] {
            let lattice = Lattice::new(4, 1.0, periodic).unwrap();
            let probs = Probabilities::new(1.0, 1.0, 0.0).unwrap();
            let report = sample(&lattice, &probs, &mut StdRng::seed_from_u64(3)).unwrap();
            assert_eq!(report.before.z + report.before.x, 0);
            assert_eq!(report.after.z + report.after.x, 0);
            assert!(!report.metrics.is_path);
            assert_eq!(report.metrics.min_cut, 0);
            assert_eq!(report.metrics.min_cut_ff, 0);
            assert!(report.metrics.min_cut_x <= 2);
        }
    }

    #[test]
    fn test_incomplete_triple_fails_before_sampling() {
        let lattice = Lattice::new(4, 1.0, false).unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        let err = resolve_grid(&lattice, None, Some(0.1), None, Some(0.2), &mut rng).unwrap_err();
        assert!(matches!(err, PercError::MissingParameters));
        let mut fresh = StdRng::seed_from_u64(9);
        assert_eq!(rng.gen_range(0..u32::MAX), fresh.gen_range(0..u32::MAX));
    }

    #[test]
    fn test_explicit_grid_wins() {
        let lattice = Lattice::new(2, 1.0, false).unwrap();
        let grid = GateGrid::from_rows(vec![vec![perc_common::gates::Gate::Swap]; 2]).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let resolved = resolve_grid(&lattice, Some(grid.clone()), None, None, None, &mut rng).unwrap();
        assert_eq!(resolved, grid);

        let wrong = GateGrid::from_rows(vec![vec![perc_common::gates::Gate::Swap]; 4]).unwrap();
        let err = resolve_grid(&lattice, Some(wrong), None, None, None, &mut rng).unwrap_err();
        assert!(matches!(err, PercError::GridShape { .. }));
    }

    #[test]
    fn test_metric_bounds_on_random_samples() {
        let lattice = Lattice::new(6, 2.0, true).unwrap();
        let probs = Probabilities::new(0.3, 0.5, 0.5).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..20 {
            let report = sample(&lattice, &probs, &mut rng).unwrap();
            let m = report.metrics;
            assert!(m.lc + m.slc <= 1.0 + 1e-12);
            assert!(m.min_cut <= 6);
            assert!(m.min_cut_x <= 3);
            assert_eq!(m.is_path, m.min_cut > 0);
            assert!(report.after.nodes <= report.before.nodes);
        }
    }
}
