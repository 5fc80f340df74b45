//! The six per-sample metrics.

use crate::analysis::{AnalysisGraph, path_exists, percolation};
use crate::flow::{Terminals, min_cut};
use crate::graph::{Diagram, NodeKind};
use crate::rules::RewriteEngine;
use crate::simplify::simplify_with;
use crate::PercResult;
use perc_common::metrics::Metric;

/// Metrics of one simplified diagram.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SampleMetrics {
    pub lc: f64,
    pub slc: f64,
    pub is_path: bool,
    pub min_cut: u64,
    /// Same formulation as `min_cut`, reported under its own column.
    pub min_cut_ff: u64,
    pub min_cut_x: u64,
}

impl SampleMetrics {
    /// Value of a single metric as stored in a results table.
    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Lc => self.lc,
            Metric::Slc => self.slc,
            Metric::IsPath => {
                if self.is_path {
                    1.0
                } else {
                    0.0
                }
            }
            Metric::MinCut => self.min_cut as f64,
            Metric::MinCutFf => self.min_cut_ff as f64,
            Metric::MinCutX => self.min_cut_x as f64,
        }
    }

    /// All metrics in column order.
    pub fn values(&self) -> [(Metric, f64); 6] {
        Metric::ALL.map(|m| (m, self.get(m)))
    }
}

/// Whether the diagram is altered before a cut is taken.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Recolor {
    /// Cut the diagram as it is.
    Keep,
    /// Turn every input into an internal X spider and simplify again.
    InputsToX,
}

/// Minimum cut of a simplified diagram under a terminal selection and a
/// recolouring policy.
///
/// Recolouring works on a copy; `diagram` is never modified. The recoloured
/// inputs leave the input set, so after `InputsToX` only outputs are left
/// to select terminals from.
///
/// # Arguments
///
/// * `diagram` - Simplified diagram
/// * `terminals` - How sources and sinks are picked
/// * `recolor` - Transformation applied before the cut
/// * `engine` - Rewrite rules for the second simplification
pub fn min_cut_with<E: RewriteEngine + ?Sized>(
    diagram: &Diagram,
    terminals: Terminals,
    recolor: Recolor,
    engine: &mut E,
) -> PercResult<u64> {
    let graph = match recolor {
        Recolor::Keep => AnalysisGraph::from_diagram(diagram),
        Recolor::InputsToX => {
            let mut recolored = diagram.clone();
            for id in recolored.take_inputs() {
                recolored.set_kind(id, NodeKind::X)?;
            }
            simplify_with(&mut recolored, engine)?;
            AnalysisGraph::from_diagram(&recolored)
        }
    };
    let (sources, sinks) = terminals.select(&graph);
    Ok(min_cut(&graph, &sources, &sinks))
}

/// Computes every metric of a simplified diagram.
pub fn compute_metrics<E: RewriteEngine + ?Sized>(
    diagram: &Diagram,
    engine: &mut E,
) -> PercResult<SampleMetrics> {
    let graph = AnalysisGraph::from_diagram(diagram);
    let perc = percolation(&graph, diagram.num_nodes());

    let (sources, sinks) = Terminals::InputsToOutputs.select(&graph);
    let direct = min_cut(&graph, &sources, &sinks);
    let ff = min_cut(&graph, &sources, &sinks);
    let x = min_cut_with(diagram, Terminals::OutputHalves, Recolor::InputsToX, engine)?;

    Ok(SampleMetrics {
        lc: perc.lc,
        slc: perc.slc,
        is_path: path_exists(&graph),
        min_cut: direct,
        min_cut_ff: ff,
        min_cut_x: x,
    })
}
