//! Fixed-point simplification of built diagrams.
//!
//! Runs in two stages. The excess-node pass deletes every boundary
//! placeholder that is not a declared input or output, splicing its
//! neighbours together. The rewrite stage then alternates spider fusion and
//! identity removal until a full round changes nothing.

use crate::graph::{Diagram, EdgeType, NodeKind};
use crate::rules::{RewriteEngine, SpiderRules};
use crate::{NodeId, PercError, PercResult};

/// Outcome of one simplification run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SimplifyReport {
    /// Placeholders removed by the excess-node pass.
    pub excess_removed: usize,
    /// Spider fusions applied.
    pub fusions: usize,
    /// Identity spiders removed.
    pub identities: usize,
    /// Rewrite rounds, including the final round that changed nothing.
    pub passes: usize,
}

/// Simplifies a diagram in place with the default spider rules.
pub fn simplify(diagram: &mut Diagram) -> PercResult<SimplifyReport> {
    simplify_with(diagram, &mut SpiderRules)
}

/// Simplifies a diagram in place with a caller-provided rewrite engine.
///
/// The number of rewrite rounds is bounded by the node count plus one,
/// since every productive round removes at least one node. Exceeding the
/// bound means the engine reported changes it did not make.
///
/// # Arguments
///
/// * `diagram` - Diagram to simplify; declared inputs and outputs survive
/// * `engine` - Rewrite rules to drive to a fixed point
///
/// # Returns
///
/// Counts of the rewrites applied, `MalformedNeighborhood` if a placeholder
/// cannot be resolved, or `NoFixedPoint` if the engine never settles.
pub fn simplify_with<E: RewriteEngine + ?Sized>(
    diagram: &mut Diagram,
    engine: &mut E,
) -> PercResult<SimplifyReport> {
    let mut report = SimplifyReport {
        excess_removed: remove_excess_nodes(diagram)?,
        ..SimplifyReport::default()
    };

    let max_passes = diagram.num_nodes() + 1;
    loop {
        report.passes += 1;
        if report.passes > max_passes {
            return Err(PercError::NoFixedPoint {
                passes: report.passes - 1,
            });
        }
        let fused = engine.fuse_spiders(diagram)?;
        let removed = engine.remove_identities(diagram)?;
        report.fusions += fused;
        report.identities += removed;
        if fused + removed == 0 {
            break;
        }
    }

    log::debug!(
        "simplified to {} nodes, {} edges ({:?})",
        diagram.num_nodes(),
        diagram.num_edges(),
        report
    );
    Ok(report)
}

fn is_placeholder(diagram: &Diagram, id: NodeId) -> bool {
    diagram.kind(id) == Some(NodeKind::Boundary) && !diagram.is_io(id)
}

/// Deletes boundary placeholders left over from construction.
///
/// Placeholders are visited in handle order. A placeholder without
/// neighbours is dropped. One with a single neighbour is dropped together
/// with that neighbour if it is also a lone placeholder, or on its own if
/// the neighbour is a spider of degree two. One with two or more
/// neighbours is replaced by plain edges between all of its neighbours.
///
/// # Returns
///
/// The number of nodes deleted, or `MalformedNeighborhood` for a single
/// neighbour of any other shape.
pub fn remove_excess_nodes(diagram: &mut Diagram) -> PercResult<usize> {
    let mut removed = 0;
    let ids: Vec<NodeId> = diagram.node_ids().collect();
    for v in ids {
        if !is_placeholder(diagram, v) {
            continue;
        }
        let neighbors: Vec<NodeId> = diagram.neighbors(v).collect();
        match neighbors[..] {
            [] => {
                diagram.remove_node(v)?;
                removed += 1;
            }
            [n] => {
                let n_degree = diagram.degree(n);
                if is_placeholder(diagram, n) && n_degree == 1 {
                    diagram.remove_node(v)?;
                    diagram.remove_node(n)?;
                    removed += 2;
                } else if diagram.kind(n).is_some_and(|k| k.is_spider()) && n_degree == 2 {
                    diagram.remove_node(v)?;
                    removed += 1;
                } else {
                    return Err(PercError::MalformedNeighborhood { node: v, neighbors });
                }
            }
            _ => {
                for (i, &a) in neighbors.iter().enumerate() {
                    for &b in &neighbors[i + 1..] {
                        diagram.add_edge(a, b, EdgeType::Simple)?;
                    }
                }
                diagram.remove_node(v)?;
                removed += 1;
            }
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_diagram;
    use crate::config::{Lattice, Probabilities};
    use crate::sampler::{GateGrid, sample_gate_grid};
    use perc_common::gates::Gate;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn built(n: usize, t_factor: f64, periodic: bool, probs: Probabilities, seed: u64) -> Diagram {
        let lattice = Lattice::new(n, t_factor, periodic).unwrap();
        let mut rng = StdRng::seed_from_u64(seed);
        let grid = sample_gate_grid(&lattice, &probs, &mut rng).unwrap().grid;
        build_diagram(&grid, &lattice, &mut rng).unwrap().0
    }

    fn assert_io_degree_one(d: &Diagram) {
        for &io in d.inputs().iter().chain(d.outputs()) {
            assert!(d.contains(io));
            assert_eq!(d.degree(io), 1, "io node {} has degree {}", io, d.degree(io));
        }
    }

    #[test]
    fn test_excess_pass_leaves_only_io_and_spiders() {
        let probs = Probabilities::new(0.4, 0.5, 0.5).unwrap();
        let mut d = built(8, 2.0, false, probs, 11);
        remove_excess_nodes(&mut d).unwrap();
        for id in d.node_ids() {
            assert!(d.is_io(id) || d.kind(id).is_some_and(|k| k.is_spider()));
        }
        assert_io_degree_one(&d);
    }

    #[test]
    fn test_pure_swaps_reduce_to_wires() {
        let probs = Probabilities::new(0.0, 0.5, 0.0).unwrap();
        let mut d = built(4, 1.0, false, probs, 2);
        simplify(&mut d).unwrap();
        assert_eq!(d.num_nodes(), 8);
        assert_eq!(d.num_edges(), 4);
        assert_io_degree_one(&d);
        for &i in d.inputs() {
            let n = d.neighbors(i).next().unwrap();
            assert!(d.outputs().contains(&n));
        }
    }

    #[test]
    fn test_double_cnot_cancels() {
        let lattice = Lattice::new(2, 1.0, true).unwrap();
        let grid = GateGrid::from_rows(vec![vec![Gate::Cnot], vec![Gate::Cnot]]).unwrap();
        // seed chosen freely: both orientations must give a valid reduction
        for seed in 0..8 {
            let mut rng = StdRng::seed_from_u64(seed);
            let (mut d, _) = build_diagram(&grid, &lattice, &mut rng).unwrap();
            simplify(&mut d).unwrap();
            assert_io_degree_one(&d);
            assert!(d.num_nodes() >= 4);
        }
    }

    #[test]
    fn test_idempotent_and_preserves_io() {
        for seed in 0..10 {
            for periodic in [false, true] {
                let probs = Probabilities::new(0.3, 0.5, 0.6).unwrap();
                let mut d = built(6, 2.0, periodic, probs, seed);
                assert_io_degree_one(&d);
                let before = d.num_nodes();
                simplify(&mut d).unwrap();
                assert!(d.num_nodes() <= before);
                assert_io_degree_one(&d);
                let (nodes, edges) = (d.num_nodes(), d.num_edges());
                let again = simplify(&mut d).unwrap();
                assert_eq!(again.fusions + again.identities + again.excess_removed, 0);
                assert_eq!((d.num_nodes(), d.num_edges()), (nodes, edges));
            }
        }
    }

    #[test]
    fn test_malformed_placeholder_fails_loudly() {
        let mut d = Diagram::new();
        let i = d.add_node(NodeKind::Boundary, 0, 0);
        let o = d.add_node(NodeKind::Boundary, 2, 0);
        let z = d.add_node(NodeKind::Z, 1, 0);
        let dangling = d.add_node(NodeKind::Boundary, 1, 1);
        d.add_edge(i, z, EdgeType::Simple).unwrap();
        d.add_edge(z, o, EdgeType::Simple).unwrap();
        let x = d.add_node(NodeKind::X, 1, 2);
        d.add_edge(z, x, EdgeType::Simple).unwrap();
        d.add_edge(dangling, z, EdgeType::Simple).unwrap();
        d.set_inputs(&[i]).unwrap();
        d.set_outputs(&[o]).unwrap();
        let err = remove_excess_nodes(&mut d).unwrap_err();
        assert!(matches!(err, PercError::MalformedNeighborhood { node, .. } if node == dangling));
    }

    struct Liar;

    impl RewriteEngine for Liar {
        fn fuse_spiders(&mut self, _: &mut Diagram) -> PercResult<usize> {
            Ok(1)
        }

        fn remove_identities(&mut self, _: &mut Diagram) -> PercResult<usize> {
            Ok(0)
        }
    }

    #[test]
    fn test_non_terminating_engine_is_reported() {
        let probs = Probabilities::new(0.0, 0.5, 0.0).unwrap();
        let mut d = built(2, 1.0, false, probs, 0);
        let err = simplify_with(&mut d, &mut Liar).unwrap_err();
        assert!(matches!(err, PercError::NoFixedPoint { .. }));
    }
}
