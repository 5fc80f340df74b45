//! Spider fusion and identity removal.
//!
//! Both rules shrink the diagram by one node per application, so any
//! sequence of passes terminates after at most as many rewrites as the
//! diagram has spiders.

use crate::graph::{Diagram, EdgeType, NodeKind};
use crate::{NodeId, PercResult};

/// Local rewrite rules driven to a fixed point by the simplifier.
///
/// Each method applies its rule at every location that matches while the
/// pass walks the diagram and returns how many rewrites it made.
/// Implementations must never touch declared inputs or outputs.
pub trait RewriteEngine {
    /// Fuses adjacent spiders of the same colour joined by a plain edge.
    fn fuse_spiders(&mut self, diagram: &mut Diagram) -> PercResult<usize>;

    /// Removes spiders with exactly two neighbours, joining the neighbours.
    fn remove_identities(&mut self, diagram: &mut Diagram) -> PercResult<usize>;
}

/// Phase-free spider rules.
///
/// No phases are tracked, so every degree-two spider is an identity.
#[derive(Clone, Copy, Debug, Default)]
pub struct SpiderRules;

impl RewriteEngine for SpiderRules {
    fn fuse_spiders(&mut self, diagram: &mut Diagram) -> PercResult<usize> {
        let mut fused = 0;
        let ids: Vec<NodeId> = diagram.node_ids().collect();
        for u in ids {
            let Some(colour) = diagram.kind(u).filter(|k| k.is_spider()) else {
                continue;
            };
            while let Some(v) = fusable_neighbor(diagram, u, colour) {
                fuse_into(diagram, u, v)?;
                fused += 1;
            }
        }
        Ok(fused)
    }

    fn remove_identities(&mut self, diagram: &mut Diagram) -> PercResult<usize> {
        let mut removed = 0;
        let ids: Vec<NodeId> = diagram.node_ids().collect();
        for v in ids {
            if !diagram.kind(v).is_some_and(|k| k.is_spider()) || diagram.degree(v) != 2 {
                continue;
            }
            let ends: Vec<(NodeId, EdgeType)> = diagram.incident(v).collect();
            let [(a, ta), (b, tb)] = ends[..] else {
                continue;
            };
            diagram.remove_node(v)?;
            add_edge_smart(diagram, a, b, ta.compose(tb))?;
            removed += 1;
        }
        Ok(removed)
    }
}

fn fusable_neighbor(diagram: &Diagram, u: NodeId, colour: NodeKind) -> Option<NodeId> {
    diagram
        .incident(u)
        .find(|&(v, ty)| ty == EdgeType::Simple && diagram.kind(v) == Some(colour))
        .map(|(v, _)| v)
}

/// Merges spider `absorb` into its neighbour `keep`.
///
/// The connecting edge disappears and every other edge of `absorb` is
/// re-attached to `keep` through [`add_edge_smart`].
fn fuse_into(diagram: &mut Diagram, keep: NodeId, absorb: NodeId) -> PercResult<()> {
    let moved: Vec<(NodeId, EdgeType)> = diagram
        .incident(absorb)
        .filter(|&(n, _)| n != keep)
        .collect();
    diagram.remove_node(absorb)?;
    for (n, ty) in moved {
        add_edge_smart(diagram, keep, n, ty)?;
    }
    Ok(())
}

/// Adds an edge, resolving a parallel edge the way the calculus does.
///
/// Two plain edges between spiders of different colours cancel (Hopf
/// rule), as do two Hadamard edges between spiders of the same colour. Any
/// other parallel pair collapses onto the existing edge. Self-loops are
/// dropped.
pub fn add_edge_smart(
    diagram: &mut Diagram,
    u: NodeId,
    v: NodeId,
    ty: EdgeType,
) -> PercResult<()> {
    if u == v {
        return Ok(());
    }
    let Some(existing) = diagram.edge_type(u, v) else {
        diagram.add_edge(u, v, ty)?;
        return Ok(());
    };
    let (Some(ku), Some(kv)) = (diagram.kind(u), diagram.kind(v)) else {
        return Ok(());
    };
    if ku.is_spider() && kv.is_spider() {
        let cancels = if ku == kv {
            existing == EdgeType::Hadamard && ty == EdgeType::Hadamard
        } else {
            existing == EdgeType::Simple && ty == EdgeType::Simple
        };
        if cancels {
            diagram.remove_edge(u, v);
        }
    }
    Ok(())
}
