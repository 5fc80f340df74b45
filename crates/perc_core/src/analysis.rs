//! Connectivity analysis on simplified diagrams.
//!
//! The analysis graph is an undirected, unweighted projection of a diagram
//! with dense indices and a coarse class per node. It is derived fresh
//! after every simplification and never edited afterwards.

use crate::NodeId;
use crate::dsu::UnionFind;
use crate::graph::{Diagram, IoRole, NodeKind};
use std::collections::VecDeque;

/// Coarse node class kept by the analysis graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeClass {
    Input,
    Output,
    Z,
    X,
    Boundary,
}

/// Undirected projection of a diagram.
#[derive(Clone, Debug, Default)]
pub struct AnalysisGraph {
    /// Class of every node, by dense index.
    classes: Vec<NodeClass>,

    /// Neighbour lists by dense index.
    adjacency: Vec<Vec<usize>>,

    /// Every edge once, as dense index pairs.
    edges: Vec<(usize, usize)>,
}

impl AnalysisGraph {
    /// Derives the analysis graph of a diagram.
    ///
    /// Nodes are numbered in ascending handle order, so inputs and outputs
    /// keep the wire order they were declared in. Edge types are dropped.
    pub fn from_diagram(diagram: &Diagram) -> Self {
        let handles: Vec<NodeId> = diagram.node_ids().collect();
        let mut dense = vec![usize::MAX; handles.last().map_or(0, |&h| h + 1)];
        for (i, &h) in handles.iter().enumerate() {
            dense[h] = i;
        }

        let classes = handles
            .iter()
            .filter_map(|&h| diagram.node(h))
            .map(|node| match (node.role, node.kind) {
                (IoRole::Input, _) => NodeClass::Input,
                (IoRole::Output, _) => NodeClass::Output,
                (IoRole::Internal, NodeKind::Z) => NodeClass::Z,
                (IoRole::Internal, NodeKind::X) => NodeClass::X,
                (IoRole::Internal, _) => NodeClass::Boundary,
            })
            .collect();

        let mut adjacency = vec![Vec::new(); handles.len()];
        let mut edges = Vec::with_capacity(diagram.num_edges());
        for (u, v, _) in diagram.edges() {
            let (a, b) = (dense[u], dense[v]);
            adjacency[a].push(b);
            adjacency[b].push(a);
            edges.push((a, b));
        }

        Self {
            classes,
            adjacency,
            edges,
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.classes.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn class(&self, i: usize) -> NodeClass {
        self.classes[i]
    }

    pub fn neighbors(&self, i: usize) -> &[usize] {
        &self.adjacency[i]
    }

    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    /// Dense indices of all nodes of a class, in ascending order.
    pub fn nodes_of(&self, class: NodeClass) -> Vec<usize> {
        (0..self.num_nodes())
            .filter(|&i| self.classes[i] == class)
            .collect()
    }
}

/// Largest and second-largest component fractions.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Percolation {
    pub lc: f64,
    pub slc: f64,
}

/// Computes component fractions of an analysis graph.
///
/// Fractions are taken relative to `total_nodes`, the node count of the
/// simplified diagram the graph was derived from. `slc` is zero when the
/// graph has a single component, and both are zero for an empty graph.
///
/// # Arguments
///
/// * `graph` - Analysis graph
/// * `total_nodes` - Denominator for both fractions
pub fn percolation(graph: &AnalysisGraph, total_nodes: usize) -> Percolation {
    if graph.num_nodes() == 0 || total_nodes == 0 {
        return Percolation::default();
    }
    let mut dsu = UnionFind::new(graph.num_nodes());
    for &(a, b) in graph.edges() {
        dsu.union(a, b);
    }
    let sizes = dsu.component_sizes();
    let total = total_nodes as f64;
    Percolation {
        lc: sizes.first().map_or(0.0, |&s| s as f64 / total),
        slc: sizes.get(1).map_or(0.0, |&s| s as f64 / total),
    }
}

/// True if some input is connected to some output.
///
/// Searches breadth-first from each input in turn and stops at the first
/// output found. Nodes visited from one input are not revisited from the
/// next: they lie in a component already known to hold no output.
pub fn path_exists(graph: &AnalysisGraph) -> bool {
    let mut visited = vec![false; graph.num_nodes()];
    let mut queue = VecDeque::new();
    for source in graph.nodes_of(NodeClass::Input) {
        if visited[source] {
            continue;
        }
        visited[source] = true;
        queue.push_back(source);
        while let Some(u) = queue.pop_front() {
            if graph.class(u) == NodeClass::Output {
                return true;
            }
            for &v in graph.neighbors(u) {
                if !visited[v] {
                    visited[v] = true;
                    queue.push_back(v);
                }
            }
        }
    }
    false
}
