//! Diagram representation for sampled circuits.
//!
//! Implements the typed graph that a sampled circuit is expanded into.
//! Nodes are wire crossings, spiders or the declared boundary of the
//! circuit; edges are plain or Hadamard wires. Node handles are indices into
//! an arena and stay valid for the lifetime of the diagram: removing a node
//! marks its slot dead instead of shifting later handles.

use crate::{NodeId, PercError, PercResult};
use std::collections::BTreeMap;

/// Colour of a diagram node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Wire endpoint or construction placeholder.
    ///
    /// Declared inputs and outputs keep this kind for their whole life.
    /// Every other boundary node is a leftover of construction and is
    /// removed by the excess-node pass.
    Boundary,

    /// Z spider.
    Z,

    /// X spider.
    X,
}

impl NodeKind {
    /// True for Z and X spiders.
    pub fn is_spider(self) -> bool {
        matches!(self, NodeKind::Z | NodeKind::X)
    }
}

/// Wire type between two nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EdgeType {
    Simple,
    Hadamard,
}

impl EdgeType {
    /// Type of the single wire left when two wires are joined end to end.
    ///
    /// Two Hadamards cancel, so the composite is Hadamard exactly when one
    /// of the two parts is.
    pub fn compose(self, other: EdgeType) -> EdgeType {
        if self == other {
            EdgeType::Simple
        } else {
            EdgeType::Hadamard
        }
    }
}

/// Role of a node in the diagram's interface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IoRole {
    Internal,
    Input,
    Output,
}

/// A single diagram node.
///
/// The row and qubit coordinates locate the node in the construction grid.
/// They are used for wiring and reporting only; rewrites do not keep them
/// meaningful.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub role: IoRole,
    pub row: usize,
    pub qubit: usize,
}

/// Node and edge counts of a diagram, broken down by node colour.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DiagramStats {
    pub nodes: usize,
    pub edges: usize,
    pub boundary: usize,
    pub z: usize,
    pub x: usize,
}

/// Tensor-network diagram of one sampled circuit.
///
/// Stores nodes in an arena with a liveness flag per slot, and edges as a
/// sorted adjacency map per node so that iteration order is deterministic.
/// At most one edge exists between any pair of nodes; adding an edge that
/// already exists leaves the existing one in place.
#[derive(Clone, Debug, Default)]
pub struct Diagram {
    /// Node payloads, indexed by handle. Dead slots keep their last payload.
    nodes: Vec<Node>,

    /// Liveness flag for every slot in `nodes`.
    alive: Vec<bool>,

    /// Neighbour map for every slot. Empty for dead slots.
    adjacency: Vec<BTreeMap<NodeId, EdgeType>>,

    /// Declared inputs in wire order.
    inputs: Vec<NodeId>,

    /// Declared outputs in wire order.
    outputs: Vec<NodeId>,

    live_nodes: usize,
    live_edges: usize,
}

impl Diagram {
    /// Creates an empty diagram.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty diagram with room for `capacity` nodes.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Expected number of nodes, used for pre-allocation
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            alive: Vec::with_capacity(capacity),
            adjacency: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Adds an internal node and returns its handle.
    ///
    /// # Arguments
    ///
    /// * `kind` - Node colour
    /// * `row` - Construction row
    /// * `qubit` - Construction column (wire index)
    pub fn add_node(&mut self, kind: NodeKind, row: usize, qubit: usize) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            kind,
            role: IoRole::Internal,
            row,
            qubit,
        });
        self.alive.push(true);
        self.adjacency.push(BTreeMap::new());
        self.live_nodes += 1;
        id
    }

    /// Declares the given nodes as the diagram's inputs, in order.
    ///
    /// Previously declared inputs become internal. Fails if any handle is
    /// dead or already declared as an output.
    pub fn set_inputs(&mut self, ids: &[NodeId]) -> PercResult<()> {
        self.set_role(ids, IoRole::Input)?;
        self.inputs = ids.to_vec();
        Ok(())
    }

    /// Declares the given nodes as the diagram's outputs, in order.
    pub fn set_outputs(&mut self, ids: &[NodeId]) -> PercResult<()> {
        self.set_role(ids, IoRole::Output)?;
        self.outputs = ids.to_vec();
        Ok(())
    }

    fn set_role(&mut self, ids: &[NodeId], role: IoRole) -> PercResult<()> {
        for &id in ids {
            let node = self.live(id)?;
            if node.role != IoRole::Internal && node.role != role {
                return Err(PercError::ProtectedNode(id));
            }
        }
        let previous = match role {
            IoRole::Input => std::mem::take(&mut self.inputs),
            _ => std::mem::take(&mut self.outputs),
        };
        for id in previous {
            if self.contains(id) {
                self.nodes[id].role = IoRole::Internal;
            }
        }
        for &id in ids {
            self.nodes[id].role = role;
        }
        Ok(())
    }

    /// Removes the input declaration and returns the former inputs.
    ///
    /// The nodes themselves stay in the diagram as internal nodes of their
    /// current kind.
    pub fn take_inputs(&mut self) -> Vec<NodeId> {
        let inputs = std::mem::take(&mut self.inputs);
        for &id in &inputs {
            if self.contains(id) {
                self.nodes[id].role = IoRole::Internal;
            }
        }
        inputs
    }

    pub fn inputs(&self) -> &[NodeId] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[NodeId] {
        &self.outputs
    }

    /// True if `id` refers to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.alive.get(id).copied().unwrap_or(false)
    }

    fn live(&self, id: NodeId) -> PercResult<&Node> {
        if self.contains(id) {
            Ok(&self.nodes[id])
        } else {
            Err(PercError::UnknownNode(id))
        }
    }

    /// Returns the node behind a live handle.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.live(id).ok()
    }

    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.node(id).map(|n| n.kind)
    }

    /// True if the node is a declared input or output.
    pub fn is_io(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|n| n.role != IoRole::Internal)
    }

    /// Recolours a live node.
    ///
    /// Declared inputs and outputs cannot be recoloured; take them out of
    /// the interface first.
    pub fn set_kind(&mut self, id: NodeId, kind: NodeKind) -> PercResult<()> {
        if self.live(id)?.role != IoRole::Internal {
            return Err(PercError::ProtectedNode(id));
        }
        self.nodes[id].kind = kind;
        Ok(())
    }

    /// Number of live neighbours of a node, zero for dead handles.
    pub fn degree(&self, id: NodeId) -> usize {
        self.adjacency.get(id).map_or(0, |adj| adj.len())
    }

    /// Neighbours of a node in ascending handle order.
    pub fn neighbors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.adjacency
            .get(id)
            .into_iter()
            .flat_map(|adj| adj.keys().copied())
    }

    /// Neighbours of a node together with the type of the joining edge.
    pub fn incident(&self, id: NodeId) -> impl Iterator<Item = (NodeId, EdgeType)> + '_ {
        self.adjacency
            .get(id)
            .into_iter()
            .flat_map(|adj| adj.iter().map(|(&n, &ty)| (n, ty)))
    }

    pub fn edge_type(&self, u: NodeId, v: NodeId) -> Option<EdgeType> {
        self.adjacency.get(u).and_then(|adj| adj.get(&v)).copied()
    }

    pub fn connected(&self, u: NodeId, v: NodeId) -> bool {
        self.edge_type(u, v).is_some()
    }

    /// Adds an edge between two live nodes.
    ///
    /// Parallel edges are merged: if the pair is already connected the
    /// existing edge is kept unchanged. Self-loops are not stored.
    ///
    /// # Returns
    ///
    /// Ok(true) if a new edge was stored, Ok(false) if it was merged or was
    /// a self-loop, or an error if either handle is dead.
    pub fn add_edge(&mut self, u: NodeId, v: NodeId, ty: EdgeType) -> PercResult<bool> {
        self.live(u)?;
        self.live(v)?;
        if u == v || self.connected(u, v) {
            return Ok(false);
        }
        self.adjacency[u].insert(v, ty);
        self.adjacency[v].insert(u, ty);
        self.live_edges += 1;
        Ok(true)
    }

    /// Removes the edge between two nodes, returning its type if it existed.
    pub fn remove_edge(&mut self, u: NodeId, v: NodeId) -> Option<EdgeType> {
        let ty = self.adjacency.get_mut(u)?.remove(&v)?;
        self.adjacency[v].remove(&u);
        self.live_edges -= 1;
        Some(ty)
    }

    /// Removes a node and all edges incident to it.
    ///
    /// Declared inputs and outputs are protected and cannot be removed.
    pub fn remove_node(&mut self, id: NodeId) -> PercResult<()> {
        if self.live(id)?.role != IoRole::Internal {
            return Err(PercError::ProtectedNode(id));
        }
        let adj = std::mem::take(&mut self.adjacency[id]);
        for n in adj.keys() {
            self.adjacency[*n].remove(&id);
        }
        self.live_edges -= adj.len();
        self.alive[id] = false;
        self.live_nodes -= 1;
        Ok(())
    }

    /// Live node handles in ascending order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.alive
            .iter()
            .enumerate()
            .filter_map(|(id, &alive)| alive.then_some(id))
    }

    /// Every edge once, as `(u, v, type)` with `u < v`.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId, EdgeType)> + '_ {
        self.node_ids().flat_map(move |u| {
            self.incident(u)
                .filter(move |&(v, _)| u < v)
                .map(move |(v, ty)| (u, v, ty))
        })
    }

    pub fn num_nodes(&self) -> usize {
        self.live_nodes
    }

    pub fn num_edges(&self) -> usize {
        self.live_edges
    }

    /// Counts live nodes by colour together with the edge count.
    pub fn stats(&self) -> DiagramStats {
        let mut stats = DiagramStats {
            nodes: self.live_nodes,
            edges: self.live_edges,
            ..DiagramStats::default()
        };
        for id in self.node_ids() {
            match self.nodes[id].kind {
                NodeKind::Boundary => stats.boundary += 1,
                NodeKind::Z => stats.z += 1,
                NodeKind::X => stats.x += 1,
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> (Diagram, [NodeId; 3]) {
        let mut d = Diagram::new();
        let a = d.add_node(NodeKind::Boundary, 0, 0);
        let b = d.add_node(NodeKind::Z, 1, 0);
        let c = d.add_node(NodeKind::Boundary, 2, 0);
        d.add_edge(a, b, EdgeType::Simple).unwrap();
        d.add_edge(b, c, EdgeType::Simple).unwrap();
        d.set_inputs(&[a]).unwrap();
        d.set_outputs(&[c]).unwrap();
        (d, [a, b, c])
    }

    #[test]
    fn test_parallel_edges_merge() {
        let (mut d, [a, b, _]) = chain();
        assert!(!d.add_edge(b, a, EdgeType::Hadamard).unwrap());
        assert_eq!(d.edge_type(a, b), Some(EdgeType::Simple));
        assert_eq!(d.num_edges(), 2);
        assert!(!d.add_edge(b, b, EdgeType::Simple).unwrap());
        assert_eq!(d.degree(b), 2);
    }

    #[test]
    fn test_remove_node_keeps_handles_stable() {
        let (mut d, [a, b, c]) = chain();
        d.remove_node(b).unwrap();
        assert!(!d.contains(b));
        assert_eq!(d.num_nodes(), 2);
        assert_eq!(d.num_edges(), 0);
        assert_eq!(d.kind(c), Some(NodeKind::Boundary));
        let e = d.add_node(NodeKind::X, 1, 0);
        assert_eq!(e, 3);
        d.add_edge(a, e, EdgeType::Simple).unwrap();
        assert_eq!(d.node_ids().collect::<Vec<_>>(), vec![a, c, e]);
    }

    #[test]
    fn test_io_nodes_protected() {
        let (mut d, [a, _, c]) = chain();
        assert!(matches!(d.remove_node(a), Err(PercError::ProtectedNode(_))));
        assert!(matches!(d.set_kind(c, NodeKind::X), Err(PercError::ProtectedNode(_))));
        assert!(matches!(d.set_outputs(&[a]), Err(PercError::ProtectedNode(_))));
    }

    #[test]
    fn test_take_inputs_releases_nodes() {
        let (mut d, [a, _, _]) = chain();
        assert_eq!(d.take_inputs(), vec![a]);
        assert!(!d.is_io(a));
        d.set_kind(a, NodeKind::X).unwrap();
        assert_eq!(d.stats().x, 1);
    }

    #[test]
    fn test_edges_listed_once() {
        let (d, [a, b, c]) = chain();
        let edges: Vec<_> = d.edges().collect();
        assert_eq!(edges, vec![(a, b, EdgeType::Simple), (b, c, EdgeType::Simple)]);
    }

    #[test]
    fn test_compose_edge_types() {
        assert_eq!(EdgeType::Simple.compose(EdgeType::Simple), EdgeType::Simple);
        assert_eq!(EdgeType::Hadamard.compose(EdgeType::Hadamard), EdgeType::Simple);
        assert_eq!(EdgeType::Simple.compose(EdgeType::Hadamard), EdgeType::Hadamard);
    }
}
