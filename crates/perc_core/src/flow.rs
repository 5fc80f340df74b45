//! Maximum flow on unit-capacity graphs.
//!
//! Every analysis-graph edge carries capacity one in both directions. A
//! synthetic super-source feeds the selected source nodes and the selected
//! sink nodes drain into a synthetic super-sink, both through edges of
//! unbounded capacity. The resulting cut value is an integer no larger
//! than the smaller of the two terminal sets.

use crate::analysis::{AnalysisGraph, NodeClass};
use std::collections::VecDeque;

/// Capacity used for the synthetic terminal edges.
pub const UNBOUNDED: u64 = u64::MAX / 4;

/// Residual flow network stored as paired arcs.
///
/// Arc `2k` and arc `2k + 1` are each other's reverse, so the reverse of
/// arc `a` is always `a ^ 1`.
#[derive(Clone, Debug, Default)]
pub struct FlowNetwork {
    /// Outgoing arc ids per node.
    adjacency: Vec<Vec<usize>>,
    /// Head node of every arc.
    to: Vec<usize>,
    /// Residual capacity of every arc.
    capacity: Vec<u64>,
}

impl FlowNetwork {
    pub fn new(nodes: usize) -> Self {
        Self {
            adjacency: vec![Vec::new(); nodes],
            ..Self::default()
        }
    }

    pub fn add_node(&mut self) -> usize {
        self.adjacency.push(Vec::new());
        self.adjacency.len() - 1
    }

    pub fn num_nodes(&self) -> usize {
        self.adjacency.len()
    }

    fn push_pair(&mut self, u: usize, v: usize, forward: u64, backward: u64) {
        let id = self.to.len();
        self.to.push(v);
        self.capacity.push(forward);
        self.adjacency[u].push(id);
        self.to.push(u);
        self.capacity.push(backward);
        self.adjacency[v].push(id + 1);
    }

    /// Adds a directed arc `u -> v`.
    pub fn add_arc(&mut self, u: usize, v: usize, capacity: u64) {
        self.push_pair(u, v, capacity, 0);
    }

    /// Adds an undirected edge with the same capacity in both directions.
    pub fn add_edge(&mut self, u: usize, v: usize, capacity: u64) {
        self.push_pair(u, v, capacity, capacity);
    }

    /// Computes the maximum flow from `source` to `sink`.
    ///
    /// Augments along shortest residual paths (Edmonds-Karp). With unit
    /// edge capacities each augmentation carries at least one unit, so the
    /// number of rounds is bounded by the value of the cut.
    ///
    /// # Returns
    ///
    /// The flow value. The network's residual capacities are consumed.
    pub fn max_flow(&mut self, source: usize, sink: usize) -> u64 {
        if source == sink {
            return 0;
        }
        let n = self.num_nodes();
        let mut total = 0u64;
        let mut parent_arc = vec![usize::MAX; n];
        let mut queue = VecDeque::new();

        loop {
            parent_arc.fill(usize::MAX);
            queue.clear();
            queue.push_back(source);
            let mut reached = false;

            'search: while let Some(u) = queue.pop_front() {
                for &arc in &self.adjacency[u] {
                    let v = self.to[arc];
                    if self.capacity[arc] == 0 || v == source || parent_arc[v] != usize::MAX {
                        continue;
                    }
                    parent_arc[v] = arc;
                    if v == sink {
                        reached = true;
                        break 'search;
                    }
                    queue.push_back(v);
                }
            }

            if !reached {
                return total;
            }

            let mut bottleneck = UNBOUNDED;
            let mut v = sink;
            while v != source {
                let arc = parent_arc[v];
                bottleneck = bottleneck.min(self.capacity[arc]);
                v = self.to[arc ^ 1];
            }

            let mut v = sink;
            while v != source {
                let arc = parent_arc[v];
                self.capacity[arc] -= bottleneck;
                self.capacity[arc ^ 1] += bottleneck;
                v = self.to[arc ^ 1];
            }
            total = total.saturating_add(bottleneck);
        }
    }
}

/// How the two terminal sets of a cut are chosen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Terminals {
    /// All inputs against all outputs.
    InputsToOutputs,
    /// First half of the outputs against the second half.
    OutputHalves,
}

impl Terminals {
    /// Selects source and sink nodes of an analysis graph.
    pub fn select(self, graph: &AnalysisGraph) -> (Vec<usize>, Vec<usize>) {
        match self {
            Terminals::InputsToOutputs => (
                graph.nodes_of(NodeClass::Input),
                graph.nodes_of(NodeClass::Output),
            ),
            Terminals::OutputHalves => {
                let mut outputs = graph.nodes_of(NodeClass::Output);
                let second = outputs.split_off(outputs.len() / 2);
                (outputs, second)
            }
        }
    }
}

/// Minimum cut between two disjoint node sets of an analysis graph.
///
/// # Arguments
///
/// * `graph` - Analysis graph; every edge has capacity one
/// * `sources` - Nodes attached to the super-source
/// * `sinks` - Nodes attached to the super-sink
///
/// # Returns
///
/// The cut value, or 0 if either set is empty.
pub fn min_cut(graph: &AnalysisGraph, sources: &[usize], sinks: &[usize]) -> u64 {
    if sources.is_empty() || sinks.is_empty() {
        return 0;
    }
    let mut network = FlowNetwork::new(graph.num_nodes());
    for &(a, b) in graph.edges() {
        network.add_edge(a, b, 1);
    }
    let super_source = network.add_node();
    let super_sink = network.add_node();
    for &s in sources {
        network.add_arc(super_source, s, UNBOUNDED);
    }
    for &t in sinks {
        network.add_arc(t, super_sink, UNBOUNDED);
    }
    network.max_flow(super_source, super_sink)
}
