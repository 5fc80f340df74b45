//! Core algorithms and data structures for measurement-induced percolation.
//!
//! This crate turns a random brickwork circuit into a tensor-network diagram,
//! reduces the diagram with local spider rewrites, and measures connectivity
//! and minimum-cut statistics on what is left. Every stage is deterministic
//! given the random source handed to it, so samples can be reproduced from a
//! seed and run independently of each other.

use thiserror::Error;

/// Structural statistics computed on a simplified diagram.
///
/// Derives an undirected analysis graph from the diagram and computes the
/// component fractions and input/output reachability. The minimum-cut
/// formulations build on the same graph through the flow module.
pub mod analysis;

/// Expansion of a gate grid into a diagram.
///
/// Lays out one placeholder node per wire crossing and stamps the gadget of
/// every grid cell onto it, then stitches the open edges of the lattice.
pub mod builder;

/// Lattice and probability parameters with their validation rules.
pub mod config;

/// Disjoint set union used for connected-component sizing.
///
/// Tracks component sizes at the set roots so the largest components can be
/// read off after all edges have been merged.
pub mod dsu;

/// Unit-capacity maximum flow and the minimum-cut formulations.
///
/// Builds a flow network from the analysis graph with a synthetic source
/// and sink attached to the selected node sets.
pub mod flow;

/// Arena-backed diagram graph with typed nodes and edges.
///
/// Nodes are addressed by stable handles that stay valid while other nodes
/// are removed, which keeps iterative rewriting free of index shifting.
pub mod graph;

/// Sample result records and the metric set computed for each sample.
pub mod metrics;

/// One full sample: grid, diagram, simplification, metrics.
pub mod pipeline;

/// Local rewrite rules used by the simplifier.
///
/// Provides spider fusion and identity removal behind the rewrite engine
/// trait, together with the edge-merging rules they rely on.
pub mod rules;

/// Random brickwork circuit sampling.
pub mod sampler;

/// Fixed-point simplification of a freshly built diagram.
///
/// Removes placeholder nodes left over from construction and then drives
/// the rewrite engine until no rule applies.
pub mod simplify;

/// Node handle inside a [`graph::Diagram`].
pub type NodeId = usize;

/// Error types returned by diagram generation and analysis.
///
/// Configuration problems are reported before any sampling happens. The
/// structural variants indicate that the builder and the simplifier
/// disagree about the shape of a diagram and carry enough context to find
/// the offending node.
#[derive(Debug, Error)]
pub enum PercError {
    /// A lattice or sweep parameter is outside its valid range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// No explicit gate grid was given and the (p, q, r) triple is incomplete.
    #[error("if no gate grid is given, all of (p, q, r) must be given")]
    MissingParameters,

    /// A probability is not a finite number in [0, 1].
    #[error("probability {name} = {value} is outside [0, 1]")]
    ProbabilityOutOfRange { name: &'static str, value: f64 },

    /// An explicit gate grid does not match the lattice it is built on.
    #[error("gate grid has shape {rows}x{cols}, expected {expected_rows}x{expected_cols}")]
    GridShape {
        expected_rows: usize,
        expected_cols: usize,
        rows: usize,
        cols: usize,
    },

    /// A node handle does not refer to a live node.
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),

    /// An operation tried to delete a declared input or output.
    #[error("node {0} is a declared input or output")]
    ProtectedNode(NodeId),

    /// A placeholder node has a neighbourhood the excess-node pass cannot
    /// resolve.
    #[error("node {node} has unexpected neighbours {neighbors:?}")]
    MalformedNeighborhood { node: NodeId, neighbors: Vec<NodeId> },

    /// The rewrite engine kept reporting changes past the pass bound.
    #[error("simplification did not reach a fixed point after {passes} passes")]
    NoFixedPoint { passes: usize },
}

pub type PercResult<T> = Result<T, PercError>;
