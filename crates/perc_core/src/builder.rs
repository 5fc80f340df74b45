//! Diagram construction from a gate grid.
//!
//! The builder allocates a `(2T + 1) x n` array of boundary placeholder
//! nodes, one per wire crossing, and declares the first row as inputs and
//! the last row as outputs. Sub-layer `t` of the grid acts on rows `2t`,
//! `2t + 1` and `2t + 2`: each cell wires its two columns through a gadget
//! and may delete or recolour the middle-row nodes. Placeholders that are
//! still around afterwards are cleaned up by the simplifier.

use crate::config::Lattice;
use crate::graph::{Diagram, EdgeType, NodeKind};
use crate::sampler::GateGrid;
use crate::{NodeId, PercResult};
use perc_common::gates::Gate;
use rand::Rng;

/// Node handles of the construction array, indexed by row and wire.
#[derive(Clone, Debug)]
pub struct NodeGrid {
    rows: usize,
    cols: usize,
    ids: Vec<NodeId>,
}

impl NodeGrid {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Handle of the node at `row`, wire `qubit`.
    pub fn get(&self, row: usize, qubit: usize) -> NodeId {
        self.ids[row * self.cols + qubit]
    }

    pub fn row(&self, row: usize) -> &[NodeId] {
        &self.ids[row * self.cols..(row + 1) * self.cols]
    }
}

/// Expands a gate grid into a diagram.
///
/// # Arguments
///
/// * `grid` - Gate labels; must match the lattice shape
/// * `lattice` - Wire count and boundary topology
/// * `rng` - Random source for the orientation of CNOT gadgets
///
/// # Returns
///
/// The diagram and the handle array it was built on, or `GridShape` if the
/// grid does not fit the lattice.
pub fn build_diagram<R: Rng + ?Sized>(
    grid: &GateGrid,
    lattice: &Lattice,
    rng: &mut R,
) -> PercResult<(Diagram, NodeGrid)> {
    lattice.validate()?;
    grid.check_shape(lattice)?;

    let n = lattice.n;
    let layers = grid.rows();
    let rows = 2 * layers + 1;

    let mut diagram = Diagram::with_capacity(rows * n);
    let mut ids = Vec::with_capacity(rows * n);
    for row in 0..rows {
        for qubit in 0..n {
            ids.push(diagram.add_node(NodeKind::Boundary, row, qubit));
        }
    }
    let nodes = NodeGrid { rows, cols: n, ids };
    diagram.set_inputs(nodes.row(0))?;
    diagram.set_outputs(nodes.row(rows - 1))?;

    for t in 0..layers {
        let offset = t % 2;
        for (c, &gate) in grid.row(t).iter().enumerate() {
            let q1 = 2 * c + offset;
            let q2 = if q1 + 1 < n {
                q1 + 1
            } else if lattice.periodic {
                0
            } else {
                continue;
            };
            let cell = Cell { t, q1, q2 };
            match gate {
                Gate::Swap => swap(&mut diagram, &nodes, cell)?,
                Gate::Cnot => cnot(&mut diagram, &nodes, cell, rng.gen_bool(0.5))?,
                Gate::IdProjection => id_projection(&mut diagram, &nodes, cell)?,
                Gate::BellProjection => bell_projection(&mut diagram, &nodes, cell)?,
                Gate::Empty => {}
            }
        }

        if offset == 1 && !lattice.periodic {
            stitch_open_edges(&mut diagram, &nodes, t)?;
        }
    }

    Ok((diagram, nodes))
}

/// Position of one gadget: sub-layer and the two wires it acts on.
#[derive(Clone, Copy)]
struct Cell {
    t: usize,
    q1: usize,
    q2: usize,
}

impl Cell {
    fn below(&self) -> usize {
        2 * self.t
    }

    fn middle(&self) -> usize {
        2 * self.t + 1
    }

    fn above(&self) -> usize {
        2 * self.t + 2
    }
}

fn wire(d: &mut Diagram, a: NodeId, b: NodeId) -> PercResult<()> {
    d.add_edge(a, b, EdgeType::Simple).map(|_| ())
}

fn swap(d: &mut Diagram, nodes: &NodeGrid, cell: Cell) -> PercResult<()> {
    let Cell { q1, q2, .. } = cell;
    d.remove_node(nodes.get(cell.middle(), q1))?;
    d.remove_node(nodes.get(cell.middle(), q2))?;
    wire(d, nodes.get(cell.below(), q1), nodes.get(cell.above(), q2))?;
    wire(d, nodes.get(cell.below(), q2), nodes.get(cell.above(), q1))
}

fn cnot(d: &mut Diagram, nodes: &NodeGrid, cell: Cell, flip: bool) -> PercResult<()> {
    let (control, target) = if flip {
        (cell.q2, cell.q1)
    } else {
        (cell.q1, cell.q2)
    };
    let c = nodes.get(cell.middle(), control);
    let x = nodes.get(cell.middle(), target);
    d.set_kind(c, NodeKind::Z)?;
    d.set_kind(x, NodeKind::X)?;
    for q in [control, target] {
        let mid = nodes.get(cell.middle(), q);
        wire(d, nodes.get(cell.below(), q), mid)?;
        wire(d, mid, nodes.get(cell.above(), q))?;
    }
    wire(d, c, x)
}

fn id_projection(d: &mut Diagram, nodes: &NodeGrid, cell: Cell) -> PercResult<()> {
    for q in [cell.q1, cell.q2] {
        d.remove_node(nodes.get(cell.middle(), q))?;
        wire(d, nodes.get(cell.below(), q), nodes.get(cell.above(), q))?;
    }
    Ok(())
}

fn bell_projection(d: &mut Diagram, nodes: &NodeGrid, cell: Cell) -> PercResult<()> {
    let Cell { q1, q2, .. } = cell;
    wire(d, nodes.get(cell.below(), q1), nodes.get(cell.below(), q2))?;
    wire(d, nodes.get(cell.middle(), q1), nodes.get(cell.middle(), q2))?;
    wire(d, nodes.get(cell.middle(), q1), nodes.get(cell.above(), q1))?;
    wire(d, nodes.get(cell.middle(), q2), nodes.get(cell.above(), q2))
}

/// Carries the two edge wires of an odd sub-layer straight through.
///
/// On an open lattice the first and last wire have no partner in odd
/// sub-layers, so their middle-row nodes are dropped and the rows around
/// them joined directly.
fn stitch_open_edges(d: &mut Diagram, nodes: &NodeGrid, t: usize) -> PercResult<()> {
    let last = nodes.cols() - 1;
    for q in [0, last] {
        d.remove_node(nodes.get(2 * t + 1, q))?;
        wire(d, nodes.get(2 * t, q), nodes.get(2 * t + 2, q))?;
    }
    Ok(())
}
