//! Random brickwork circuit sampling.
//!
//! A circuit is a grid of gate labels with one row per sub-layer and one
//! column per wire pair. Even rows pair wires (0,1), (2,3), ...; odd rows
//! pair (1,2), (3,4), ... and finally (n-1, 0), which only exists on a
//! periodic lattice.

use crate::config::{Lattice, LayerCount, Probabilities};
use crate::{PercError, PercResult};
use perc_common::gates::Gate;
use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};

/// Immutable grid of gate labels, `rows x cols` in row-major order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GateGrid {
    rows: usize,
    cols: usize,
    cells: Vec<Gate>,
}

impl GateGrid {
    /// Builds a grid from a list of equally long rows.
    ///
    /// # Returns
    ///
    /// The grid, or `InvalidConfig` if the rows are ragged.
    pub fn from_rows(rows: Vec<Vec<Gate>>) -> PercResult<Self> {
        let cols = rows.first().map_or(0, |r| r.len());
        if let Some((t, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != cols) {
            return Err(PercError::InvalidConfig(format!(
                "grid row {} has {} cells, expected {}",
                t,
                row.len(),
                cols
            )));
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            cells: rows.into_iter().flatten().collect(),
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Gate at sub-layer `t`, pair `c`.
    pub fn get(&self, t: usize, c: usize) -> Gate {
        self.cells[t * self.cols + c]
    }

    /// All cells of sub-layer `t`.
    pub fn row(&self, t: usize) -> &[Gate] {
        &self.cells[t * self.cols..(t + 1) * self.cols]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[Gate]> {
        self.cells.chunks(self.cols.max(1)).take(self.rows)
    }

    /// Number of cells holding `gate`.
    pub fn count(&self, gate: Gate) -> usize {
        self.cells.iter().filter(|&&g| g == gate).count()
    }

    /// Checks that the grid fits a lattice.
    pub fn check_shape(&self, lattice: &Lattice) -> PercResult<()> {
        let expected_rows = lattice.layers().layers;
        let expected_cols = lattice.half_width();
        if self.rows != expected_rows || self.cols != expected_cols {
            return Err(PercError::GridShape {
                expected_rows,
                expected_cols,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(())
    }
}

/// A sampled grid together with the layer count it was drawn for.
#[derive(Clone, Debug)]
pub struct SampledGrid {
    pub grid: GateGrid,
    pub layers: LayerCount,
}

/// Draws a random brickwork circuit.
///
/// Every cell is an independent draw from swap, cnot, id_projection and
/// bell_projection with the weights of `probs`. Rows are drawn in pairs;
/// on an open lattice the wrap-around cell of each odd row is overwritten
/// with `Gate::Empty` after its draw, so the random stream consumed is the
/// same for open and periodic lattices.
///
/// # Arguments
///
/// * `lattice` - Lattice geometry; must already be valid
/// * `probs` - Gate probabilities
/// * `rng` - Random source; identical seeds give identical grids
///
/// # Returns
///
/// The sampled grid and its layer count. A rounded layer count is logged
/// at info level and flagged in the returned `LayerCount`.
pub fn sample_gate_grid<R: Rng + ?Sized>(
    lattice: &Lattice,
    probs: &Probabilities,
    rng: &mut R,
) -> PercResult<SampledGrid> {
    lattice.validate()?;
    let layers = lattice.layers();
    if layers.rounded {
        log::info!(
            "layer count {} was rounded to {}",
            layers.requested,
            layers.layers
        );
    }

    let dist = WeightedIndex::new(probs.weights())
        .map_err(|e| PercError::InvalidConfig(format!("gate weights: {}", e)))?;

    let cols = lattice.half_width();
    let mut cells = Vec::with_capacity(layers.layers * cols);
    for _ in (0..layers.layers).step_by(2) {
        for _ in 0..2 * cols {
            cells.push(Gate::SAMPLED[dist.sample(rng)]);
        }
        if !lattice.periodic {
            if let Some(last) = cells.last_mut() {
                *last = Gate::Empty;
            }
        }
    }

    Ok(SampledGrid {
        grid: GateGrid {
            rows: layers.layers,
            cols,
            cells,
        },
        layers,
    })
}
