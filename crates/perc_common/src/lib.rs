//! Common definitions shared across the percolation simulation crates.
//!
//! This module provides the gate vocabulary used by sampled circuits and the
//! metric names written to result tables. Both carry stable text labels so
//! that persisted grids and tables stay readable by older tooling.

#![no_std]

/// Gate vocabulary for brickwork circuits.
///
/// Each cell of a sampled circuit holds one of these labels. The label picks
/// the wiring gadget the diagram builder stamps onto the pair of wires the
/// cell covers.
pub mod gates {
    use core::fmt;

    /// Two-wire gadget placed at one cell of the brickwork.
    ///
    /// The four drawable gates are sampled with weights derived from the
    /// (p, q, r) triple. `Empty` only appears where a cell has no partner
    /// wire, such as the wrap-around cell of an open lattice.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub enum Gate {
        /// Exchange the two wires.
        ///
        /// Drawn with weight (1-p)(1-r). Leaves no spider behind; the wires
        /// simply cross.
        Swap,

        /// Entangling gate between the two wires.
        ///
        /// Drawn with weight (1-p)r. Becomes a Z spider on the control wire
        /// and an X spider on the target wire joined by a single edge. The
        /// control side is chosen by a fair coin when the gadget is built.
        Cnot,

        /// Projection that leaves both wires running straight through.
        ///
        /// Drawn with weight p(1-q).
        IdProjection,

        /// Bell-pair projection cutting both wires.
        ///
        /// Drawn with weight pq. Joins the lower halves of the two wires to
        /// each other and the upper halves to each other.
        BellProjection,

        /// No gadget at this cell.
        Empty,
    }

    impl Gate {
        /// The drawable gates, in the order of their sampling weights.
        pub const SAMPLED: [Gate; 4] = [
            Gate::Swap,
            Gate::Cnot,
            Gate::IdProjection,
            Gate::BellProjection,
        ];

        /// Stable text label used in grid files and reports.
        pub fn label(self) -> &'static str {
            match self {
                Gate::Swap => "swap",
                Gate::Cnot => "cnot",
                Gate::IdProjection => "id_projection",
                Gate::BellProjection => "bell_projection",
                Gate::Empty => "",
            }
        }

        /// Parses a label produced by [`Gate::label`].
        ///
        /// Returns None for anything that is not one of the five labels.
        pub fn from_label(label: &str) -> Option<Gate> {
            match label {
                "swap" => Some(Gate::Swap),
                "cnot" => Some(Gate::Cnot),
                "id_projection" => Some(Gate::IdProjection),
                "bell_projection" => Some(Gate::BellProjection),
                "" => Some(Gate::Empty),
                _ => None,
            }
        }

        pub fn is_empty(self) -> bool {
            self == Gate::Empty
        }
    }

    impl fmt::Display for Gate {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.label())
        }
    }
}

/// Structural metrics recorded for every sample.
///
/// The column names are part of the persisted table format. `min_cut_ff`
/// duplicates `min_cut` and is kept because downstream readers select it
/// by name.
pub mod metrics {
    use core::fmt;

    /// One named scalar of a sample result.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub enum Metric {
        /// Largest connected component as a fraction of all nodes.
        Lc,
        /// Second-largest connected component as a fraction of all nodes.
        Slc,
        /// 1 when some input reaches some output, 0 otherwise.
        IsPath,
        /// Input to output minimum cut.
        MinCut,
        /// Same formulation as `MinCut`, stored under its legacy name.
        MinCutFf,
        /// Minimum cut between the two halves of the outputs after the
        /// inputs were recoloured to X spiders.
        MinCutX,
    }

    impl Metric {
        /// Every metric, in column order.
        pub const ALL: [Metric; 6] = [
            Metric::Lc,
            Metric::Slc,
            Metric::IsPath,
            Metric::MinCut,
            Metric::MinCutFf,
            Metric::MinCutX,
        ];

        /// Column name used in result tables.
        pub fn name(self) -> &'static str {
            match self {
                Metric::Lc => "lc",
                Metric::Slc => "slc",
                Metric::IsPath => "is_path",
                Metric::MinCut => "min_cut",
                Metric::MinCutFf => "min_cut_ff",
                Metric::MinCutX => "min_cut_X",
            }
        }

        pub fn from_name(name: &str) -> Option<Metric> {
            Metric::ALL.into_iter().find(|m| m.name() == name)
        }
    }

    impl fmt::Display for Metric {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.name())
        }
    }
}
