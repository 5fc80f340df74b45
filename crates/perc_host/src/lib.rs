//! Host-side drivers for percolation sweeps.
//!
//! Runs parameter sweeps with periodic checkpoints, splits them across
//! worker threads, reduces finished tables to summary statistics, and
//! checks the circuit sampler against its expected gate frequencies.

/// Gate-frequency check of the sampler.
pub mod check;

/// Column statistics and summary reports.
pub mod stats;

/// Sequential sweep over the parameter grid with checkpointing.
///
/// Visits cells in a fixed order, records every sample in a results table,
/// and rewrites the whole table after each cell so that an interrupted run
/// leaves a consistent file behind.
pub mod sweep;

/// Independent sweeps on the rayon pool.
pub mod workers;
