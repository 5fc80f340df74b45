//! I/O utilities for percolation sweeps.
//!
//! Provides reading and writing of results tables, collision-free naming of
//! output files, the text format for gate grids, and the aggregation of
//! finished runs into a single summary file.

/// Text format for gate grids.
///
/// One line per sub-layer with whitespace-separated gate labels. Lets a
/// sampled circuit be saved, edited by hand, and fed back into a sample.
pub mod grid_file;

/// Output file naming.
///
/// Picks the first unused `data*.csv` name in a directory and claims it on
/// disk before any work starts.
pub mod naming;

/// Aggregation of results tables.
///
/// Loads every results file of a directory into one table and writes the
/// per-column summary rows.
pub mod summary;

/// Results table with a four-level column key.
///
/// Holds one row per iteration and one column per (p, q, r, metric), and
/// persists itself as CSV with a full-file atomic replace.
pub mod table;
