//! Gate-grid text format.
//!
//! ```text
//! # n = 4, periodic = false
//! swap cnot
//! bell_projection .
//! ```
//!
//! Each non-comment line is one sub-layer. Cells are gate labels separated
//! by whitespace, with `.` marking an empty cell. Blank lines and lines
//! starting with `#` are skipped.

use anyhow::{Context, Result, anyhow};
use nom::{
    IResult,
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, space0, space1},
    combinator::{all_consuming, map, map_opt},
    multi::separated_list1,
    sequence::delimited,
};
use perc_common::gates::Gate;
use perc_core::sampler::GateGrid;
use std::fs;
use std::path::Path;

const EMPTY_CELL: &str = ".";

fn parse_cell(input: &str) -> IResult<&str, Gate> {
    alt((
        map(char('.'), |_| Gate::Empty),
        map_opt(
            take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_'),
            Gate::from_label,
        ),
    ))(input)
}

fn parse_row(input: &str) -> IResult<&str, Vec<Gate>> {
    all_consuming(delimited(
        space0,
        separated_list1(space1, parse_cell),
        space0,
    ))(input)
}

/// Parses a gate grid from text.
///
/// # Returns
///
/// The grid, or an error naming the first line with an unknown token. Rows
/// of different lengths are rejected.
pub fn parse_grid(text: &str) -> Result<GateGrid> {
    let mut rows = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let (_, row) = parse_row(trimmed)
            .map_err(|e| anyhow!("line {}: cannot parse {:?}: {}", lineno + 1, trimmed, e))?;
        rows.push(row);
    }
    Ok(GateGrid::from_rows(rows)?)
}

/// Renders a grid in the text format, one sub-layer per line.
pub fn format_grid(grid: &GateGrid) -> String {
    let mut out = String::new();
    for row in grid.iter_rows() {
        let cells: Vec<&str> = row
            .iter()
            .map(|g| if g.is_empty() { EMPTY_CELL } else { g.label() })
            .collect();
        out.push_str(&cells.join(" "));
        out.push('\n');
    }
    out
}

/// Loads a gate grid file.
pub fn load_grid_file<P: AsRef<Path>>(path: P) -> Result<GateGrid> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read grid file {}", path.display()))?;
    parse_grid(&text).with_context(|| format!("Invalid grid file {}", path.display()))
}

/// Writes a gate grid file, prefixed by an optional comment line.
pub fn save_grid_file<P: AsRef<Path>>(path: P, grid: &GateGrid, comment: Option<&str>) -> Result<()> {
    let path = path.as_ref();
    let mut text = String::new();
    if let Some(comment) = comment {
        text.push_str("# ");
        text.push_str(comment);
        text.push('\n');
    }
    text.push_str(&format_grid(grid));
    fs::write(path, text).with_context(|| format!("Failed to write grid file {}", path.display()))
}
