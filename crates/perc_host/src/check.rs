//! Sanity check of the circuit sampler.
//!
//! Draws many gate grids and compares the observed share of every gate
//! with its sampling weight.

use anyhow::Result;
use perc_common::gates::Gate;
use perc_core::config::{Lattice, Probabilities};
use perc_core::sampler::sample_gate_grid;
use rand::Rng;

/// Expected and observed frequency of one gate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GateFrequency {
    pub gate: Gate,
    pub expected: f64,
    pub observed: f64,
    /// `|observed - expected| / expected`, None when the gate has weight 0.
    pub relative_error: Option<f64>,
}

/// Samples `samples` grids and tallies the gates over all non-empty cells.
///
/// # Arguments
///
/// * `lattice` - Lattice the grids are drawn for
/// * `probs` - Gate probabilities
/// * `samples` - Number of grids to draw
/// * `rng` - Random source
pub fn check_frequencies<R: Rng + ?Sized>(
    lattice: &Lattice,
    probs: &Probabilities,
    samples: usize,
    rng: &mut R,
) -> Result<Vec<GateFrequency>> {
    let mut counts = [0usize; 4];
    for _ in 0..samples {
        let grid = sample_gate_grid(lattice, probs, rng)?.grid;
        for (count, gate) in counts.iter_mut().zip(Gate::SAMPLED) {
            *count += grid.count(gate);
        }
    }
    let total: usize = counts.iter().sum();
    log::debug!("tallied {} cells over {} grids", total, samples);

    let weights = probs.weights();
    Ok(Gate::SAMPLED
        .iter()
        .zip(counts)
        .zip(weights)
        .map(|((&gate, count), expected)| {
            let observed = if total == 0 {
                0.0
            } else {
                count as f64 / total as f64
            };
            GateFrequency {
                gate,
                expected,
                observed,
                relative_error: (expected > 0.0).then(|| (observed - expected).abs() / expected),
            }
        })
        .collect())
}

pub fn print_report(frequencies: &[GateFrequency]) {
    println!("{:<16} {:>10} {:>10} {:>10}", "gate", "expected", "observed", "rel. err");
    for f in frequencies {
        let err = f
            .relative_error
            .map_or_else(|| "-".to_string(), |e| format!("{:.4}", e));
        println!(
            "{:<16} {:>10.4} {:>10.4} {:>10}",
            f.gate.label(),
            f.expected,
            f.observed,
            err
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_frequencies_close_to_weights() {
        let lattice = Lattice::new(10, 2.0, true).unwrap();
        let probs = Probabilities::new(0.3, 0.4, 0.6).unwrap();
        let freqs = check_frequencies(&lattice, &probs, 200, &mut StdRng::seed_from_u64(8)).unwrap();
        // 200 grids of 20 x 5 cells
        for f in &freqs {
            assert!(f.relative_error.unwrap() < 0.1, "{:?}", f);
        }
        let sum: f64 = freqs.iter().map(|f| f.observed).sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_weight_has_no_relative_error() {
        let lattice = Lattice::new(4, 1.0, false).unwrap();
        let probs = Probabilities::new(0.0, 0.5, 0.0).unwrap();
        let freqs = check_frequencies(&lattice, &probs, 5, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(freqs[0].observed, 1.0);
        assert_eq!(freqs[0].relative_error, Some(0.0));
        assert!(freqs[1..].iter().all(|f| f.relative_error.is_none() && f.observed == 0.0));
    }
}
