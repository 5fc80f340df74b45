//! Lattice geometry and gate probabilities.
//!
//! Both types validate eagerly: a sweep with a bad parameter fails before
//! the first sample is drawn, and out-of-range probabilities are rejected
//! rather than clamped.

use crate::{PercError, PercResult};

/// Geometry of the brickwork lattice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lattice {
    /// Number of wires. Must be even so that every sub-layer pairs all wires.
    pub n: usize,

    /// Depth multiplier. The circuit has `floor(n * t_factor / 2) * 2`
    /// sub-layers.
    pub t_factor: f64,

    /// Whether the last wire pairs with the first in odd sub-layers.
    pub periodic: bool,
}

/// Sub-layer count of a lattice together with the value it was derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerCount {
    /// Number of sub-layers, always even.
    pub layers: usize,

    /// The unrounded `n * t_factor`.
    pub requested: f64,

    /// True when `requested` was not already an even integer.
    pub rounded: bool,
}

impl Lattice {
    pub fn new(n: usize, t_factor: f64, periodic: bool) -> PercResult<Self> {
        let lattice = Self {
            n,
            t_factor,
            periodic,
        };
        lattice.validate()?;
        Ok(lattice)
    }

    /// Checks the lattice invariants.
    ///
    /// The wire count must be a positive even number, the depth multiplier
    /// a positive finite number, and the derived layer count at least two
    /// so that inputs and outputs are distinct rows.
    pub fn validate(&self) -> PercResult<()> {
        if self.n < 2 || self.n % 2 != 0 {
            return Err(PercError::InvalidConfig(format!(
                "lattice width must be a positive even number, got {}",
                self.n
            )));
        }
        if !self.t_factor.is_finite() || self.t_factor <= 0.0 {
            return Err(PercError::InvalidConfig(format!(
                "t_factor must be positive, got {}",
                self.t_factor
            )));
        }
        if self.layers().layers == 0 {
            return Err(PercError::InvalidConfig(format!(
                "n * t_factor = {} leaves no layers",
                self.n as f64 * self.t_factor
            )));
        }
        Ok(())
    }

    /// Derives the number of sub-layers.
    ///
    /// # Returns
    ///
    /// The even layer count and whether rounding took place. Rounding is
    /// informational; callers decide whether to report it.
    pub fn layers(&self) -> LayerCount {
        let requested = self.n as f64 * self.t_factor;
        let layers = (requested.floor() as usize / 2) * 2;
        LayerCount {
            layers,
            requested,
            rounded: layers as f64 != requested,
        }
    }

    /// Number of cells per sub-layer.
    pub fn half_width(&self) -> usize {
        self.n / 2
    }
}

/// The (p, q, r) triple that parameterises gate sampling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Probabilities {
    /// Measurement probability.
    pub p: f64,
    /// Fraction of measurements that are Bell projections.
    pub q: f64,
    /// Fraction of unitaries that are CNOTs.
    pub r: f64,
}

impl Probabilities {
    /// Builds a validated triple.
    ///
    /// # Returns
    ///
    /// `ProbabilityOutOfRange` naming the first offending value if any of
    /// the three is not a finite number in [0, 1].
    pub fn new(p: f64, q: f64, r: f64) -> PercResult<Self> {
        for (name, value) in [("p", p), ("q", q), ("r", r)] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(PercError::ProbabilityOutOfRange { name, value });
            }
        }
        Ok(Self { p, q, r })
    }

    /// Builds a triple from optional parts, failing if any part is absent.
    pub fn from_parts(p: Option<f64>, q: Option<f64>, r: Option<f64>) -> PercResult<Self> {
        match (p, q, r) {
            (Some(p), Some(q), Some(r)) => Self::new(p, q, r),
            _ => Err(PercError::MissingParameters),
        }
    }

    /// Sampling weights for swap, cnot, id_projection and bell_projection.
    ///
    /// The weights sum to one algebraically for every triple in [0, 1]^3;
    /// no renormalisation is applied.
    pub fn weights(&self) -> [f64; 4] {
        let Self { p, q, r } = *self;
        [
            (1.0 - p) * (1.0 - r),
            (1.0 - p) * r,
            p * (1.0 - q),
            p * q,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_sum_to_one() {
        let steps = [0.0, 0.1, 0.25, 0.5, 0.9, 1.0];
        for &p in &steps {
            for &q in &steps {
                for &r in &steps {
                    let w = Probabilities::new(p, q, r).unwrap().weights();
                    assert!(w.iter().all(|&x| x >= 0.0));
                    assert!((w.iter().sum::<f64>() - 1.0).abs() < 1e-12);
                }
            }
        }
    }

    #[test]
    fn test_out_of_range_probability_rejected() {
        assert!(matches!(
            Probabilities::new(1.5, 0.0, 0.0),
            Err(PercError::ProbabilityOutOfRange { name: "p", .. })
        ));
        assert!(matches!(
            Probabilities::new(0.0, f64::NAN, 0.0),
            Err(PercError::ProbabilityOutOfRange { name: "q", .. })
        ));
        assert!(matches!(
            Probabilities::new(0.0, 0.0, -0.1),
            Err(PercError::ProbabilityOutOfRange { name: "r", .. })
        ));
    }

    #[test]
    fn test_missing_parts() {
        assert!(matches!(
            Probabilities::from_parts(Some(0.1), None, Some(0.2)),
            Err(PercError::MissingParameters)
        ));
        assert!(Probabilities::from_parts(Some(0.1), Some(0.5), Some(0.2)).is_ok());
    }

    #[test]
    fn test_layer_rounding() {
        let exact = Lattice::new(4, 1.0, false).unwrap().layers();
        assert_eq!(exact.layers, 4);
        assert!(!exact.rounded);

        let odd = Lattice::new(6, 0.5, false).unwrap().layers();
        assert_eq!(odd.layers, 2);
        assert!(odd.rounded);

        let fractional = Lattice::new(4, 1.3, false).unwrap().layers();
        assert_eq!(fractional.layers, 4);
        assert!(fractional.rounded);
    }

    #[test]
    fn test_invalid_lattices() {
        assert!(Lattice::new(3, 1.0, false).is_err());
        assert!(Lattice::new(0, 1.0, false).is_err());
        assert!(Lattice::new(4, 0.0, false).is_err());
        assert!(Lattice::new(2, 0.5, false).is_err());
    }
}
