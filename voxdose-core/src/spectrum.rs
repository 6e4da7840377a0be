//! X-ray tube spectrum representation.

use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Relative photon fluence of an X-ray tube at its configured kV/filtration.
///
/// An ordered sequence of (energy keV, weight) pairs. Weights are not
/// required to be normalized; every consumer normalizes by the total weight
/// when forming spectrum-weighted means.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Spectrum {
    bins: Vec<(f64, f64)>,
    total_weight: f64,
}

impl Spectrum {
    /// Creates a spectrum from (energy, weight) pairs.
    ///
    /// # Errors
    /// Returns [`Error::EmptySpectrum`] for an empty sequence and
    /// [`Error::ZeroSpectrumWeight`] when the weights sum to zero.
    pub fn new(bins: Vec<(f64, f64)>) -> Result<Self> {
        if bins.is_empty() {
            return Err(Error::EmptySpectrum);
        }
        let total_weight: f64 = bins.iter().map(|&(_, w)| w).sum();
        if total_weight == 0.0 {
            return Err(Error::ZeroSpectrumWeight);
        }
        Ok(Self { bins, total_weight })
    }

    /// Number of energy bins.
    #[inline]
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    /// Always false; construction rejects empty spectra.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Iterates over (energy, weight) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.bins.iter().copied()
    }

    /// Sum of all bin weights.
    #[inline]
    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// Spectrum-weighted mean of `f(energy)`, normalized by the total weight.
    pub fn weighted_mean<F>(&self, f: F) -> f64
    where
        F: Fn(f64) -> f64,
    {
        let sum: f64 = self.bins.iter().map(|&(e, w)| w * f(e)).sum();
        sum / self.total_weight
    }
}
