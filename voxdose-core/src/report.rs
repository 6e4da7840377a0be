//! Dose report rows.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One summary row of a per-region dose report.
///
/// Produced fresh by each aggregation call and never mutated afterwards.
/// Rows are ordered by `id`, which indexes the caller's label name list.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RegionElement {
    /// Label id, index into the label name list.
    pub id: usize,
    /// Region name (material or organ).
    pub name: String,
    /// Number of voxels carrying this label.
    pub voxels: usize,
    /// Total mass in kg.
    pub mass_kg: f64,
    /// Total volume in cm³.
    pub volume_cm3: f64,
    /// Mass-weighted mean dose.
    pub dose_mean: f64,
    /// Sample standard deviation of the per-voxel energy, dose units.
    pub dose_std: f64,
    /// Monte-Carlo dose variance aggregated over the region.
    pub dose_variance: f64,
    /// Maximum per-voxel dose in the region.
    pub dose_max: f64,
    /// Total number of simulation events scored in the region.
    pub events: u64,
}

impl RegionElement {
    /// Creates an all-zero row for label `id`.
    pub fn empty(id: usize, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            voxels: 0,
            mass_kg: 0.0,
            volume_cm3: 0.0,
            dose_mean: 0.0,
            dose_std: 0.0,
            dose_variance: 0.0,
            dose_max: 0.0,
            events: 0,
        }
    }
}
