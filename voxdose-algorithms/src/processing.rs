//! High-level processing helpers that combine decomposition and reporting.

use crate::decompose::{Candidate, Decomposition, HuCalibration, MaterialDecomposer};
use crate::statistics::region_statistics;
use voxdose_core::{Material, RegionElement, Result, Spectrum, VoxelGrid};

/// Decompose a CT volume, then aggregate simulation output into per-material
/// report rows.
///
/// The dose, tally and variance volumes come from the Monte-Carlo engine run
/// on the decomposition's material and density maps; they must share the CT
/// grid's geometry. Report rows follow the decomposer's sorted material
/// order, matching the label volume.
///
/// # Errors
/// Propagates configuration errors from [`MaterialDecomposer::new`] and
/// co-registration errors from [`region_statistics`].
pub fn decompose_and_report<M: Material>(
    ct: &VoxelGrid<f32>,
    spectrum: &Spectrum,
    calibration: HuCalibration,
    candidates: &[Candidate<M>],
    dose: &VoxelGrid<f64>,
    tally: &VoxelGrid<u32>,
    variance: &VoxelGrid<f64>,
) -> Result<(Decomposition, Vec<RegionElement>)> {
    let decomposer = MaterialDecomposer::new(candidates, spectrum, calibration)?;
    let decomposition = decomposer.decompose(ct)?;

    let names: Vec<String> = decomposition
        .materials
        .iter()
        .map(|entry| entry.name.clone())
        .collect();
    let rows = region_statistics(
        &decomposition.labels,
        &names,
        &decomposition.density,
        dose,
        tally,
        variance,
    )?;
    Ok((decomposition, rows))
}
