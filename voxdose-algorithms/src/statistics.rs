//! Per-region dose statistics aggregation.
#![allow(clippy::cast_precision_loss)]

use rayon::prelude::*;
use voxdose_core::{Error, RegionElement, Result, VoxelGrid};

/// Minimum voxels per rayon work item; the per-voxel body is a handful of
/// flops, so fine-grained splitting costs more than it saves.
const PAR_MIN_LEN: usize = 4096;

#[derive(Debug, Clone, Copy, Default)]
struct Bin {
    voxels: usize,
    mass: f64,
    energy: f64,
    dose_max: f64,
    events: u64,
    variance: f64,
}

fn merge_bins(mut left: Vec<Bin>, right: Vec<Bin>) -> Vec<Bin> {
    for (a, b) in left.iter_mut().zip(right) {
        a.voxels += b.voxels;
        a.mass += b.mass;
        a.energy += b.energy;
        a.dose_max = a.dose_max.max(b.dose_max);
        a.events += b.events;
        a.variance += b.variance;
    }
    left
}

/// Reduces co-registered density, dose, tally and variance volumes into one
/// summary row per entry of `label_names`.
///
/// The output always has `label_names.len()` rows in label-id order; labels
/// absent from the volume yield all-zero rows. Mean dose is mass-weighted
/// (energy deposited over region mass); the dose standard deviation needs the
/// per-label mean energy and therefore a genuine second pass over the voxels.
/// Both passes reduce into thread-local per-label bins that are merged
/// associatively, so no lock is taken inside the voxel loops.
///
/// # Errors
/// Returns [`Error::GridMismatch`] if any input volume is not co-registered
/// with `labels`, and [`Error::LabelOutOfRange`] if a voxel's label has no
/// entry in `label_names`. Both are detected before any accumulation.
pub fn region_statistics(
    labels: &VoxelGrid<u8>,
    label_names: &[String],
    density: &VoxelGrid<f32>,
    dose: &VoxelGrid<f64>,
    tally: &VoxelGrid<u32>,
    variance: &VoxelGrid<f64>,
) -> Result<Vec<RegionElement>> {
    labels.ensure_coregistered(density, "density", "label")?;
    labels.ensure_coregistered(dose, "dose", "label")?;
    labels.ensure_coregistered(tally, "tally", "label")?;
    labels.ensure_coregistered(variance, "variance", "label")?;

    let bins = label_names.len();
    if let Some(&bad) = labels
        .as_slice()
        .par_iter()
        .find_any(|&&label| usize::from(label) >= bins)
    {
        return Err(Error::LabelOutOfRange {
            label: usize::from(bad),
            labels: bins,
        });
    }

    let voxel_volume = labels.voxel_volume_cm3();
    let label_buf = labels.as_slice();
    let density_buf = density.as_slice();
    let dose_buf = dose.as_slice();
    let tally_buf = tally.as_slice();
    let variance_buf = variance.as_slice();

    let pass1: Vec<Bin> = (0..label_buf.len())
        .into_par_iter()
        .with_min_len(PAR_MIN_LEN)
        .fold(
            || vec![Bin::default(); bins],
            |mut acc, i| {
                let bin = &mut acc[usize::from(label_buf[i])];
                let mass = voxel_volume * f64::from(density_buf[i]) * 0.001;
                bin.voxels += 1;
                bin.mass += mass;
                bin.energy += dose_buf[i] * mass;
                bin.dose_max = bin.dose_max.max(dose_buf[i]);
                bin.events += u64::from(tally_buf[i]);
                bin.variance += variance_buf[i] * mass * mass;
                acc
            },
        )
        .reduce(|| vec![Bin::default(); bins], merge_bins);

    let mean_energy: Vec<f64> = pass1
        .iter()
        .map(|bin| {
            if bin.voxels > 0 {
                bin.energy / bin.voxels as f64
            } else {
                0.0
            }
        })
        .collect();

    let std_acc: Vec<f64> = (0..label_buf.len())
        .into_par_iter()
        .with_min_len(PAR_MIN_LEN)
        .fold(
            || vec![0.0f64; bins],
            |mut acc, i| {
                let index = usize::from(label_buf[i]);
                let mass = voxel_volume * f64::from(density_buf[i]) * 0.001;
                let spread = dose_buf[i] * mass - mean_energy[index];
                acc[index] += spread * spread;
                acc
            },
        )
        .reduce(
            || vec![0.0f64; bins],
            |mut left, right| {
                for (a, b) in left.iter_mut().zip(right) {
                    *a += b;
                }
                left
            },
        );

    let rows = label_names
        .iter()
        .enumerate()
        .map(|(id, name)| {
            let bin = &pass1[id];
            let mut row = RegionElement::empty(id, name.clone());
            row.voxels = bin.voxels;
            row.volume_cm3 = bin.voxels as f64 * voxel_volume;
            row.dose_max = bin.dose_max;
            row.events = bin.events;
            row.mass_kg = bin.mass;
            // Empty or massless bins report zeros instead of 0/0.
            if bin.mass > 0.0 {
                row.dose_mean = bin.energy / bin.mass;
                row.dose_variance = bin.variance / (bin.mass * bin.mass);
                if bin.voxels > 1 {
                    row.dose_std = (std_acc[id] / bin.voxels as f64).sqrt() / bin.mass;
                }
            }
            row
        })
        .collect();

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|&n| n.to_string()).collect()
    }

    fn grid<T: Clone>(data: Vec<T>, dims: [usize; 3]) -> VoxelGrid<T> {
        VoxelGrid::new(data, dims, [10.0, 10.0, 10.0], [0.0; 3]).unwrap()
    }

    #[test]
    fn test_mismatched_density_rejected() {
        let labels = grid(vec![0u8; 8], [2, 2, 2]);
        let density = grid(vec![1.0f32; 4], [2, 2, 1]);
        let dose = grid(vec![0.0f64; 8], [2, 2, 2]);
        let tally = grid(vec![0u32; 8], [2, 2, 2]);
        let variance = grid(vec![0.0f64; 8], [2, 2, 2]);

        let result = region_statistics(
            &labels,
            &names(&["a"]),
            &density,
            &dose,
            &tally,
            &variance,
        );
        assert!(matches!(
            result,
            Err(Error::GridMismatch { role: "density", .. })
        ));
    }

    #[test]
    fn test_label_without_name_rejected() {
        let labels = grid(vec![0u8, 5], [2, 1, 1]);
        let density = grid(vec![1.0f32; 2], [2, 1, 1]);
        let dose = grid(vec![0.0f64; 2], [2, 1, 1]);
        let tally = grid(vec![0u32; 2], [2, 1, 1]);
        let variance = grid(vec![0.0f64; 2], [2, 1, 1]);

        let result = region_statistics(
            &labels,
            &names(&["a", "b"]),
            &density,
            &dose,
            &tally,
            &variance,
        );
        assert!(matches!(
            result,
            Err(Error::LabelOutOfRange { label: 5, labels: 2 })
        ));
    }

    #[test]
    fn test_uniform_region_has_zero_std() {
        let labels = grid(vec![0u8; 8], [2, 2, 2]);
        let density = grid(vec![1.0f32; 8], [2, 2, 2]);
        let dose = grid(vec![2.5f64; 8], [2, 2, 2]);
        let tally = grid(vec![3u32; 8], [2, 2, 2]);
        let variance = grid(vec![0.0f64; 8], [2, 2, 2]);

        let rows = region_statistics(
            &labels,
            &names(&["water"]),
            &density,
            &dose,
            &tally,
            &variance,
        )
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_relative_eq!(rows[0].dose_mean, 2.5);
        assert_relative_eq!(rows[0].dose_std, 0.0);
        assert_relative_eq!(rows[0].dose_max, 2.5);
        assert_eq!(rows[0].events, 24);
    }

    #[test]
    fn test_variance_volume_propagates() {
        // Two voxels, equal mass m: variance_acc = 2·v·m², over mass² = (2m)²
        // gives v/2.
        let labels = grid(vec![0u8, 0], [2, 1, 1]);
        let density = grid(vec![1.0f32, 1.0], [2, 1, 1]);
        let dose = grid(vec![1.0f64, 1.0], [2, 1, 1]);
        let tally = grid(vec![0u32, 0], [2, 1, 1]);
        let variance = grid(vec![4.0f64, 4.0], [2, 1, 1]);

        let rows = region_statistics(
            &labels,
            &names(&["water"]),
            &density,
            &dose,
            &tally,
            &variance,
        )
        .unwrap();
        assert_relative_eq!(rows[0].dose_variance, 2.0);
    }

    #[test]
    fn test_single_voxel_region_has_zero_std() {
        let labels = grid(vec![0u8], [1, 1, 1]);
        let density = grid(vec![1.0f32], [1, 1, 1]);
        let dose = grid(vec![7.0f64], [1, 1, 1]);
        let tally = grid(vec![1u32], [1, 1, 1]);
        let variance = grid(vec![0.5f64], [1, 1, 1]);

        let rows = region_statistics(
            &labels,
            &names(&["water"]),
            &density,
            &dose,
            &tally,
            &variance,
        )
        .unwrap();
        assert_eq!(rows[0].voxels, 1);
        assert_relative_eq!(rows[0].dose_mean, 7.0);
        assert_relative_eq!(rows[0].dose_std, 0.0);
    }
}
