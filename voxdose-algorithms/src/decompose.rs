//! Spectral CT-number material and density decomposition.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::doc_markdown
)]

use rayon::prelude::*;
use voxdose_core::{Error, Material, Result, Spectrum, VoxelGrid};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A candidate material for decomposition, with an optional density override.
///
/// Overrides replace the material's standard density both when deriving its
/// reference HU and when inverting per-voxel densities, which is how organ
/// segmentation assigns e.g. inflated-lung densities to the lung material.
#[derive(Debug, Clone)]
pub struct Candidate<M> {
    material: M,
    density_override: Option<f64>,
}

impl<M: Material> Candidate<M> {
    /// Creates a candidate using the material's standard density.
    pub fn new(material: M) -> Self {
        Self {
            material,
            density_override: None,
        }
    }

    /// Replaces the bulk density used for this candidate.
    #[must_use]
    pub fn with_density(mut self, density: f64) -> Self {
        self.density_override = Some(density);
        self
    }

    /// The bulk density in effect for this candidate, g/cm³.
    pub fn density(&self) -> f64 {
        self.density_override
            .unwrap_or_else(|| self.material.standard_density())
    }

    /// The wrapped material.
    pub fn material(&self) -> &M {
        &self.material
    }
}

/// Spectrum-weighted linear attenuations of the water and air references.
///
/// These two fixed references anchor the HU scale for a given beam quality,
/// independent of which materials are in the candidate list. Water sits at
/// HU 0 and air at HU −1000 by construction.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HuCalibration {
    mu_water: f64,
    mu_air: f64,
}

impl HuCalibration {
    /// Derives the calibration from reference materials and a tube spectrum.
    ///
    /// # Errors
    /// Returns [`Error::DegenerateCalibration`] if the references resolve to
    /// the same linear attenuation, which would collapse the HU scale.
    pub fn from_references<M: Material>(spectrum: &Spectrum, water: &M, air: &M) -> Result<Self> {
        let mu_water =
            water.standard_density() * spectrum.weighted_mean(|e| water.mass_attenuation(e));
        let mu_air = air.standard_density() * spectrum.weighted_mean(|e| air.mass_attenuation(e));
        if mu_water == mu_air {
            return Err(Error::DegenerateCalibration);
        }
        Ok(Self { mu_water, mu_air })
    }

    /// Converts a linear attenuation into a CT number.
    #[inline]
    fn hu_from_mu(&self, mu: f64) -> f64 {
        (mu - self.mu_water) / (self.mu_water - self.mu_air) * 1000.0
    }

    /// Converts a CT number back into a linear attenuation.
    #[inline]
    fn mu_from_hu(&self, hu: f64) -> f64 {
        hu * (self.mu_water - self.mu_air) / 1000.0 + self.mu_water
    }
}

/// Per-candidate values derived at construction, in ascending-HU order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MaterialEntry {
    /// Material name.
    pub name: String,
    /// Position of this candidate in the caller's input list.
    pub input_index: usize,
    /// Reference CT number of the candidate at the configured beam quality.
    pub hu: f64,
    /// Bulk density in effect (override or standard), g/cm³.
    pub density: f64,
    /// Spectrum-weighted mass attenuation, cm²/g.
    pub mass_attenuation: f64,
}

/// Result of one decomposition call.
///
/// `labels` index into `materials`, which is sorted by reference HU, not
/// into the caller's input order; `MaterialEntry::input_index` maps back.
#[derive(Debug, Clone)]
pub struct Decomposition {
    /// Per-voxel material index into `materials`.
    pub labels: VoxelGrid<u8>,
    /// Per-voxel mass density in g/cm³.
    pub density: VoxelGrid<f32>,
    /// The candidate materials in ascending-HU order, as indexed by `labels`.
    pub materials: Vec<MaterialEntry>,
}

/// Classifies CT-number voxels into candidate materials and estimates a
/// per-voxel mass density consistent with the classification.
///
/// Construction precomputes the spectrum-weighted attenuation and reference
/// HU of every candidate, sorts candidates by HU and builds the midpoint
/// threshold table; the per-voxel passes are pure table lookups and run in
/// parallel.
#[derive(Debug, Clone)]
pub struct MaterialDecomposer {
    calibration: HuCalibration,
    materials: Vec<MaterialEntry>,
    /// Upper HU bound per sorted material; the last bound is +∞ so the
    /// highest-HU material catches every remaining voxel.
    thresholds: Vec<f64>,
}

impl MaterialDecomposer {
    /// Builds a decomposer for one candidate list and beam quality.
    ///
    /// Candidates may arrive in any order; they are sorted by derived HU
    /// internally.
    ///
    /// # Errors
    /// Returns [`Error::EmptyMaterialList`] for an empty candidate list and
    /// [`Error::TooManyMaterials`] when the list cannot be indexed by `u8`
    /// labels.
    pub fn new<M: Material>(
        candidates: &[Candidate<M>],
        spectrum: &Spectrum,
        calibration: HuCalibration,
    ) -> Result<Self> {
        if candidates.is_empty() {
            return Err(Error::EmptyMaterialList);
        }
        if candidates.len() > usize::from(u8::MAX) + 1 {
            return Err(Error::TooManyMaterials {
                count: candidates.len(),
            });
        }

        let mut materials: Vec<MaterialEntry> = candidates
            .iter()
            .enumerate()
            .map(|(input_index, candidate)| {
                let mass_attenuation =
                    spectrum.weighted_mean(|e| candidate.material().mass_attenuation(e));
                let density = candidate.density();
                MaterialEntry {
                    name: candidate.material().name().to_string(),
                    input_index,
                    hu: calibration.hu_from_mu(density * mass_attenuation),
                    density,
                    mass_attenuation,
                }
            })
            .collect();
        materials.sort_by(|a, b| a.hu.total_cmp(&b.hu));

        let mut thresholds: Vec<f64> = materials
            .windows(2)
            .map(|pair| (pair[0].hu + pair[1].hu) / 2.0)
            .collect();
        thresholds.push(f64::INFINITY);

        Ok(Self {
            calibration,
            materials,
            thresholds,
        })
    }

    /// The candidate materials in ascending-HU order, as indexed by the
    /// label volume.
    pub fn materials(&self) -> &[MaterialEntry] {
        &self.materials
    }

    /// Classifies every voxel of a CT-number volume.
    ///
    /// First-match scan over the ascending threshold table; the +∞ tail
    /// guarantees every voxel resolves to exactly one material.
    ///
    /// # Errors
    /// Infallible per voxel; returns an error only if the output grid cannot
    /// mirror the input geometry, which cannot happen for a valid input.
    pub fn classify(&self, ct: &VoxelGrid<f32>) -> Result<VoxelGrid<u8>> {
        let thresholds = &self.thresholds;
        let labels: Vec<u8> = ct
            .as_slice()
            .par_iter()
            .map(|&value| {
                let hu = f64::from(value);
                let mut index = 0u8;
                for (i, &bound) in thresholds.iter().enumerate() {
                    if bound >= hu {
                        index = i as u8;
                        break;
                    }
                }
                index
            })
            .collect();
        VoxelGrid::with_geometry_of(labels, ct)
    }

    /// Computes the per-voxel mass density implied by the CT numbers and the
    /// assigned materials.
    ///
    /// Inverts the HU rescale to recover each voxel's linear attenuation,
    /// then divides by the assigned material's spectrum-weighted mass
    /// attenuation. Negative results clamp to zero; a zero-attenuation
    /// placeholder material yields zero density instead of dividing.
    ///
    /// # Errors
    /// Returns [`Error::GridMismatch`] if `labels` is not co-registered with
    /// `ct`, and [`Error::LabelOutOfRange`] if a label has no entry in the
    /// sorted candidate list. Both are detected before any per-voxel work.
    pub fn density_map(
        &self,
        ct: &VoxelGrid<f32>,
        labels: &VoxelGrid<u8>,
    ) -> Result<VoxelGrid<f32>> {
        ct.ensure_coregistered(labels, "material index", "CT")?;
        let bins = self.materials.len();
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
        let calibration = self.calibration;
        let materials = &self.materials;
        let density: Vec<f32> = ct
            .as_slice()
            .par_iter()
            .zip(labels.as_slice().par_iter())
            .map(|(&value, &label)| {
                let entry = &materials[usize::from(label)];
                if entry.mass_attenuation == 0.0 {
                    return 0.0;
                }
                let mu = calibration.mu_from_hu(f64::from(value));
                (mu / entry.mass_attenuation).max(0.0) as f32
            })
            .collect();
        VoxelGrid::with_geometry_of(density, ct)
    }

    /// Runs classification and density estimation in one call.
    ///
    /// # Errors
    /// Propagates grid construction errors; no per-voxel failure exists.
    pub fn decompose(&self, ct: &VoxelGrid<f32>) -> Result<Decomposition> {
        let labels = self.classify(ct)?;
        let density = self.density_map(ct, &labels)?;
        Ok(Decomposition {
            labels,
            density,
            materials: self.materials.clone(),
        })
    }
}
