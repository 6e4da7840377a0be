//! Voxel grid storage shared by all pipeline stages.

use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A 3D voxel volume stored as a flat buffer.
///
/// Voxels are addressed by `i = x + y*W + z*W*H`. Grids of different roles
/// (CT numbers, density, material index, dose, tally, variance, organ labels)
/// must share dimensions, spacing and origin within one study; mismatched
/// grids are rejected at pipeline boundaries, never resized.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VoxelGrid<T> {
    data: Vec<T>,
    dimensions: [usize; 3],
    spacing: [f64; 3],
    origin: [f64; 3],
}

impl<T> VoxelGrid<T> {
    /// Creates a grid from a flat buffer.
    ///
    /// Spacing and origin are in millimeters. The buffer length must equal
    /// `W * H * D`.
    ///
    /// # Errors
    /// Returns [`Error::DimensionMismatch`] if the buffer length does not
    /// match the dimensions.
    pub fn new(
        data: Vec<T>,
        dimensions: [usize; 3],
        spacing: [f64; 3],
        origin: [f64; 3],
    ) -> Result<Self> {
        let expected = dimensions[0] * dimensions[1] * dimensions[2];
        if data.len() != expected {
            return Err(Error::DimensionMismatch {
                dims: dimensions,
                len: data.len(),
            });
        }
        Ok(Self {
            data,
            dimensions,
            spacing,
            origin,
        })
    }

    /// Creates a grid carrying the geometry of `reference`.
    ///
    /// Used by pipeline stages producing an output volume on the same grid
    /// as their input.
    ///
    /// # Errors
    /// Returns [`Error::DimensionMismatch`] if the buffer length does not
    /// match the reference dimensions.
    pub fn with_geometry_of<U>(data: Vec<T>, reference: &VoxelGrid<U>) -> Result<Self> {
        Self::new(
            data,
            reference.dimensions,
            reference.spacing,
            reference.origin,
        )
    }

    /// Returns the grid dimensions `[W, H, D]`.
    #[inline]
    pub fn dimensions(&self) -> [usize; 3] {
        self.dimensions
    }

    /// Returns the voxel spacing in millimeters.
    #[inline]
    pub fn spacing(&self) -> [f64; 3] {
        self.spacing
    }

    /// Returns the grid origin in millimeters.
    #[inline]
    pub fn origin(&self) -> [f64; 3] {
        self.origin
    }

    /// Returns the number of voxels.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the grid holds no voxels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the flat voxel buffer.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Consumes the grid and returns the flat voxel buffer.
    #[inline]
    pub fn into_raw(self) -> Vec<T> {
        self.data
    }

    /// Computes the flat index of voxel `(x, y, z)`.
    #[inline]
    pub fn flat_index(&self, x: usize, y: usize, z: usize) -> usize {
        x + y * self.dimensions[0] + z * self.dimensions[0] * self.dimensions[1]
    }

    /// Returns the volume of a single voxel in cm³ (spacing is mm).
    #[inline]
    pub fn voxel_volume_cm3(&self) -> f64 {
        self.spacing[0] * self.spacing[1] * self.spacing[2] / 1000.0
    }

    /// Checks that `other` shares this grid's geometry.
    ///
    /// # Errors
    /// Returns [`Error::GridMismatch`] naming the offending `role` if
    /// dimensions, spacing or origin differ.
    pub fn ensure_coregistered<U>(
        &self,
        other: &VoxelGrid<U>,
        role: &'static str,
        reference: &'static str,
    ) -> Result<()> {
        if self.dimensions != other.dimensions
            || self.spacing != other.spacing
            || self.origin != other.origin
        {
            return Err(Error::GridMismatch { role, reference });
        }
        Ok(())
    }
}
