//! Error types for voxdose-core.

use thiserror::Error;

/// Result type alias for voxdose operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for voxdose operations.
///
/// All variants are configuration errors detected before any per-voxel work
/// begins; a rejected call produces no partial output.
#[derive(Error, Debug)]
pub enum Error {
    /// Candidate material list is empty.
    #[error("candidate material list is empty")]
    EmptyMaterialList,

    /// More candidate materials than the label volume can index.
    #[error("candidate material list has {count} entries, at most 256 are supported")]
    TooManyMaterials { count: usize },

    /// Spectrum contains no bins.
    #[error("spectrum contains no (energy, weight) pairs")]
    EmptySpectrum,

    /// Spectrum weights sum to zero, weighted means are undefined.
    #[error("spectrum weights sum to zero")]
    ZeroSpectrumWeight,

    /// Water and air references resolve to the same attenuation.
    #[error("calibration references have equal spectrum-weighted attenuation")]
    DegenerateCalibration,

    /// Flat buffer length does not match the stated dimensions.
    #[error("buffer of {len} voxels does not match dimensions {dims:?}")]
    DimensionMismatch { dims: [usize; 3], len: usize },

    /// Two grids of one study are not co-registered.
    #[error("{role} grid is not co-registered with the {reference} grid")]
    GridMismatch {
        role: &'static str,
        reference: &'static str,
    },

    /// Label volume refers past the end of the label name list.
    #[error("label {label} out of range for {labels} label names")]
    LabelOutOfRange { label: usize, labels: usize },
}
