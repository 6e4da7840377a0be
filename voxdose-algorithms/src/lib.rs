//! voxdose-algorithms: Numeric pipelines over voxel grids.
//!
//! This crate provides the two dosimetry transforms:
//! - **MaterialDecomposer** - spectral CT-number material/density decomposition
//! - **region_statistics** - per-label dose aggregation over co-registered volumes
//!
#![warn(missing_docs)]

mod decompose;
mod processing;
mod statistics;

pub use decompose::{Candidate, Decomposition, HuCalibration, MaterialDecomposer, MaterialEntry};
pub use processing::decompose_and_report;
pub use statistics::region_statistics;

// Re-export the core types the pipelines consume and produce
pub use voxdose_core::{Material, RegionElement, Spectrum, VoxelGrid};
