//! voxdose-core: Core types and traits for voxel-grid dosimetry.
//!
//! This crate provides the foundational abstractions for CT-number material
//! decomposition and per-region dose aggregation: voxel grids, material and
//! spectrum interfaces to the physics reference library, and report rows.
//!

pub mod error;
pub mod grid;
pub mod material;
pub mod report;
pub mod spectrum;

pub use error::{Error, Result};
pub use grid::VoxelGrid;
pub use material::{Material, TabulatedMaterial};
pub use report::RegionElement;
pub use spectrum::Spectrum;
