//! # MESS Core
//!
//! Core types, traits and I/O for multivariate environmental similarity surfaces.
//!
//! This crate provides:
//! - `Raster<T>`: Generic raster grid type
//! - `GeoTransform`: Affine transformation for georeferencing
//! - `PointSet`: Identified reference locations
//! - `GridStore`: Named-layer storage used by the MESS engine
//! - I/O for GeoTIFF rasters and CSV point files

pub mod error;
pub mod io;
pub mod raster;
pub mod vector;

pub use error::{Error, Result};
pub use io::{DirectoryStore, GridStore, MemoryStore};
pub use raster::{GeoTransform, Raster, RasterElement};
pub use vector::{PointSet, ReferencePoint};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::io::GridStore;
    pub use crate::raster::{GeoTransform, Raster, RasterElement};
    pub use crate::vector::{PointSet, ReferencePoint};
    pub use crate::Algorithm;
}

/// Core trait for the algorithms built on this crate.
///
/// Algorithms are pure functions that transform input data according to parameters.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(&self, input: Self::Input, params: Self::Params) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
