//! # MESS Algorithms
//!
//! Environmental similarity analysis on predictor rasters.
//!
//! - **similarity**: multivariate environmental similarity surfaces
//! - **reclassify**: range-table recoding of raster values

mod maybe_rayon;
pub mod reclassify;
pub mod similarity;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::reclassify::{reclassify, ReclassEntry, ReclassifyParams};
    pub use crate::similarity::{
        aggregate, choose_scale, ies_layer, run, Mess, MessConfig, MessInput, MessParams,
        MessResult, OutputSelection, Predictor, RecodeTable, ReferenceInput, ReferenceSample,
    };
    pub use mess_core::prelude::*;
}
