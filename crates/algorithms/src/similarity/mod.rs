//! Multivariate environmental similarity surfaces (MESS)
//!
//! - **reference**: predictor values at the reference locations
//! - **scale**: integer-safe rounding precision
//! - **recode**: empirical CDF as a recode table
//! - **ies**: individual environmental similarity per predictor
//! - **aggregate**: MESS, most dissimilar variable, mean, median, negative mask
//! - **engine**: configuration and full runs against a layer store

pub mod aggregate;
pub mod engine;
pub mod ies;
pub mod recode;
pub mod reference;
pub mod scale;

pub use aggregate::{aggregate, AggregateOptions, MessSurfaces};
pub use engine::{
    predictor_surface, predictor_surface_with, run, Mess, MessConfig, MessInput, MessParams, MessReport, MessResult,
    OutputNames, OutputSelection, Predictor, PredictorSurface, ReferenceInput,
};
pub use ies::{ies_layer, similarity};
pub use recode::{RecodeRule, RecodeTable};
pub use reference::{extract_from_mask, extract_from_points, ReferenceSample, ReferenceValues};
pub use scale::{choose_scale, DEFAULT_DIGITS, INTEGER_DOMAIN_LIMIT};
