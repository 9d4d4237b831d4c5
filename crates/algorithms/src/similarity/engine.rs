//! MESS orchestration
//!
//! [`Mess`] runs the algorithm on in-memory layers. [`run`] drives a full
//! job against a [`GridStore`]: pre-flight checks, parallel per-predictor
//! work, aggregation and output writing.

use super::aggregate::{aggregate, AggregateOptions, MessSurfaces};
use super::ies::ies_layer;
use super::recode::RecodeTable;
use super::reference::ReferenceSample;
use super::scale::{choose_scale, DEFAULT_DIGITS};
use crate::maybe_rayon::*;
use mess_core::io::GridStore;
use mess_core::raster::Raster;
use mess_core::vector::PointSet;
use mess_core::{Algorithm, Error, Result};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Optional outputs of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSelection {
    /// Index of the most dissimilar variable
    pub most_dissimilar: bool,
    pub mean: bool,
    pub median: bool,
    /// Mask of cells with negative MESS
    pub negative: bool,
    /// Write the IES layer of every predictor
    pub keep_ies: bool,
}

impl Default for OutputSelection {
    fn default() -> Self {
        Self {
            most_dissimilar: false,
            mean: false,
            median: false,
            negative: false,
            keep_ies: true,
        }
    }
}

impl OutputSelection {
    fn aggregate_options(&self) -> AggregateOptions {
        AggregateOptions {
            most_dissimilar: self.most_dissimilar,
            mean: self.mean,
            median: self.median,
            negative: self.negative,
        }
    }
}

/// Parameters for MESS
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MessParams {
    /// Rounding precision of reference values (reduced automatically for
    /// large values, see [`choose_scale`])
    pub digits: f64,
    pub outputs: OutputSelection,
}

impl Default for MessParams {
    fn default() -> Self {
        Self {
            digits: DEFAULT_DIGITS,
            outputs: OutputSelection::default(),
        }
    }
}

impl MessParams {
    fn validate(&self) -> Result<()> {
        if !(self.digits.is_finite() && self.digits > 0.0) {
            return Err(Error::InvalidParameter {
                name: "digits",
                value: self.digits.to_string(),
                reason: "must be a positive finite number".into(),
            });
        }
        Ok(())
    }
}

/// Named reference layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceInput {
    /// Presence raster
    Raster(String),
    /// Point layer
    Points(String),
}

impl ReferenceInput {
    pub fn name(&self) -> &str {
        match self {
            ReferenceInput::Raster(name) | ReferenceInput::Points(name) => name,
        }
    }
}

/// A validated MESS job
#[derive(Debug, Clone, PartialEq)]
pub struct MessConfig {
    pub predictors: Vec<String>,
    pub output: String,
    pub reference: ReferenceInput,
    pub params: MessParams,
}

impl MessConfig {
    /// Validate a job description.
    ///
    /// When both a reference raster and a reference point layer are given
    /// the raster is used and a warning is logged.
    pub fn new(
        predictors: Vec<String>,
        output: impl Into<String>,
        ref_rast: Option<String>,
        ref_vect: Option<String>,
        params: MessParams,
    ) -> Result<Self> {
        let output = output.into();
        if predictors.is_empty() {
            return Err(Error::Configuration("no predictor layers given".into()));
        }
        if output.trim().is_empty() {
            return Err(Error::Configuration("output name is empty".into()));
        }

        let mut seen = HashSet::new();
        for name in &predictors {
            if name.trim().is_empty() {
                return Err(Error::Configuration("empty predictor layer name".into()));
            }
            if !seen.insert(name.as_str()) {
                return Err(Error::Configuration(format!(
                    "predictor '{}' is listed more than once",
                    name
                )));
            }
        }

        let reference = match (ref_rast, ref_vect) {
            (Some(rast), Some(vect)) => {
                warn!(
                    "Both a reference raster ({}) and reference points ({}) were given; using the raster",
                    rast, vect
                );
                ReferenceInput::Raster(rast)
            }
            (Some(rast), None) => ReferenceInput::Raster(rast),
            (None, Some(vect)) => ReferenceInput::Points(vect),
            (None, None) => {
                return Err(Error::Configuration(
                    "a reference raster or reference point layer is required".into(),
                ))
            }
        };

        params.validate()?;

        Ok(Self {
            predictors,
            output,
            reference,
            params,
        })
    }

    /// Names of every layer this job writes
    pub fn output_names(&self) -> OutputNames {
        let base = &self.output;
        let sel = &self.params.outputs;
        OutputNames {
            mess: format!("{base}_MESS"),
            most_dissimilar: sel.most_dissimilar.then(|| format!("{base}_MoD")),
            mean: sel.mean.then(|| format!("{base}_mean")),
            median: sel.median.then(|| format!("{base}_median")),
            negative: sel.negative.then(|| format!("{base}_neg")),
            ies: if sel.keep_ies {
                self.predictors
                    .iter()
                    .map(|p| format!("{base}_{p}"))
                    .collect()
            } else {
                Vec::new()
            },
        }
    }
}

/// Output layer names of a job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputNames {
    pub mess: String,
    pub most_dissimilar: Option<String>,
    pub mean: Option<String>,
    pub median: Option<String>,
    pub negative: Option<String>,
    /// One per predictor, in predictor order (empty unless IES layers are kept)
    pub ies: Vec<String>,
}

impl OutputNames {
    /// All names, IES layers first
    pub fn all(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.ies.iter().map(String::as_str).collect();
        names.push(&self.mess);
        names.extend(
            [&self.most_dissimilar, &self.mean, &self.median, &self.negative]
                .into_iter()
                .flatten()
                .map(String::as_str),
        );
        names
    }
}

/// A named predictor layer
#[derive(Debug, Clone)]
pub struct Predictor {
    pub name: String,
    pub raster: Raster<f64>,
}

impl Predictor {
    pub fn new(name: impl Into<String>, raster: Raster<f64>) -> Self {
        Self {
            name: name.into(),
            raster,
        }
    }
}

/// In-memory input of [`Mess`]
#[derive(Debug, Clone)]
pub struct MessInput {
    pub predictors: Vec<Predictor>,
    pub reference: ReferenceSample,
}

/// Per-predictor result
#[derive(Debug, Clone)]
pub struct PredictorSurface {
    pub name: String,
    pub table: RecodeTable,
    pub ies: Raster<f64>,
    /// Reference point ids without a value on this predictor
    pub discarded: Vec<String>,
}

/// Output of [`Mess`]
#[derive(Debug, Clone)]
pub struct MessResult {
    /// In input order
    pub predictors: Vec<PredictorSurface>,
    pub surfaces: MessSurfaces,
}

impl MessResult {
    /// `(index, predictor name)` pairs for reading the MoD layer
    pub fn legend(&self) -> Vec<(i32, &str)> {
        self.predictors
            .iter()
            .enumerate()
            .map(|(i, p)| (i as i32, p.name.as_str()))
            .collect()
    }
}

/// Recode table and IES layer of one predictor
pub fn predictor_surface(
    name: &str,
    predictor: &Raster<f64>,
    reference: &ReferenceSample,
    digits: f64,
) -> Result<PredictorSurface> {
    predictor_surface_with(name, predictor, reference, digits, |grid, points| {
        points.sample(grid)
    })
}

/// [`predictor_surface`] with reference points sampled by `sampler`
pub fn predictor_surface_with<F>(
    name: &str,
    predictor: &Raster<f64>,
    reference: &ReferenceSample,
    digits: f64,
    sampler: F,
) -> Result<PredictorSurface>
where
    F: Fn(&Raster<f64>, &PointSet) -> Vec<Option<f64>>,
{
    let values = reference.extract_with(name, predictor, sampler)?;
    let (layer_min, layer_max) = predictor.value_range().ok_or_else(|| Error::EmptyReference {
        variable: name.to_string(),
    })?;

    let scale = choose_scale(values.min, values.max, digits);
    if scale != digits {
        warn!(
            "{}: values up to {} exceed the integer range at precision {}; using {}",
            name,
            values.min.abs().max(values.max.abs()),
            digits,
            scale
        );
    }

    let table = RecodeTable::build(&values, layer_min, layer_max, scale)?;
    debug!(
        "{}: {} reference value(s), {} recode rule(s), reference range [{}, {}]",
        name,
        table.sample_count(),
        table.rules().len(),
        table.reference_min(),
        table.reference_max()
    );
    if table.has_zero_range() {
        warn!(
            "{}: all reference values round to {}; similarity outside it is undefined",
            name,
            table.reference_min()
        );
    }

    let ies = ies_layer(predictor, &table)?;

    Ok(PredictorSurface {
        name: name.to_string(),
        table,
        ies,
        discarded: values.discarded,
    })
}

fn combine(
    predictors: Vec<PredictorSurface>,
    outputs: &OutputSelection,
) -> Result<MessResult> {
    let layers: Vec<&Raster<f64>> = predictors.iter().map(|p| &p.ies).collect();
    let surfaces = aggregate(&layers, outputs.aggregate_options())?;
    Ok(MessResult {
        predictors,
        surfaces,
    })
}

/// Multivariate environmental similarity surface
#[derive(Debug, Clone, Copy, Default)]
pub struct Mess;

impl Algorithm for Mess {
    type Input = MessInput;
    type Output = MessResult;
    type Params = MessParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "MESS"
    }

    fn description(&self) -> &'static str {
        "Multivariate environmental similarity of each cell to a reference sample"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        params.validate()?;
        if input.predictors.is_empty() {
            return Err(Error::Configuration("no predictor layers given".into()));
        }

        let MessInput {
            predictors,
            reference,
        } = input;

        let surfaces = (0..predictors.len())
            .into_par_iter()
            .map(|i| {
                let p = &predictors[i];
                predictor_surface(&p.name, &p.raster, &reference, params.digits)
            })
            .collect::<Result<Vec<_>>>()?;

        combine(surfaces, &params.outputs)
    }
}

/// Summary of a completed [`run`]
#[derive(Debug, Clone)]
pub struct MessReport {
    /// Layers written, in write order
    pub written: Vec<String>,
    /// Per predictor, reference point ids without a value
    pub discarded: Vec<(String, Vec<String>)>,
    /// MoD index to predictor name
    pub legend: Vec<(i32, String)>,
}

fn preflight<S: GridStore + ?Sized>(store: &S, config: &MessConfig, names: &OutputNames) -> Result<()> {
    for name in &config.predictors {
        if !store.grid_exists(name) {
            return Err(Error::MissingInput(name.clone()));
        }
    }

    let reference_exists = match &config.reference {
        ReferenceInput::Raster(name) => store.grid_exists(name),
        ReferenceInput::Points(name) => store.points_exist(name),
    };
    if !reference_exists {
        return Err(Error::MissingInput(config.reference.name().to_string()));
    }

    let mut planned = HashSet::new();
    for name in names.all() {
        if !planned.insert(name) {
            return Err(Error::Configuration(format!(
                "output layer '{}' would be written twice",
                name
            )));
        }
        if store.grid_exists(name) {
            return Err(Error::NameCollision(name.to_string()));
        }
    }
    Ok(())
}

fn write_outputs<S: GridStore + ?Sized>(
    store: &S,
    names: &OutputNames,
    result: &MessResult,
) -> Result<Vec<String>> {
    let s = &result.surfaces;
    let mut pending: Vec<(&str, Raster<f64>)> = Vec::new();

    for (name, p) in names.ies.iter().zip(&result.predictors) {
        pending.push((name.as_str(), p.ies.clone()));
    }
    pending.push((names.mess.as_str(), s.mess.clone()));
    if let (Some(name), Some(layer)) = (&names.most_dissimilar, &s.most_dissimilar) {
        pending.push((name.as_str(), layer.to_f64()));
    }
    if let (Some(name), Some(layer)) = (&names.mean, &s.mean) {
        pending.push((name.as_str(), layer.clone()));
    }
    if let (Some(name), Some(layer)) = (&names.median, &s.median) {
        pending.push((name.as_str(), layer.clone()));
    }
    if let (Some(name), Some(layer)) = (&names.negative, &s.negative) {
        pending.push((name.as_str(), layer.to_f64()));
    }

    let mut written: Vec<String> = Vec::with_capacity(pending.len());
    for (name, layer) in pending {
        if let Err(e) = store.write_grid(name, &layer) {
            for done in &written {
                if let Err(cleanup) = store.remove_grid(done) {
                    warn!("Could not remove partial output {}: {}", done, cleanup);
                }
            }
            return Err(e);
        }
        debug!("Wrote {}", name);
        written.push(name.to_string());
    }
    Ok(written)
}

/// Run a MESS job against a layer store.
///
/// Nothing is computed if an input is missing or an output already exists.
/// If writing fails part way, the layers already written by this run are
/// removed on a best-effort basis.
pub fn run<S: GridStore + ?Sized>(store: &S, config: &MessConfig) -> Result<MessReport> {
    let names = config.output_names();
    preflight(store, config, &names)?;

    let reference = match &config.reference {
        ReferenceInput::Raster(name) => ReferenceSample::Mask(store.read_grid(name)?),
        ReferenceInput::Points(name) => {
            let points = store.read_points(name)?;
            info!("Reference: {} point(s) from {}", points.len(), name);
            ReferenceSample::Points(points)
        }
    };

    info!("Computing similarity for {} predictor(s)", config.predictors.len());
    let digits = config.params.digits;
    let surfaces = (0..config.predictors.len())
        .into_par_iter()
        .map(|i| {
            let name = &config.predictors[i];
            let raster = store.read_grid(name)?;
            predictor_surface_with(name, &raster, &reference, digits, |grid, points| {
                store.sample_grid_at_points(grid, points)
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let result = combine(surfaces, &config.params.outputs)?;

    let legend: Vec<(i32, String)> = result
        .legend()
        .into_iter()
        .map(|(i, n)| (i, n.to_string()))
        .collect();
    if let Some(name) = &names.most_dissimilar {
        for (i, variable) in &legend {
            info!("{}: {} = {}", name, i, variable);
        }
    }

    let written = write_outputs(store, &names, &result)?;
    info!("Wrote {} layer(s)", written.len());

    let discarded = result
        .predictors
        .iter()
        .filter(|p| !p.discarded.is_empty())
        .map(|p| (p.name.clone(), p.discarded.clone()))
        .collect();

    Ok(MessReport {
        written,
        discarded,
        legend,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_config_requires_reference() {
        let err = MessConfig::new(names(&["bio1"]), "out", None, None, MessParams::default())
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_config_raster_wins_over_points() {
        let config = MessConfig::new(
            names(&["bio1"]),
            "out",
            Some("presence".into()),
            Some("occurrences".into()),
            MessParams::default(),
        )
        .unwrap();
        assert_eq!(config.reference, ReferenceInput::Raster("presence".into()));
    }

    #[test]
    fn test_config_rejects_bad_input() {
        let p = MessParams::default();
        let vect = || Some("occ".to_string());
        assert!(MessConfig::new(vec![], "out", None, vect(), p).is_err());
        assert!(MessConfig::new(names(&["a", "a"]), "out", None, vect(), p).is_err());
        assert!(MessConfig::new(names(&["a"]), " ", None, vect(), p).is_err());

        let bad_digits = MessParams { digits: 0.0, ..p };
        assert!(matches!(
            MessConfig::new(names(&["a"]), "out", None, vect(), bad_digits),
            Err(Error::InvalidParameter { name: "digits", .. })
        ));
    }

    #[test]
    fn test_output_names() {
        let params = MessParams {
            outputs: OutputSelection {
                most_dissimilar: true,
                median: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let config =
            MessConfig::new(names(&["bio1", "bio12"]), "sim", None, Some("occ".into()), params)
                .unwrap();
        let out = config.output_names();

        assert_eq!(out.mess, "sim_MESS");
        assert_eq!(out.most_dissimilar.as_deref(), Some("sim_MoD"));
        assert_eq!(out.median.as_deref(), Some("sim_median"));
        assert!(out.mean.is_none());
        assert_eq!(out.ies, names(&["sim_bio1", "sim_bio12"]));
        assert_eq!(
            out.all(),
            vec!["sim_bio1", "sim_bio12", "sim_MESS", "sim_MoD", "sim_median"]
        );
    }

    #[test]
    fn test_output_names_without_ies() {
        let params = MessParams {
            outputs: OutputSelection {
                keep_ies: false,
                ..Default::default()
            },
            ..Default::default()
        };
        let config =
            MessConfig::new(names(&["bio1"]), "sim", Some("mask".into()), None, params).unwrap();
        assert_eq!(config.output_names().all(), vec!["sim_MESS"]);
    }
}
