//! Reference value extraction
//!
//! Collects, for one predictor, the values observed at the reference
//! locations: either every cell of a presence mask or the cells containing
//! a set of reference points.

use mess_core::raster::Raster;
use mess_core::vector::PointSet;
use mess_core::{Error, Result};
use tracing::warn;

/// Locations describing the reference environment
#[derive(Debug, Clone)]
pub enum ReferenceSample {
    /// Raster whose non-zero, non-nodata cells are reference cells
    Mask(Raster<f64>),
    /// Reference point locations
    Points(PointSet),
}

/// Predictor values observed at the reference locations
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceValues {
    /// Raw sampled values, in cell (mask) or point order
    pub values: Vec<f64>,
    pub min: f64,
    pub max: f64,
    /// Ids of reference points that had no value on this predictor
    pub discarded: Vec<String>,
}

impl ReferenceValues {
    fn from_values(variable: &str, values: Vec<f64>, discarded: Vec<String>) -> Result<Self> {
        if values.is_empty() {
            return Err(Error::EmptyReference {
                variable: variable.to_string(),
            });
        }
        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        Ok(Self {
            values,
            min,
            max,
            discarded,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ReferenceSample {
    /// Reference values of `predictor` (named `variable` in messages)
    pub fn extract(&self, variable: &str, predictor: &Raster<f64>) -> Result<ReferenceValues> {
        self.extract_with(variable, predictor, |grid, points| points.sample(grid))
    }

    /// Like [`extract`](Self::extract), with points sampled by `sampler`
    /// (usually [`GridStore::sample_grid_at_points`](mess_core::GridStore::sample_grid_at_points))
    pub fn extract_with<F>(
        &self,
        variable: &str,
        predictor: &Raster<f64>,
        sampler: F,
    ) -> Result<ReferenceValues>
    where
        F: Fn(&Raster<f64>, &PointSet) -> Vec<Option<f64>>,
    {
        match self {
            ReferenceSample::Mask(mask) => extract_from_mask(variable, predictor, mask),
            ReferenceSample::Points(points) => {
                extract_from_points(variable, points, &sampler(predictor, points))
            }
        }
    }
}

/// Predictor values under every reference cell of `mask`.
///
/// Cells where the predictor has no data are skipped.
pub fn extract_from_mask(
    variable: &str,
    predictor: &Raster<f64>,
    mask: &Raster<f64>,
) -> Result<ReferenceValues> {
    predictor.ensure_same_shape(mask)?;

    let values: Vec<f64> = predictor
        .data()
        .iter()
        .zip(mask.data().iter())
        .filter(|&(&v, &m)| !mask.is_nodata(m) && m != 0.0 && !predictor.is_nodata(v))
        .map(|(&v, _)| v)
        .collect();

    ReferenceValues::from_values(variable, values, Vec::new())
}

/// Reference values from the predictor `samples` taken at each point.
///
/// Points without a sample (outside the grid or on no-data cells) are
/// dropped and reported with a warning; the remaining points are used.
pub fn extract_from_points(
    variable: &str,
    points: &PointSet,
    samples: &[Option<f64>],
) -> Result<ReferenceValues> {
    if samples.len() != points.len() {
        return Err(Error::External(format!(
            "{}: {} sample(s) returned for {} reference point(s)",
            variable,
            samples.len(),
            points.len()
        )));
    }

    let mut values = Vec::with_capacity(points.len());
    let mut discarded = Vec::new();

    for (point, sample) in points.iter().zip(samples) {
        match sample {
            Some(v) if !v.is_nan() => values.push(*v),
            _ => discarded.push(point.id.clone()),
        }
    }

    if !discarded.is_empty() {
        warn!(
            "{}: {} of {} reference point(s) have no value and were ignored (ids: {})",
            variable,
            discarded.len(),
            points.len(),
            discarded.join(", ")
        );
    }

    ReferenceValues::from_values(variable, values, discarded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mess_core::vector::ReferencePoint;
    use mess_core::GeoTransform;

    fn predictor() -> Raster<f64> {
        let mut r = Raster::from_vec(vec![1.0, 2.0, 3.0, 4.0, f64::NAN, 6.0, 7.0, 8.0, 9.0], 3, 3)
            .unwrap();
        r.set_transform(GeoTransform::new(0.0, 30.0, 10.0, -10.0));
        r
    }

    #[test]
    fn test_mask_extraction() {
        let mask = Raster::from_vec(
            vec![1.0, 0.0, 1.0, f64::NAN, 1.0, 0.0, 0.0, 2.0, 0.0],
            3,
            3,
        )
        .unwrap();

        let rv = extract_from_mask("bio1", &predictor(), &mask).unwrap();
        // (1,1) is nodata on the predictor, (1,0) nodata on the mask
        assert_eq!(rv.values, vec![1.0, 3.0, 8.0]);
        assert_eq!((rv.min, rv.max), (1.0, 8.0));
        assert!(rv.discarded.is_empty());
    }

    #[test]
    fn test_mask_shape_mismatch() {
        let mask: Raster<f64> = Raster::filled(2, 2, 1.0);
        assert!(matches!(
            extract_from_mask("bio1", &predictor(), &mask),
            Err(Error::SizeMismatch { .. })
        ));
    }

    #[test]
    fn test_empty_mask_is_error() {
        let mask: Raster<f64> = Raster::filled(3, 3, 0.0);
        assert!(matches!(
            extract_from_mask("bio1", &predictor(), &mask),
            Err(Error::EmptyReference { .. })
        ));
    }

    #[test]
    fn test_points_outside_extent_discarded() {
        let mut points = PointSet::new();
        points.push(ReferencePoint::new("a", 5.0, 25.0));
        points.push(ReferencePoint::new("far", 500.0, 25.0));
        points.push(ReferencePoint::new("b", 25.0, 5.0));
        points.push(ReferencePoint::new("hole", 15.0, 15.0));

        let rv = extract_from_points("bio1", &points, &points.sample(&predictor())).unwrap();
        assert_eq!(rv.values, vec![1.0, 9.0]);
        assert_eq!(rv.discarded, vec!["far".to_string(), "hole".to_string()]);
        assert_eq!((rv.min, rv.max), (1.0, 9.0));
    }

    #[test]
    fn test_all_points_outside_is_error() {
        let points = PointSet::from_coords(&[(-10.0, -10.0), (100.0, 100.0)]);
        let err = ReferenceSample::Points(points).extract("bio1", &predictor()).unwrap_err();
        assert!(matches!(err, Error::EmptyReference { variable } if variable == "bio1"));
    }

    #[test]
    fn test_custom_sampler_is_used() {
        let points = PointSet::from_coords(&[(5.0, 25.0), (25.0, 5.0)]);
        let sample = ReferenceSample::Points(points);

        let rv = sample
            .extract_with("bio1", &predictor(), |_, _| vec![Some(42.0), None])
            .unwrap();
        assert_eq!(rv.values, vec![42.0]);
        assert_eq!(rv.discarded, vec!["2".to_string()]);

        let short = sample.extract_with("bio1", &predictor(), |_, _| vec![Some(1.0)]);
        assert!(matches!(short, Err(Error::External(_))));
    }
}
