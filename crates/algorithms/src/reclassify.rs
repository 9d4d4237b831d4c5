//! Raster reclassification
//!
//! Maps cell values to class values through a table of sorted, contiguous
//! value ranges. This is the recode primitive the similarity surfaces use to
//! turn raw predictor values into reference percentiles.

use crate::maybe_rayon::*;
use ndarray::Array2;
use mess_core::raster::Raster;
use mess_core::{Error, Result};

/// A reclassification entry mapping an input range to an output value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReclassEntry {
    /// Minimum value (inclusive)
    pub min: f64,
    /// Maximum value (exclusive, except for the last class)
    pub max: f64,
    /// Output value for this class
    pub value: f64,
}

impl ReclassEntry {
    /// Create a new reclassification entry
    pub fn new(min: f64, max: f64, value: f64) -> Self {
        Self { min, max, value }
    }
}

/// Parameters for reclassification
#[derive(Debug, Clone)]
pub struct ReclassifyParams {
    /// Reclassification table, sorted by `min` with non-overlapping ranges
    pub classes: Vec<ReclassEntry>,
    /// Value for cells that don't match any class
    pub default_value: f64,
}

impl Default for ReclassifyParams {
    fn default() -> Self {
        Self {
            classes: Vec::new(),
            default_value: f64::NAN,
        }
    }
}

impl ReclassifyParams {
    /// Class value for a single input value.
    ///
    /// The matching entry is the last one whose `min <= value`, so an empty
    /// range `[a, a)` followed by `[a, b)` resolves to the latter.
    pub fn classify(&self, value: f64) -> f64 {
        let classes = &self.classes;
        let idx = classes.partition_point(|e| e.min <= value);
        if idx == 0 {
            return self.default_value;
        }

        let entry = &classes[idx - 1];
        if value < entry.max {
            return entry.value;
        }

        // Last class includes its max value
        if idx == classes.len() && (value - entry.max).abs() < 1e-10 {
            return entry.value;
        }

        self.default_value
    }

    fn validate(&self) -> Result<()> {
        for pair in self.classes.windows(2) {
            if pair[1].min < pair[0].min || pair[1].min < pair[0].max {
                return Err(Error::InvalidParameter {
                    name: "classes",
                    value: format!("[{}, {}) then [{}, {})", pair[0].min, pair[0].max, pair[1].min, pair[1].max),
                    reason: "classes must be sorted and non-overlapping".into(),
                });
            }
        }
        Ok(())
    }
}

/// Reclassify raster values based on a classification table.
///
/// Each valid cell gets the value of the class whose range `[min, max)`
/// contains it; no-data cells stay NaN.
///
/// # Example
/// ```ignore
/// let params = ReclassifyParams {
///     classes: vec![
///         ReclassEntry::new(0.0, 10.0, 25.0),
///         ReclassEntry::new(10.0, 20.0, 100.0),
///     ],
///     default_value: f64::NAN,
/// };
/// let percentiles = reclassify(&temperature, &params)?;
/// ```
pub fn reclassify(raster: &Raster<f64>, params: &ReclassifyParams) -> Result<Raster<f64>> {
    params.validate()?;

    let (rows, cols) = raster.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                // SAFETY: row < rows and col < cols
                let val = unsafe { raster.get_unchecked(row, col) };
                if !raster.is_nodata(val) {
                    *out = params.classify(val);
                }
            }
            row_data
        })
        .collect();

    let mut output = raster.with_same_meta::<f64>();
    *output.data_mut() =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mess_core::GeoTransform;

    fn make_raster() -> Raster<f64> {
        let values = vec![
            -5.0, 0.0, 4.9,
            5.0, 7.5, 10.0,
            f64::NAN, 2.0, 11.0,
        ];
        let mut r = Raster::from_vec(values, 3, 3).unwrap();
        r.set_transform(GeoTransform::new(0.0, 3.0, 1.0, -1.0));
        r
    }

    fn classes() -> ReclassifyParams {
        ReclassifyParams {
            classes: vec![
                ReclassEntry::new(0.0, 5.0, 1.0),
                ReclassEntry::new(5.0, 10.0, 2.0),
            ],
            default_value: -1.0,
        }
    }

    #[test]
    fn test_reclassify_ranges() {
        let result = reclassify(&make_raster(), &classes()).unwrap();

        assert_eq!(result.get(0, 1).unwrap(), 1.0);
        assert_eq!(result.get(0, 2).unwrap(), 1.0);
        assert_eq!(result.get(1, 0).unwrap(), 2.0);
        assert_eq!(result.get(1, 1).unwrap(), 2.0);
    }

    #[test]
    fn test_last_class_includes_max() {
        let result = reclassify(&make_raster(), &classes()).unwrap();
        assert_eq!(result.get(1, 2).unwrap(), 2.0);
    }

    #[test]
    fn test_unmatched_gets_default() {
        let result = reclassify(&make_raster(), &classes()).unwrap();
        assert_eq!(result.get(0, 0).unwrap(), -1.0);
        assert_eq!(result.get(2, 2).unwrap(), -1.0);
    }

    #[test]
    fn test_reclassify_nodata() {
        let result = reclassify(&make_raster(), &classes()).unwrap();
        assert!(result.get(2, 0).unwrap().is_nan());
    }

    #[test]
    fn test_empty_range_resolves_to_next_class() {
        let params = ReclassifyParams {
            classes: vec![
                ReclassEntry::new(3.0, 3.0, 0.0),
                ReclassEntry::new(3.0, 6.0, 50.0),
                ReclassEntry::new(6.0, 9.0, 100.0),
            ],
            default_value: f64::NAN,
        };
        assert_eq!(params.classify(3.0), 50.0);
        assert_eq!(params.classify(6.0), 100.0);
        assert_eq!(params.classify(9.0), 100.0);
        assert!(params.classify(2.9).is_nan());
    }

    #[test]
    fn test_overlapping_classes_rejected() {
        let params = ReclassifyParams {
            classes: vec![
                ReclassEntry::new(0.0, 5.0, 1.0),
                ReclassEntry::new(4.0, 10.0, 2.0),
            ],
            default_value: 0.0,
        };
        assert!(matches!(
            reclassify(&make_raster(), &params),
            Err(Error::InvalidParameter { .. })
        ));
    }
}
