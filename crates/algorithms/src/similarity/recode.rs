//! Recode table: empirical CDF of the reference values
//!
//! With sorted unique reference values `u0 < u1 < ... < u(n-1)` and layer
//! range `[Dmin, Dmax]`, the table has `n + 1` rules:
//!
//! ```text
//! [Dmin,   u0)     -> 0
//! [u0,     u1)     -> cum%(u0)
//! ...
//! [u(n-1), Dmax]   -> cum%(u(n-1)) = 100
//! ```
//!
//! where `cum%(u)` is the percentage of reference samples `<= u`.

use super::reference::ReferenceValues;
use super::scale::quantize;
use crate::reclassify::{reclassify, ReclassEntry, ReclassifyParams};
use mess_core::raster::Raster;
use mess_core::{Error, Result};
use std::collections::BTreeMap;

/// One recode rule: bucket keys in `[lower, upper)` map to `percentile`.
///
/// Bounds are bucket keys `round(v / scale)`, not raw values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecodeRule {
    pub lower: i64,
    pub upper: i64,
    pub percentile: f64,
}

/// Per-predictor percentile lookup built from reference values
#[derive(Debug, Clone)]
pub struct RecodeTable {
    rules: Vec<RecodeRule>,
    classes: ReclassifyParams,
    min_key: i64,
    max_key: i64,
    scale: f64,
    sample_count: usize,
}

impl RecodeTable {
    /// Build the table from reference values rounded to `scale`.
    ///
    /// `layer_min` / `layer_max` are the predictor's global range; they are
    /// widened when rounding moves a reference value outside it.
    pub fn build(
        reference: &ReferenceValues,
        layer_min: f64,
        layer_max: f64,
        scale: f64,
    ) -> Result<Self> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(Error::InvalidParameter {
                name: "scale",
                value: scale.to_string(),
                reason: "must be a positive finite number".into(),
            });
        }
        if !(layer_min.is_finite() && layer_max.is_finite()) || layer_min > layer_max {
            return Err(Error::InvalidParameter {
                name: "layer range",
                value: format!("[{}, {}]", layer_min, layer_max),
                reason: "layer range must be finite and ordered".into(),
            });
        }

        // Bucket keys fit in i64: choose_scale keeps them within i32
        let mut frequencies: BTreeMap<i64, usize> = BTreeMap::new();
        for &v in &reference.values {
            *frequencies.entry(quantize(v, scale) as i64).or_default() += 1;
        }
        let total = reference.values.len();
        let unique: Vec<(i64, usize)> = frequencies.into_iter().collect();
        let (min_key, max_key) = match (unique.first(), unique.last()) {
            (Some(&(lo, _)), Some(&(hi, _))) => (lo, hi),
            _ => return Err(Error::Algorithm("reference values are empty".into())),
        };

        let mut rules = Vec::with_capacity(unique.len() + 1);
        rules.push(RecodeRule {
            lower: (quantize(layer_min, scale) as i64).min(min_key),
            upper: min_key,
            percentile: 0.0,
        });

        let mut cumulative = 0usize;
        for (k, &(key, count)) in unique.iter().enumerate() {
            cumulative += count;
            let upper = match unique.get(k + 1) {
                Some(&(next, _)) => next,
                None => (quantize(layer_max, scale) as i64).max(max_key),
            };
            rules.push(RecodeRule {
                lower: key,
                upper,
                percentile: (cumulative as f64 * 100.0) / total as f64,
            });
        }

        let classes = ReclassifyParams {
            classes: rules
                .iter()
                .map(|r| ReclassEntry::new(r.lower as f64, r.upper as f64, r.percentile))
                .collect(),
            default_value: f64::NAN,
        };

        Ok(Self {
            rules,
            classes,
            min_key,
            max_key,
            scale,
            sample_count: total,
        })
    }

    pub fn rules(&self) -> &[RecodeRule] {
        &self.rules
    }

    /// Smallest rounded reference value, in raw units
    pub fn reference_min(&self) -> f64 {
        self.min_key as f64 * self.scale
    }

    /// Largest rounded reference value, in raw units
    pub fn reference_max(&self) -> f64 {
        self.max_key as f64 * self.scale
    }

    /// Rounding scale the table was built with
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Number of reference samples behind the table
    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Whether the reference range collapses to a single bucket, which
    /// leaves the extrapolation branches of the similarity undefined
    pub fn has_zero_range(&self) -> bool {
        self.min_key == self.max_key
    }

    /// Percentile of a single raw value (NaN outside the layer range)
    pub fn percentile_of(&self, value: f64) -> f64 {
        if value.is_nan() {
            return f64::NAN;
        }
        self.classes.classify(quantize(value, self.scale))
    }

    /// Percentile layer for `predictor`
    pub fn percentiles(&self, predictor: &Raster<f64>) -> Result<Raster<f64>> {
        let mut keys = predictor.to_f64();
        let scale = self.scale;
        keys.data_mut().mapv_inplace(|v| quantize(v, scale));
        reclassify(&keys, &self.classes)
    }
}
