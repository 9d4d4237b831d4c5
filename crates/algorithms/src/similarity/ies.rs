//! Individual environmental similarity (IES)
//!
//! Elith et al. (2010): with `p` the reference percentile of a cell value,
//! similarity is `2p` up to the median and `2(100 - p)` above it. Outside the
//! reference range it extrapolates linearly and turns negative.

use super::recode::RecodeTable;
use super::scale::quantize;
use crate::maybe_rayon::*;
use mess_core::raster::Raster;
use mess_core::{Error, Result};
use ndarray::Array2;

/// Similarity of raw value `v` with percentile `p`.
///
/// `rmin`/`rmax` are the reference range and `scale` the rounding divisor;
/// the extrapolation branches work on `round(x / scale)`. NaN when `v` or
/// `p` is NaN, or when an extrapolation is needed over a zero range.
pub fn similarity(v: f64, p: f64, rmin: f64, rmax: f64, scale: f64) -> f64 {
    if v.is_nan() || p.is_nan() {
        return f64::NAN;
    }

    if p > 0.0 && p <= 50.0 {
        return 2.0 * p;
    }
    if p > 50.0 && p < 100.0 {
        return 2.0 * (100.0 - p);
    }

    let (qv, qmin, qmax) = (quantize(v, scale), quantize(rmin, scale), quantize(rmax, scale));
    let range = qmax - qmin;
    if range == 0.0 {
        return f64::NAN;
    }

    if p <= 0.0 {
        (qv - qmin) / range * 100.0
    } else {
        (qmax - qv) / range * 100.0
    }
}

/// IES layer of `predictor` against its recode table
pub fn ies_layer(predictor: &Raster<f64>, table: &RecodeTable) -> Result<Raster<f64>> {
    let percentiles = table.percentiles(predictor)?;
    let (rmin, rmax, scale) = (table.reference_min(), table.reference_max(), table.scale());
    let (rows, cols) = predictor.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                // SAFETY: percentiles has the predictor's shape
                let v = unsafe { predictor.get_unchecked(row, col) };
                if predictor.is_nodata(v) {
                    continue;
                }
                let p = unsafe { percentiles.get_unchecked(row, col) };
                *out = similarity(v, p, rmin, rmax, scale);
            }
            row_data
        })
        .collect();

    let mut output = predictor.with_same_meta::<f64>();
    *output.data_mut() =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    Ok(output)
}
