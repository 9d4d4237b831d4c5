//! Combination of IES layers
//!
//! Per cell, over the IES values that are not NaN:
//! - MESS: minimum
//! - MoD: index of the layer holding the minimum (first index on ties)
//! - mean and median
//! - negative mask: 1 where MESS < 0

use crate::maybe_rayon::*;
use mess_core::raster::Raster;
use mess_core::{Error, Result};
use ndarray::Array2;

/// Which derived layers to compute besides MESS
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateOptions {
    pub most_dissimilar: bool,
    pub mean: bool,
    pub median: bool,
    pub negative: bool,
}

/// MESS layer and the derived layers that were requested
#[derive(Debug, Clone)]
pub struct MessSurfaces {
    pub mess: Raster<f64>,
    /// Index of the limiting layer; nodata `-1`
    pub most_dissimilar: Option<Raster<i32>>,
    pub mean: Option<Raster<f64>>,
    pub median: Option<Raster<f64>>,
    /// `1` where MESS < 0; nodata `0`
    pub negative: Option<Raster<u8>>,
}

/// Minimum and its first index over the non-NaN values
pub fn min_with_index(values: &[f64]) -> Option<(f64, usize)> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .fold(None, |best, (i, &v)| match best {
            Some((b, _)) if b <= v => best,
            _ => Some((v, i)),
        })
}

/// Mean of the non-NaN values, NaN if there are none
pub fn nan_mean(values: &[f64]) -> f64 {
    let (sum, n) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        f64::NAN
    } else {
        sum / n as f64
    }
}

/// Median of the non-NaN values, NaN if there are none
pub fn nan_median(values: &[f64]) -> f64 {
    let mut vals: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if vals.is_empty() {
        return f64::NAN;
    }
    vals.sort_by(f64::total_cmp);
    let n = vals.len();
    if n % 2 == 0 {
        (vals[n / 2 - 1] + vals[n / 2]) / 2.0
    } else {
        vals[n / 2]
    }
}

/// Apply `f` to the stack of layer values at every cell, row-parallel
fn reduce_cells<T, F>(layers: &[&Raster<f64>], f: F) -> Result<Array2<T>>
where
    T: Send + Copy,
    F: Fn(&[f64]) -> T + Sync,
{
    let (rows, cols) = layers[0].shape();

    let data: Vec<T> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut stack = vec![0.0; layers.len()];
            let mut row_data = Vec::with_capacity(cols);
            for col in 0..cols {
                for (slot, layer) in stack.iter_mut().zip(layers) {
                    // SAFETY: every layer was checked to be rows x cols
                    let v = unsafe { layer.get_unchecked(row, col) };
                    *slot = if layer.is_nodata(v) { f64::NAN } else { v };
                }
                row_data.push(f(&stack));
            }
            row_data
        })
        .collect();

    Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))
}

/// Combine IES layers (in predictor order) into the MESS surfaces
pub fn aggregate(layers: &[&Raster<f64>], options: AggregateOptions) -> Result<MessSurfaces> {
    let first = *layers.first().ok_or_else(|| Error::InvalidParameter {
        name: "layers",
        value: "0".into(),
        reason: "at least one IES layer is required".into(),
    })?;
    for layer in &layers[1..] {
        first.ensure_same_shape(*layer)?;
    }

    let minima = reduce_cells(layers, |stack| {
        min_with_index(stack).map_or((f64::NAN, -1), |(v, i)| (v, i as i32))
    })?;

    let mut mess = first.with_same_meta::<f64>();
    *mess.data_mut() = minima.mapv(|(v, _)| v);

    let most_dissimilar = options.most_dissimilar.then(|| {
        let mut mod_layer = first.with_same_meta::<i32>();
        *mod_layer.data_mut() = minima.mapv(|(_, i)| i);
        mod_layer
    });

    let mean = if options.mean {
        let mut layer = first.with_same_meta::<f64>();
        *layer.data_mut() = reduce_cells(layers, nan_mean)?;
        Some(layer)
    } else {
        None
    };

    let median = if options.median {
        let mut layer = first.with_same_meta::<f64>();
        *layer.data_mut() = reduce_cells(layers, nan_median)?;
        Some(layer)
    } else {
        None
    };

    let negative = options.negative.then(|| negative_mask(&mess));

    Ok(MessSurfaces {
        mess,
        most_dissimilar,
        mean,
        median,
        negative,
    })
}

/// Cells where `mess` is negative
pub fn negative_mask(mess: &Raster<f64>) -> Raster<u8> {
    let mut mask = mess.with_same_meta::<u8>();
    *mask.data_mut() = mess.data().mapv(|v| u8::from(v < 0.0));
    mask
}
