//! Main Raster type

use crate::error::{Error, Result};
use crate::raster::{GeoTransform, RasterElement};
use ndarray::Array2;

/// A georeferenced 2D raster grid.
///
/// `Raster<T>` stores values of type `T` in a 2D grid with an affine
/// transform and an optional no-data value.
///
/// # Example
///
/// ```ignore
/// use mess_core::Raster;
///
/// let mut raster: Raster<f64> = Raster::new(3, 3);
/// raster.set(1, 1, 42.0)?;
/// assert_eq!(raster.get(1, 1)?, 42.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Raster<T: RasterElement> {
    /// Raster data stored in row-major order (row, col)
    data: Array2<T>,
    /// Affine transformation
    transform: GeoTransform,
    /// No-data value
    nodata: Option<T>,
}

impl<T: RasterElement> Raster<T> {
    /// Create a new raster filled with zeros
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::from_array(Array2::zeros((rows, cols)))
    }

    /// Create a new raster filled with a specific value
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self::from_array(Array2::from_elem((rows, cols), value))
    }

    /// Create a raster from row-major data
    pub fn from_vec(data: Vec<T>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }

        let array = Array2::from_shape_vec((rows, cols), data)
            .map_err(|e| Error::Other(e.to_string()))?;

        Ok(Self::from_array(array))
    }

    /// Create a raster from an ndarray
    pub fn from_array(data: Array2<T>) -> Self {
        Self {
            data,
            transform: GeoTransform::default(),
            nodata: None,
        }
    }

    /// Create a raster of another cell type sharing this raster's transform,
    /// filled with that type's no-data value.
    pub fn with_same_meta<U: RasterElement>(&self) -> Raster<U> {
        Raster {
            data: Array2::from_elem(self.data.dim(), U::default_nodata()),
            transform: self.transform,
            nodata: Some(U::default_nodata()),
        }
    }

    // Dimensions

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the raster is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Fail with [`Error::SizeMismatch`] unless `other` has this raster's shape
    pub fn ensure_same_shape<U: RasterElement>(&self, other: &Raster<U>) -> Result<()> {
        let (er, ec) = self.shape();
        let (ar, ac) = other.shape();
        if er != ar || ec != ac {
            return Err(Error::SizeMismatch { er, ec, ar, ac });
        }
        Ok(())
    }

    // Data access

    /// Get value at (row, col)
    pub fn get(&self, row: usize, col: usize) -> Result<T> {
        self.data
            .get((row, col))
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            })
    }

    /// Get value at (row, col) without bounds checking
    ///
    /// # Safety
    /// Caller must ensure row < self.rows() and col < self.cols()
    pub unsafe fn get_unchecked(&self, row: usize, col: usize) -> T {
        unsafe { *self.data.uget((row, col)) }
    }

    /// Set value at (row, col)
    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        if row >= self.rows() || col >= self.cols() {
            return Err(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        self.data[(row, col)] = value;
        Ok(())
    }

    /// Value of the cell containing geographic location (x, y).
    ///
    /// `None` when the location is outside the grid or the cell is no-data.
    pub fn value_at(&self, x: f64, y: f64) -> Option<T> {
        let (row, col) = self.transform.cell_at(x, y, self.rows(), self.cols())?;
        let value = self.data[(row, col)];
        (!self.is_nodata(value)).then_some(value)
    }

    /// Get a reference to the underlying array
    pub fn data(&self) -> &Array2<T> {
        &self.data
    }

    /// Get a mutable reference to the underlying array
    pub fn data_mut(&mut self) -> &mut Array2<T> {
        &mut self.data
    }

    /// Iterate over valid (non-nodata) cell values
    pub fn valid_values(&self) -> impl Iterator<Item = T> + '_ {
        self.data.iter().copied().filter(move |v| !self.is_nodata(*v))
    }

    // Metadata

    /// Get the geotransform
    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    /// Set the geotransform
    pub fn set_transform(&mut self, transform: GeoTransform) {
        self.transform = transform;
    }

    /// Get the no-data value
    pub fn nodata(&self) -> Option<T> {
        self.nodata
    }

    /// Set the no-data value
    pub fn set_nodata(&mut self, nodata: Option<T>) {
        self.nodata = nodata;
    }

    /// Check if a value is no-data
    pub fn is_nodata(&self, value: T) -> bool {
        value.is_nodata(self.nodata)
    }

    /// Copy of this raster as `f64`, with no-data cells set to NaN
    pub fn to_f64(&self) -> Raster<f64> {
        let data = self.data.mapv(|v| {
            if self.is_nodata(v) {
                f64::NAN
            } else {
                v.to_f64().unwrap_or(f64::NAN)
            }
        });
        Raster {
            data,
            transform: self.transform,
            nodata: Some(f64::NAN),
        }
    }

    // Statistics

    /// Minimum and maximum over valid cells, `None` if no cell has data
    pub fn value_range(&self) -> Option<(T, T)> {
        self.valid_values().fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((
                if v < lo { v } else { lo },
                if v > hi { v } else { hi },
            )),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raster_creation() {
        let raster: Raster<f64> = Raster::new(100, 200);
        assert_eq!(raster.rows(), 100);
        assert_eq!(raster.cols(), 200);
        assert_eq!(raster.shape(), (100, 200));
    }

    #[test]
    fn test_raster_access() {
        let mut raster: Raster<f64> = Raster::new(10, 10);
        raster.set(5, 5, 42.0).unwrap();
        assert_eq!(raster.get(5, 5).unwrap(), 42.0);
        assert!(raster.set(10, 0, 1.0).is_err());
    }

    #[test]
    fn test_value_range_all_nodata() {
        let raster: Raster<f64> = Raster::filled(2, 2, f64::NAN);
        assert!(raster.value_range().is_none());
    }

    #[test]
    fn test_value_at() {
        let mut raster = Raster::from_vec((0..9).map(f64::from).collect(), 3, 3).unwrap();
        raster.set_transform(GeoTransform::new(0.0, 3.0, 1.0, -1.0));
        raster.set(2, 2, f64::NAN).unwrap();

        assert_eq!(raster.value_at(0.5, 2.5), Some(0.0));
        assert_eq!(raster.value_at(1.5, 1.5), Some(4.0));
        assert_eq!(raster.value_at(2.5, 0.5), None);
        assert_eq!(raster.value_at(4.0, 1.0), None);
    }

    #[test]
    fn test_to_f64_maps_nodata_to_nan() {
        let mut index: Raster<i32> = Raster::filled(1, 3, 1);
        index.set_nodata(Some(-1));
        index.set(0, 1, -1).unwrap();

        let out = index.to_f64();
        assert_eq!(out.get(0, 0).unwrap(), 1.0);
        assert!(out.get(0, 1).unwrap().is_nan());
    }

    #[test]
    fn test_shape_mismatch() {
        let a: Raster<f64> = Raster::new(2, 3);
        let b: Raster<u8> = Raster::new(3, 2);
        assert!(matches!(a.ensure_same_shape(&b), Err(Error::SizeMismatch { .. })));
    }
}
