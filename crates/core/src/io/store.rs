//! Named-layer storage
//!
//! The MESS engine addresses rasters and point sets by name, the way a GIS
//! session does. [`GridStore`] is that seam; [`DirectoryStore`] keeps layers
//! as files in one directory and [`MemoryStore`] keeps them in memory.

use super::native::{read_geotiff, write_geotiff};
use super::points::read_points_csv;
use crate::error::{Error, Result};
use crate::raster::Raster;
use crate::vector::PointSet;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Storage backend for predictor, reference and output layers
pub trait GridStore: Sync {
    /// Read a raster layer
    fn read_grid(&self, name: &str) -> Result<Raster<f64>>;

    /// Read a point layer
    fn read_points(&self, name: &str) -> Result<PointSet>;

    /// Write (create or replace) a raster layer
    fn write_grid(&self, name: &str, raster: &Raster<f64>) -> Result<()>;

    /// Whether a raster layer with this name exists
    fn grid_exists(&self, name: &str) -> bool;

    /// Whether a point layer with this name exists
    fn points_exist(&self, name: &str) -> bool;

    /// Delete a raster layer
    fn remove_grid(&self, name: &str) -> Result<()>;

    /// Sample `grid` at every point; `None` for points outside the grid or on no-data
    fn sample_grid_at_points(&self, grid: &Raster<f64>, points: &PointSet) -> Vec<Option<f64>> {
        points.sample(grid)
    }
}

fn check_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\']);
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidParameter {
            name: "layer",
            value: name.to_string(),
            reason: "layer names must be non-empty and contain no path separators".into(),
        })
    }
}

/// Layers stored as `<root>/<name>.tif` (rasters) and `<root>/<name>.csv` (points)
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing a raster layer
    pub fn grid_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.tif"))
    }

    /// File backing a point layer
    pub fn points_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.csv"))
    }
}

impl GridStore for DirectoryStore {
    fn read_grid(&self, name: &str) -> Result<Raster<f64>> {
        check_name(name)?;
        let path = self.grid_path(name);
        if !path.is_file() {
            return Err(Error::MissingInput(name.to_string()));
        }
        read_geotiff(path)
    }

    fn read_points(&self, name: &str) -> Result<PointSet> {
        check_name(name)?;
        let path = self.points_path(name);
        if !path.is_file() {
            return Err(Error::MissingInput(name.to_string()));
        }
        read_points_csv(path)
    }

    fn write_grid(&self, name: &str, raster: &Raster<f64>) -> Result<()> {
        check_name(name)?;
        write_geotiff(raster, self.grid_path(name))
    }

    fn grid_exists(&self, name: &str) -> bool {
        check_name(name).is_ok() && self.grid_path(name).is_file()
    }

    fn points_exist(&self, name: &str) -> bool {
        check_name(name).is_ok() && self.points_path(name).is_file()
    }

    fn remove_grid(&self, name: &str) -> Result<()> {
        check_name(name)?;
        std::fs::remove_file(self.grid_path(name))?;
        Ok(())
    }
}

/// In-memory layer store
#[derive(Debug, Default)]
pub struct MemoryStore {
    grids: RwLock<HashMap<String, Raster<f64>>>,
    points: RwLock<HashMap<String, PointSet>>,
}

fn poisoned<T>(_: T) -> Error {
    Error::External("memory store lock poisoned".into())
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a raster layer, replacing any layer of the same name
    pub fn insert_grid(&self, name: impl Into<String>, raster: Raster<f64>) {
        if let Ok(mut grids) = self.grids.write() {
            grids.insert(name.into(), raster);
        }
    }

    /// Add a point layer, replacing any layer of the same name
    pub fn insert_points(&self, name: impl Into<String>, points: PointSet) {
        if let Ok(mut sets) = self.points.write() {
            sets.insert(name.into(), points);
        }
    }

    /// Names of all raster layers, sorted
    pub fn grid_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .grids
            .read()
            .map(|g| g.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }
}

impl GridStore for MemoryStore {
    fn read_grid(&self, name: &str) -> Result<Raster<f64>> {
        self.grids
            .read()
            .map_err(poisoned)?
            .get(name)
            .cloned()
            .ok_or_else(|| Error::MissingInput(name.to_string()))
    }

    fn read_points(&self, name: &str) -> Result<PointSet> {
        self.points
            .read()
            .map_err(poisoned)?
            .get(name)
            .cloned()
            .ok_or_else(|| Error::MissingInput(name.to_string()))
    }

    fn write_grid(&self, name: &str, raster: &Raster<f64>) -> Result<()> {
        check_name(name)?;
        self.grids
            .write()
            .map_err(poisoned)?
            .insert(name.to_string(), raster.clone());
        Ok(())
    }

    fn grid_exists(&self, name: &str) -> bool {
        self.grids.read().is_ok_and(|g| g.contains_key(name))
    }

    fn points_exist(&self, name: &str) -> bool {
        self.points.read().is_ok_and(|p| p.contains_key(name))
    }

    fn remove_grid(&self, name: &str) -> Result<()> {
        self.grids
            .write()
            .map_err(poisoned)?
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Error::MissingInput(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::GeoTransform;
    use crate::vector::ReferencePoint;

    fn grid() -> Raster<f64> {
        let mut r = Raster::from_vec((1..=9).map(f64::from).collect(), 3, 3).unwrap();
        r.set_transform(GeoTransform::new(0.0, 3.0, 1.0, -1.0));
        r
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(!store.grid_exists("bio1"));

        store.write_grid("bio1", &grid()).unwrap();
        assert!(store.grid_exists("bio1"));
        assert_eq!(store.read_grid("bio1").unwrap(), grid());

        store.remove_grid("bio1").unwrap();
        assert!(matches!(store.read_grid("bio1"), Err(Error::MissingInput(_))));
    }

    #[test]
    fn test_sample_grid_at_points() {
        let store = MemoryStore::new();
        let mut points = PointSet::from_coords(&[(0.5, 2.5), (2.5, 0.5)]);
        points.push(ReferencePoint::new("outside", 10.0, 10.0));

        let samples = store.sample_grid_at_points(&grid(), &points);
        assert_eq!(samples, vec![Some(1.0), Some(9.0), None]);
    }

    #[test]
    fn test_directory_store_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStore::new(dir.path());

        assert!(!store.grid_exists("bio1"));
        store.write_grid("bio1", &grid()).unwrap();
        assert!(store.grid_path("bio1").is_file());
        assert!(store.grid_exists("bio1"));

        let back = store.read_grid("bio1").unwrap();
        assert_eq!(back.shape(), (3, 3));
        assert_eq!(back.get(2, 2).unwrap(), 9.0);

        store.remove_grid("bio1").unwrap();
        assert!(matches!(store.read_grid("bio1"), Err(Error::MissingInput(_))));
    }

    #[test]
    fn test_directory_store_rejects_path_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStore::new(dir.path());
        assert!(matches!(
            store.write_grid("../escape", &grid()),
            Err(Error::InvalidParameter { .. })
        ));
        assert!(!store.grid_exists("../escape"));
    }
}
