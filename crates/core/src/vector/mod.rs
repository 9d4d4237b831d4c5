//! Reference point locations

use crate::raster::Raster;
use geo_types::Point;

/// A reference location (e.g. a species occurrence record)
#[derive(Debug, Clone, PartialEq)]
pub struct ReferencePoint {
    /// Identifier used when reporting discarded points
    pub id: String,
    /// Location in the predictors' coordinate space
    pub location: Point<f64>,
}

impl ReferencePoint {
    pub fn new(id: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            location: Point::new(x, y),
        }
    }

    pub fn x(&self) -> f64 {
        self.location.x()
    }

    pub fn y(&self) -> f64 {
        self.location.y()
    }
}

/// Collection of reference points
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointSet {
    pub points: Vec<ReferencePoint>,
}

impl PointSet {
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Build a point set from bare coordinates, numbering the points from 1
    pub fn from_coords(coords: &[(f64, f64)]) -> Self {
        let points = coords
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| ReferencePoint::new((i + 1).to_string(), x, y))
            .collect();
        Self { points }
    }

    pub fn push(&mut self, point: ReferencePoint) {
        self.points.push(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReferencePoint> {
        self.points.iter()
    }

    /// Value of `grid` under each point, in point order; `None` outside the
    /// grid or on no-data cells
    pub fn sample(&self, grid: &Raster<f64>) -> Vec<Option<f64>> {
        self.points.iter().map(|p| grid.value_at(p.x(), p.y())).collect()
    }
}

impl FromIterator<ReferencePoint> for PointSet {
    fn from_iter<I: IntoIterator<Item = ReferencePoint>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for PointSet {
    type Item = ReferencePoint;
    type IntoIter = std::vec::IntoIter<ReferencePoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.into_iter()
    }
}
