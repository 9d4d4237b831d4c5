//! CSV reference point files
//!
//! One point per record with a header row: `x,y` and an optional `id`
//! column. Records without an id are numbered from 1 in file order.

use crate::error::{Error, Result};
use crate::vector::{PointSet, ReferencePoint};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct PointRecord {
    x: f64,
    y: f64,
    #[serde(default)]
    id: Option<String>,
}

/// Read reference points from a CSV file
pub fn read_points_csv<P: AsRef<Path>>(path: P) -> Result<PointSet> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path.as_ref())?;
    collect_points(reader)
}

/// Read reference points from any CSV source
pub fn read_points_from_reader<R: Read>(source: R) -> Result<PointSet> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(source);
    collect_points(reader)
}

fn collect_points<R: Read>(mut reader: csv::Reader<R>) -> Result<PointSet> {
    let mut points = PointSet::new();
    for (i, record) in reader.deserialize::<PointRecord>().enumerate() {
        let record = record?;
        if !record.x.is_finite() || !record.y.is_finite() {
            return Err(Error::External(format!(
                "Point {} has non-finite coordinates",
                i + 1
            )));
        }
        let id = record
            .id
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| (i + 1).to_string());
        points.push(ReferencePoint::new(id, record.x, record.y));
    }
    Ok(points)
}

/// Write reference points as CSV with an `x,y,id` header
pub fn write_points_csv<P: AsRef<Path>>(points: &PointSet, path: P) -> Result<()> {
    let mut writer = csv::Writer::from_path(path.as_ref())?;
    writer.write_record(["x", "y", "id"])?;
    for p in points.iter() {
        writer.write_record([p.x().to_string(), p.y().to_string(), p.id.clone()])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_with_ids() {
        let src = "x,y,id\n1.5,2.5,a\n3.0,4.0,b\n";
        let points = read_points_from_reader(src.as_bytes()).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points.points[0].id, "a");
        assert_eq!(points.points[1].x(), 3.0);
    }

    #[test]
    fn test_read_without_ids_numbers_points() {
        let src = "x, y\n1, 2\n3, 4\n";
        let points = read_points_from_reader(src.as_bytes()).unwrap();
        assert_eq!(points.points[0].id, "1");
        assert_eq!(points.points[1].id, "2");
        assert_eq!(points.points[1].y(), 4.0);
    }

    #[test]
    fn test_bad_coordinate_is_error() {
        let src = "x,y\nabc,2\n";
        assert!(matches!(
            read_points_from_reader(src.as_bytes()),
            Err(Error::Csv(_))
        ));
    }

    #[test]
    fn test_write_then_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("occ.csv");
        let points = PointSet::from_coords(&[(10.0, 20.0), (30.5, 40.5)]);

        write_points_csv(&points, &path).unwrap();
        let back = read_points_csv(&path).unwrap();

        assert_eq!(back, points);
    }
}
