//! I/O operations for reading and writing layers

mod native;
mod points;
mod store;

pub use native::{decode_geotiff, encode_geotiff, read_geotiff, write_geotiff};
pub use points::{read_points_csv, read_points_from_reader, write_points_csv};
pub use store::{DirectoryStore, GridStore, MemoryStore};
