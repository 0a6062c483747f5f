//! Modules d'export (BAL CSV, GeoJSON)

pub mod csv_bal;
pub mod geojson;

pub use csv_bal::{export_as_csv, BalRow, ExportError};
pub use geojson::{stream_features, write_feature_collection};
