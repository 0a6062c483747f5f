//! # bal-pipeline
//!
//! Import, export et extraction de Bases Adresses Locales.
//!
//! ## Features
//!
//! - Export BAL CSV (clé d'interopérabilité, projection Lambert 93)
//! - Export GeoJSON en flux
//! - Extraction d'une commune depuis un instantané de reprise ou la BAN
//! - CLI simple
//!
//! ## Usage CLI
//!
//! ```bash
//! # Extraire une commune vers un BAL CSV
//! bal-pipeline extract --commune 54084 --output 54084.csv
//!
//! # Convertir un BAL CSV en GeoJSON
//! bal-pipeline to-geojson --input 54084.csv --output 54084.geojson
//!
//! # Valider un BAL CSV
//! bal-pipeline validate --input 54084.csv
//! ```

pub mod cli;
pub mod communes;
pub mod config;
pub mod export;
pub mod extract;
pub mod projection;

pub use communes::{CommuneDirectory, CommunesIndex};
pub use config::Config;
