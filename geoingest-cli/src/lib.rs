//! # geoingest-cli
//!
//! Chargement, filtrage, classification et export de données vectorielles
//! depuis un fichier ou une URL.
//!
//! ## Usage CLI
//!
//! ```bash
//! # Statistiques et champs détectés
//! geoingest inspect ./cities.csv --report report.json
//!
//! # Classification d'un attribut sur les villes d'Afrique
//! geoingest classify https://data.humdata.org/cities.geojson --attribute pop --method jenks --continent Africa
//!
//! # Export GeoJSON avec la couleur de classe
//! geoingest export ./cities.csv --output out.geojson --attribute pop --classes 4
//! ```

pub mod config;
pub mod export;
pub mod prompt;
pub mod report;

pub use config::Config;
pub use export::export_to_geojson;
pub use prompt::{AutoConfirm, StdinConfirm};
pub use report::{LoadReport, LoadStatus};
