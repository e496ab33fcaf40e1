//! # geoingest
//!
//! Ingestion de données vectorielles géographiques non fiables (fichier ou
//! URL), inférence des champs continent / pays, géocodage par frontières
//! mondiales et classification thématique.
//!
//! ## Features
//!
//! - Garde d'entrée : URL https uniquement, hôtes privés bloqués, budgets
//!   d'octets et de temps appliqués en flux
//! - Budget de complexité (features, sommets) avec confirmation près des limites
//! - Inférence heuristique des colonnes continent / pays
//! - Point dans polygone sur un index de frontières chargé une seule fois
//! - Intervalles égaux, quantiles, Jenks, valeurs uniques
//!
//! ## Usage
//!
//! ```rust,ignore
//! use geoingest::{BoundaryCache, ImportSource, Importer, Session};
//!
//! let mut session = Session::new(BoundaryCache::new(sources, fetcher.clone(), limits.clone(), policy.clone()));
//! let importer = Importer::new(limits, policy, fetcher, confirm);
//!
//! let outcome = importer
//!     .import(&mut session, &ImportSource::parse("https://example.com/cities.geojson"))
//!     .await?;
//! println!("{} features", outcome.stats.feature_count);
//!
//! session.filter_mut().select_continent("Africa");
//! let state = session.classify_layer(outcome.layer_id, "pop", ClassificationMethod::NaturalBreaks, 5)?;
//! ```

pub mod boundary;
pub mod budget;
pub mod classify;
pub mod decode;
pub mod error;
pub mod filter;
pub mod guard;
pub mod import;
pub mod schema;
pub mod session;
pub mod types;

pub use boundary::{BoundaryCache, BoundaryIndex, BoundaryIndexEntry};
pub use budget::ConfirmLoad;
pub use classify::{ClassificationMethod, ClassificationState, ClassValues};
pub use decode::ShapefileDecoder;
pub use error::{ErrorKind, GeoIngestError};
pub use filter::{apply_filters, distinct_values, FilterSelection};
pub use guard::{HttpFetch, ReqwestFetcher};
pub use import::{FieldSource, ImportOutcome, ImportSource, Importer};
pub use schema::detect_filter_fields;
pub use session::{Layer, LayerId, Session};
pub use types::{DatasetBudgetStats, FilterFields, Limits, ReferenceSources, SecurityPolicy};
