//! Géocodage par frontières mondiales : chargement de l'index de référence,
//! test point dans polygone et marquage pays / continent.

pub mod cache;
pub mod fallback;
pub mod geometry;
pub mod index;
pub mod metadata;
pub mod tagging;

pub use cache::{BoundaryCache, BoundaryLoader};
pub use fallback::infer_continent_from_coord;
pub use geometry::{point_in_geometry, point_in_polygon, representative_coord};
pub use index::{load_world_boundary_index, BoundaryIndex, BoundaryIndexEntry};
pub use metadata::CountryMetadata;
pub use tagging::{
    ensure_spatial_fields, tag_continents_from_coords, tag_spatial_fields, CONTINENT_TAG,
    COUNTRY_TAG,
};
