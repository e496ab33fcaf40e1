//! Parsing GeoJSON

use geojson::{Feature, FeatureCollection, GeoJson};

use crate::GeoIngestError;

/// Parse un texte GeoJSON en FeatureCollection.
///
/// Une Feature isolée ou une géométrie nue est enveloppée dans une collection
/// d'un élément.
pub fn parse_geojson(text: &str, source_label: &str) -> Result<FeatureCollection, GeoIngestError> {
    let geojson: GeoJson = text
        .parse()
        .map_err(|e: geojson::Error| GeoIngestError::parse_error(source_label, e.to_string()))?;

    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        GeoJson::Feature(feature) => single(feature),
        GeoJson::Geometry(geometry) => single(Feature {
            bbox: None,
            geometry: Some(geometry),
            id: None,
            properties: Some(Default::default()),
            foreign_members: None,
        }),
    };

    Ok(collection)
}

fn single(feature: Feature) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: vec![feature],
        foreign_members: None,
    }
}
