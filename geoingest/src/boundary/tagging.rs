//! Marquage des features avec le pays et le continent déduits de leur position

use geojson::{Feature, FeatureCollection};
use tracing::debug;

use super::fallback::infer_continent_from_coord;
use super::geometry::representative_coord;
use super::index::BoundaryIndex;
use crate::types::{JsonObject, JsonValue};

/// Propriété posée par le géocodage : pays
pub const COUNTRY_TAG: &str = "_country";
/// Propriété posée par le géocodage : continent
pub const CONTINENT_TAG: &str = "_continent";

fn has_tag(feature: &Feature, key: &str) -> bool {
    feature
        .properties
        .as_ref()
        .and_then(|p| p.get(key))
        .is_some_and(|v| !v.is_null())
}

fn set_tag(feature: &mut Feature, key: &str, value: &str) {
    feature
        .properties
        .get_or_insert_with(JsonObject::new)
        .insert(key.to_string(), JsonValue::String(value.to_string()));
}

/// Marque les features sans pays ou sans continent par test d'appartenance
/// aux frontières. Retourne le nombre de features marquées.
pub fn tag_spatial_fields(collection: &mut FeatureCollection, index: &BoundaryIndex) -> usize {
    let mut tagged = 0usize;
    let mut unmatched = 0usize;

    for feature in &mut collection.features {
        if has_tag(feature, COUNTRY_TAG) && has_tag(feature, CONTINENT_TAG) {
            continue;
        }
        let Some(point) = feature.geometry.as_ref().and_then(representative_coord) else {
            continue;
        };
        let Some(entry) = index.locate(point) else {
            unmatched += 1;
            continue;
        };

        set_tag(feature, COUNTRY_TAG, &entry.country);
        if let Some(continent) = &entry.continent {
            set_tag(feature, CONTINENT_TAG, continent);
        }
        tagged += 1;
    }

    debug!(tagged, unmatched, "Spatial tagging done");
    tagged
}

/// Variante booléenne : vrai si au moins une feature a été marquée
pub fn ensure_spatial_fields(collection: &mut FeatureCollection, index: &BoundaryIndex) -> bool {
    tag_spatial_fields(collection, index) > 0
}

/// Repli sans données de référence : continent par boîtes de coordonnées
pub fn tag_continents_from_coords(collection: &mut FeatureCollection) -> usize {
    let mut tagged = 0usize;
    for feature in &mut collection.features {
        if has_tag(feature, CONTINENT_TAG) {
            continue;
        }
        let continent = feature
            .geometry
            .as_ref()
            .and_then(representative_coord)
            .and_then(infer_continent_from_coord);
        if let Some(continent) = continent {
            set_tag(feature, CONTINENT_TAG, continent);
            tagged += 1;
        }
    }
    tagged
}
