//! Parsing CSV de points (colonnes latitude / longitude)

use geojson::{Feature, FeatureCollection, Geometry, Value};
use tracing::debug;

use crate::types::{JsonObject, JsonValue};
use crate::GeoIngestError;

/// Parse un CSV avec en-tête en collection de points.
///
/// La colonne latitude est la première dont le nom contient `lat`, la
/// longitude la première contenant `lon`, `lng` ou `long`. Les lignes sans
/// coordonnées valides (absentes, non finies, hors plage) sont ignorées.
pub fn parse_csv(text: &str, source_label: &str) -> Result<FeatureCollection, GeoIngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| GeoIngestError::parse_error(source_label, e.to_string()))?
        .clone();

    let lowered: Vec<String> = headers.iter().map(|h| h.to_lowercase()).collect();
    let lat_idx = lowered.iter().position(|h| h.contains("lat"));
    let lon_idx = lowered
        .iter()
        .position(|h| h.contains("lon") || h.contains("lng") || h.contains("long"));

    let (Some(lat_idx), Some(lon_idx)) = (lat_idx, lon_idx) else {
        return Err(GeoIngestError::parse_error(
            source_label,
            "CSV needs a latitude column (lat) and a longitude column (lon/lng/long)",
        ));
    };

    let mut features = Vec::new();
    let mut dropped = 0usize;

    for record in reader.records() {
        let record = record.map_err(|e| GeoIngestError::parse_error(source_label, e.to_string()))?;

        let coords = record
            .get(lat_idx)
            .and_then(parse_coord)
            .zip(record.get(lon_idx).and_then(parse_coord));

        let Some((lat, lon)) = coords.filter(|&(lat, lon)| lat.abs() <= 90.0 && lon.abs() <= 180.0)
        else {
            dropped += 1;
            continue;
        };

        let mut properties = JsonObject::new();
        for (idx, (name, value)) in headers.iter().zip(record.iter()).enumerate() {
            if idx == lat_idx || idx == lon_idx {
                continue;
            }
            properties.insert(name.to_string(), JsonValue::String(value.to_string()));
        }

        features.push(Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::Point(vec![lon, lat]))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        });
    }

    if dropped > 0 {
        debug!(source = %source_label, dropped, "CSV rows without usable coordinates skipped");
    }

    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

fn parse_coord(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    fast_float::parse::<f64, _>(raw).ok().filter(|v| v.is_finite())
}
