//! Index des frontières mondiales : une entrée par pays (nom, continent,
//! bbox, géométrie) et l'index continent -> pays.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use geo::{BoundingRect, Coord, MultiPolygon, Rect};
use geojson::Feature;
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

use super::geometry::{point_in_geometry, rect_contains, to_multipolygon};
use super::metadata::{continent_lookup, normalize_name, parse_metadata};
use crate::decode::decode_text;
use crate::guard::{check_origin, fetch_with_budget, HttpFetch};
use crate::types::{value_as_text, JsonValue, Limits, ReferenceSources, SecurityPolicy};
use crate::GeoIngestError;

const BOUNDARY_LABEL: &str = "world boundaries";
const METADATA_LABEL: &str = "country metadata";

/// Propriétés portant le nom du pays, par priorité
const NAME_PROPERTIES: &[&str] = &["name", "NAME", "ADMIN", "admin", "name_long"];

/// Noms historiquement ambigus absents des métadonnées
const CONTINENT_EXCEPTIONS: &[(&str, &str)] = &[
    ("Kosovo", "Europe"),
    ("Somaliland", "Africa"),
    ("Western Sahara", "Africa"),
    ("N. Cyprus", "Asia"),
    ("Northern Cyprus", "Asia"),
    ("Taiwan", "Asia"),
    ("West Bank", "Asia"),
    ("Republic of Serbia", "Europe"),
    ("United Republic of Tanzania", "Africa"),
    ("USA", "North America"),
    ("United States of America", "North America"),
    ("Macedonia", "Europe"),
    ("Czech Republic", "Europe"),
    ("Swaziland", "Africa"),
    ("Ivory Coast", "Africa"),
    ("Guinea Bissau", "Africa"),
    ("The Bahamas", "North America"),
    ("East Timor", "Asia"),
    ("Republic of the Congo", "Africa"),
    ("Democratic Republic of the Congo", "Africa"),
    ("Falkland Islands", "South America"),
    ("French Southern and Antarctic Lands", "Antarctica"),
];

/// Une frontière de pays prête pour le test d'appartenance
#[derive(Debug, Clone)]
pub struct BoundaryIndexEntry {
    pub country: String,
    pub continent: Option<String>,
    pub bbox: Rect,
    pub geometry: MultiPolygon,
}

/// Index construit une fois par session, partagé en lecture seule
#[derive(Debug, Default)]
pub struct BoundaryIndex {
    entries: Vec<BoundaryIndexEntry>,
    continents: BTreeMap<String, BTreeSet<String>>,
}

impl BoundaryIndex {
    /// Construit l'index depuis les deux documents de référence.
    ///
    /// Les features sans nom ou sans géométrie surfacique sont ignorées.
    pub fn build(boundary: &JsonValue, metadata: &JsonValue) -> Result<Self, GeoIngestError> {
        let features = boundary_features(boundary)?;
        let metadata = parse_metadata(metadata)?;
        let lookup = continent_lookup(&metadata);
        let exceptions: HashMap<String, &str> = CONTINENT_EXCEPTIONS
            .iter()
            .map(|(name, continent)| (normalize_name(name), *continent))
            .collect();

        let mut continents: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for country in &metadata {
            if let (Some(continent), Some(name)) = (country.continent(), country.name.common.as_deref()) {
                continents
                    .entry(continent.to_string())
                    .or_default()
                    .insert(sanitize_name(name));
            }
        }

        let mut entries = Vec::with_capacity(features.len());
        let mut skipped = 0usize;
        for raw in features {
            let Some(entry) = build_entry(raw, &lookup, &exceptions) else {
                skipped += 1;
                continue;
            };
            if let Some(continent) = &entry.continent {
                continents
                    .entry(continent.clone())
                    .or_default()
                    .insert(entry.country.clone());
            }
            entries.push(entry);
        }

        if skipped > 0 {
            debug!(skipped, "Boundary features without name or polygon geometry skipped");
        }
        let unresolved = entries.iter().filter(|e| e.continent.is_none()).count();
        info!(
            countries = entries.len(),
            unresolved_continents = unresolved,
            "World boundary index built"
        );

        Ok(Self { entries, continents })
    }

    pub fn entries(&self) -> &[BoundaryIndexEntry] {
        &self.entries
    }

    /// Continent -> noms de pays
    pub fn continents(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.continents
    }

    pub fn countries_in(&self, continent: &str) -> Option<&BTreeSet<String>> {
        self.continents.get(continent)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Première frontière contenant le point (préfiltre bbox puis test exact)
    pub fn locate(&self, point: Coord) -> Option<&BoundaryIndexEntry> {
        self.entries
            .iter()
            .filter(|e| rect_contains(&e.bbox, point))
            .find(|e| point_in_geometry(point, &e.geometry))
    }
}

fn boundary_features(boundary: &JsonValue) -> Result<&Vec<JsonValue>, GeoIngestError> {
    let object = boundary
        .as_object()
        .ok_or_else(|| GeoIngestError::InvalidBoundaryData("top-level value is not an object".into()))?;

    if object.get("type").and_then(JsonValue::as_str) != Some("FeatureCollection") {
        return Err(GeoIngestError::InvalidBoundaryData(
            "expected a FeatureCollection".into(),
        ));
    }

    object
        .get("features")
        .and_then(JsonValue::as_array)
        .ok_or_else(|| GeoIngestError::InvalidBoundaryData("missing features array".into()))
}

fn build_entry(
    raw: &JsonValue,
    lookup: &HashMap<String, &'static str>,
    exceptions: &HashMap<String, &str>,
) -> Option<BoundaryIndexEntry> {
    let feature = Feature::deserialize(raw).ok()?;
    let properties = feature.properties.as_ref()?;
    let country = NAME_PROPERTIES
        .iter()
        .filter_map(|key| properties.get(*key))
        .map(|v| sanitize_name(&value_as_text(v)))
        .find(|name| !name.is_empty())?;

    let geometry = to_multipolygon(feature.geometry.as_ref()?)?;
    let bbox = geometry.bounding_rect()?;

    let key = normalize_name(&country);
    let continent = lookup
        .get(&key)
        .copied()
        .or_else(|| exceptions.get(&key).copied())
        .map(str::to_string);

    Some(BoundaryIndexEntry {
        country,
        continent,
        bbox,
        geometry,
    })
}

/// Nom d'affichage : caractères de contrôle retirés, espaces fusionnés
fn sanitize_name(name: &str) -> String {
    name.split(|c: char| c.is_whitespace() || c.is_control())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Charge les deux documents de référence et construit l'index.
///
/// Pour chaque document, le chemin local est préféré ; l'URL distante n'est
/// utilisée que si aucun chemin n'est donné ou si la lecture locale échoue.
pub async fn load_world_boundary_index(
    sources: &ReferenceSources,
    fetcher: &dyn HttpFetch,
    limits: &Limits,
    policy: &SecurityPolicy,
) -> Result<BoundaryIndex, GeoIngestError> {
    let (boundary, metadata) = futures::try_join!(
        load_reference(
            BOUNDARY_LABEL,
            sources.boundary_path.as_deref(),
            sources.boundary_url.as_deref(),
            fetcher,
            limits,
            policy,
        ),
        load_reference(
            METADATA_LABEL,
            sources.metadata_path.as_deref(),
            sources.metadata_url.as_deref(),
            fetcher,
            limits,
            policy,
        ),
    )?;

    BoundaryIndex::build(&boundary, &metadata)
}

async fn load_reference(
    label: &'static str,
    path: Option<&Path>,
    url: Option<&str>,
    fetcher: &dyn HttpFetch,
    limits: &Limits,
    policy: &SecurityPolicy,
) -> Result<JsonValue, GeoIngestError> {
    let local_error = match path {
        Some(path) => match read_local_reference(label, path, limits).await {
            Ok(value) => {
                debug!(source = label, path = %path.display(), "Reference data read from local file");
                return Ok(value);
            }
            Err(e) => {
                warn!(source = label, path = %path.display(), error = %e, "Local reference file unusable");
                Some(e)
            }
        },
        None => None,
    };

    let Some(raw_url) = url else {
        return Err(local_error.unwrap_or(GeoIngestError::MissingReferenceSource(label)));
    };

    let url = Url::parse(raw_url).map_err(|e| GeoIngestError::InvalidUrl(format!("{raw_url}: {e}")))?;
    check_origin(&url, policy)?;

    let fetched = fetch_with_budget(fetcher, &url, limits).await?;
    debug!(source = label, url = %url, bytes = fetched.text.len(), "Reference data fetched");
    parse_json(label, &fetched.text)
}

async fn read_local_reference(
    label: &'static str,
    path: &Path,
    limits: &Limits,
) -> Result<JsonValue, GeoIngestError> {
    let size = tokio::fs::metadata(path).await?.len();
    if size > limits.max_local_file_bytes {
        return Err(GeoIngestError::TooLarge {
            label: path.display().to_string(),
            limit: limits.max_local_file_bytes,
        });
    }
    let bytes = tokio::fs::read(path).await?;
    parse_json(label, &decode_text(&bytes, None))
}

fn parse_json(label: &str, text: &str) -> Result<JsonValue, GeoIngestError> {
    serde_json::from_str(text).map_err(|e| GeoIngestError::parse_error(label, e.to_string()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::guard::fetch::tests::MockFetch;
    use geo::coord;
    use serde_json::json;

    /// Jeu de frontières minimal : Kenya simplifié, une île à trou, un pays
    /// inconnu des métadonnées
    pub(crate) fn boundary_json() -> JsonValue {
        json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": { "name": "Kenya" },
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[
                            [33.9, -0.9], [34.1, 1.2], [35.0, 4.6], [36.0, 4.5],
                            [38.1, 3.6], [41.9, 4.0], [41.0, -1.6], [39.2, -4.7],
                            [37.7, -3.1], [33.9, -0.9]
                        ]]
                    }
                },
                {
                    "type": "Feature",
                    "properties": { "name": "  France\n" },
                    "geometry": {
                        "type": "MultiPolygon",
                        "coordinates": [[[
                            [-4.8, 48.4], [2.5, 51.1], [8.2, 49.0], [7.5, 43.8],
                            [3.0, 42.4], [-1.8, 43.4], [-4.8, 48.4]
                        ]]]
                    }
                },
                {
                    "type": "Feature",
                    "properties": { "name": "Kosovo" },
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[
                            [20.0, 42.0], [21.8, 42.0], [21.8, 43.2], [20.0, 43.2], [20.0, 42.0]
                        ]]
                    }
                },
                {
                    "type": "Feature",
                    "properties": { "name": "Atlantis" },
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[
                            [-30.0, 10.0], [-29.0, 10.0], [-29.0, 11.0], [-30.0, 10.0]
                        ]]
                    }
                },
                {
                    "type": "Feature",
                    "properties": { "name": "Nowhere" },
                    "geometry": { "type": "Point", "coordinates": [0.0, 0.0] }
                }
            ]
        })
    }

    pub(crate) fn metadata_json() -> JsonValue {
        json!([
            {
                "name": { "common": "Kenya", "official": "Republic of Kenya" },
                "altSpellings": ["KE"],
                "region": "Africa",
                "subregion": "Eastern Africa"
            },
            {
                "name": { "common": "France", "official": "French Republic" },
                "altSpellings": ["FR"],
                "region": "Europe",
                "subregion": "Western Europe"
            },
            {
                "name": { "common": "Monaco", "official": "Principality of Monaco" },
                "altSpellings": ["MC"],
                "region": "Europe",
                "subregion": "Western Europe"
            }
        ])
    }

    #[test]
    fn test_build_index() {
        let index = BoundaryIndex::build(&boundary_json(), &metadata_json()).unwrap();
        assert_eq!(index.len(), 4);

        let names: Vec<&str> = index.entries().iter().map(|e| e.country.as_str()).collect();
        assert_eq!(names, ["Kenya", "France", "Kosovo", "Atlantis"]);

        let continents: Vec<Option<&str>> = index
            .entries()
            .iter()
            .map(|e| e.continent.as_deref())
            .collect();
        assert_eq!(
            continents,
            [Some("Africa"), Some("Europe"), Some("Europe"), None]
        );
    }

    #[test]
    fn test_continent_index_merges_metadata_and_boundaries() {
        let index = BoundaryIndex::build(&boundary_json(), &metadata_json()).unwrap();
        let europe = index.countries_in("Europe").unwrap();
        // Monaco vient des métadonnées, Kosovo des frontières
        assert!(europe.contains("Monaco"));
        assert!(europe.contains("Kosovo"));
        assert!(europe.contains("France"));
        assert!(index.countries_in("Africa").unwrap().contains("Kenya"));
    }

    #[test]
    fn test_locate() {
        let index = BoundaryIndex::build(&boundary_json(), &metadata_json()).unwrap();
        assert_eq!(
            index.locate(coord! { x: 37.9, y: 0.0 }).map(|e| e.country.as_str()),
            Some("Kenya")
        );
        assert_eq!(
            index.locate(coord! { x: 2.35, y: 48.85 }).map(|e| e.country.as_str()),
            Some("France")
        );
        assert!(index.locate(coord! { x: -30.0, y: 0.0 }).is_none());
    }

    #[test]
    fn test_invalid_shapes() {
        let err = BoundaryIndex::build(&json!([]), &metadata_json()).unwrap_err();
        assert!(matches!(err, GeoIngestError::InvalidBoundaryData(_)));

        let err = BoundaryIndex::build(&json!({"type": "Feature"}), &metadata_json()).unwrap_err();
        assert!(matches!(err, GeoIngestError::InvalidBoundaryData(_)));

        let err = BoundaryIndex::build(&json!({"type": "FeatureCollection"}), &metadata_json())
            .unwrap_err();
        assert!(matches!(err, GeoIngestError::InvalidBoundaryData(_)));

        let err = BoundaryIndex::build(&boundary_json(), &json!({})).unwrap_err();
        assert!(matches!(err, GeoIngestError::InvalidMetadata(_)));
    }

    #[tokio::test]
    async fn test_local_path_preferred() {
        let dir = tempfile::tempdir().unwrap();
        let boundary_path = dir.path().join("boundaries.geojson");
        let metadata_path = dir.path().join("countries.json");
        std::fs::write(&boundary_path, boundary_json().to_string()).unwrap();
        std::fs::write(&metadata_path, metadata_json().to_string()).unwrap();

        let sources = ReferenceSources {
            boundary_path: Some(boundary_path),
            boundary_url: Some("https://example.com/boundaries.geojson".into()),
            metadata_path: Some(metadata_path),
            metadata_url: None,
        };
        let fetch = MockFetch::with_body("not json");
        let index = load_world_boundary_index(
            &sources,
            &fetch,
            &Limits::default(),
            &SecurityPolicy::default(),
        )
        .await
        .unwrap();

        assert_eq!(index.len(), 4);
        assert_eq!(fetch.chunks_read.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_remote_used_when_local_missing() {
        let dir = tempfile::tempdir().unwrap();
        let metadata_path = dir.path().join("countries.json");
        std::fs::write(&metadata_path, metadata_json().to_string()).unwrap();

        let sources = ReferenceSources {
            boundary_path: Some(dir.path().join("missing.geojson")),
            boundary_url: Some("https://example.com/boundaries.geojson".into()),
            metadata_path: Some(metadata_path),
            metadata_url: None,
        };
        let fetch = MockFetch::with_body(&boundary_json().to_string());
        let index = load_world_boundary_index(
            &sources,
            &fetch,
            &Limits::default(),
            &SecurityPolicy::default(),
        )
        .await
        .unwrap();
        assert_eq!(index.len(), 4);
    }

    #[tokio::test]
    async fn test_missing_source() {
        let sources = ReferenceSources::default();
        let fetch = MockFetch::with_body("{}");
        let err = load_world_boundary_index(
            &sources,
            &fetch,
            &Limits::default(),
            &SecurityPolicy::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, GeoIngestError::MissingReferenceSource(_)));
        assert_eq!(err.kind(), crate::ErrorKind::ReferenceData);
    }
}
