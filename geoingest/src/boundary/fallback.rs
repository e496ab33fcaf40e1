//! Continent approximatif par boîtes de coordonnées, utilisé quand ni champ
//! de schéma ni données de référence ne sont disponibles.

use geo::Coord;

struct ContinentBox {
    name: &'static str,
    min_lat: f64,
    max_lat: f64,
    min_lon: f64,
    max_lon: f64,
}

/// Boîtes dans l'ordre d'évaluation ; elles se chevauchent aux bords et la
/// première qui contient le point l'emporte
const CONTINENT_BOXES: &[ContinentBox] = &[
    ContinentBox { name: "Antarctica", min_lat: -90.0, max_lat: -60.0, min_lon: -180.0, max_lon: 180.0 },
    ContinentBox { name: "Europe", min_lat: 35.0, max_lat: 72.0, min_lon: -25.0, max_lon: 45.0 },
    ContinentBox { name: "Africa", min_lat: -35.0, max_lat: 38.0, min_lon: -18.0, max_lon: 52.0 },
    ContinentBox { name: "Oceania", min_lat: -50.0, max_lat: 0.0, min_lon: 110.0, max_lon: 180.0 },
    ContinentBox { name: "Asia", min_lat: -11.0, max_lat: 82.0, min_lon: 25.0, max_lon: 180.0 },
    ContinentBox { name: "North America", min_lat: 7.0, max_lat: 84.0, min_lon: -170.0, max_lon: -50.0 },
    ContinentBox { name: "South America", min_lat: -57.0, max_lat: 13.0, min_lon: -82.0, max_lon: -34.0 },
];

/// Continent de la première boîte contenant `(lon, lat)`
pub fn infer_continent_from_coord(coord: Coord) -> Option<&'static str> {
    let (lon, lat) = (coord.x, coord.y);
    if !lon.is_finite() || !lat.is_finite() {
        return None;
    }

    CONTINENT_BOXES
        .iter()
        .find(|b| lat >= b.min_lat && lat <= b.max_lat && lon >= b.min_lon && lon <= b.max_lon)
        .map(|b| b.name)
}
