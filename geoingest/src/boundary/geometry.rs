//! Primitives géométriques : point dans polygone, coordonnée représentative

use geo::{Coord, LineString, MultiPolygon, Polygon, Rect};
use geojson::{Geometry, Value};

/// Test pair-impair par lancer de rayon horizontal
pub fn point_in_ring(point: Coord, ring: &LineString) -> bool {
    let coords = &ring.0;
    let n = coords.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (coords[i], coords[j]);
        if (a.y > point.y) != (b.y > point.y)
            && point.x < (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Dans l'anneau extérieur et dans aucun trou
pub fn point_in_polygon(point: Coord, polygon: &Polygon) -> bool {
    point_in_ring(point, polygon.exterior())
        && !polygon
            .interiors()
            .iter()
            .any(|hole| point_in_ring(point, hole))
}

/// Dans au moins un des polygones
pub fn point_in_geometry(point: Coord, geometry: &MultiPolygon) -> bool {
    geometry.0.iter().any(|p| point_in_polygon(point, p))
}

/// Inclusion bornes comprises
pub fn rect_contains(rect: &Rect, point: Coord) -> bool {
    let (min, max) = (rect.min(), rect.max());
    point.x >= min.x && point.x <= max.x && point.y >= min.y && point.y <= max.y
}

/// Première coordonnée de la géométrie (Point, MultiPoint, LineString,
/// MultiLineString, Polygon, MultiPolygon)
pub fn representative_coord(geometry: &Geometry) -> Option<Coord> {
    let position = match &geometry.value {
        Value::Point(p) => Some(p),
        Value::MultiPoint(points) => points.first(),
        Value::LineString(line) => line.first(),
        Value::MultiLineString(lines) => lines.first().and_then(|l| l.first()),
        Value::Polygon(rings) => rings.first().and_then(|r| r.first()),
        Value::MultiPolygon(polygons) => polygons
            .first()
            .and_then(|rings| rings.first())
            .and_then(|r| r.first()),
        Value::GeometryCollection(_) => None,
    }?;

    position_to_coord(position)
}

fn position_to_coord(position: &[f64]) -> Option<Coord> {
    match position {
        [x, y, ..] if x.is_finite() && y.is_finite() => Some(Coord { x: *x, y: *y }),
        _ => None,
    }
}

fn ring_from_positions(positions: &[Vec<f64>]) -> LineString {
    LineString::new(
        positions
            .iter()
            .filter_map(|p| position_to_coord(p))
            .collect(),
    )
}

fn polygon_from_rings(rings: &[Vec<Vec<f64>>]) -> Option<Polygon> {
    let (exterior, holes) = rings.split_first()?;
    Some(Polygon::new(
        ring_from_positions(exterior),
        holes.iter().map(|h| ring_from_positions(h)).collect(),
    ))
}

/// Convertit un Polygon / MultiPolygon GeoJSON ; les autres types donnent None
pub fn to_multipolygon(geometry: &Geometry) -> Option<MultiPolygon> {
    match &geometry.value {
        Value::Polygon(rings) => polygon_from_rings(rings).map(|p| MultiPolygon::new(vec![p])),
        Value::MultiPolygon(polygons) => {
            let polygons: Vec<Polygon> = polygons
                .iter()
                .filter_map(|rings| polygon_from_rings(rings))
                .collect();
            if polygons.is_empty() {
                None
            } else {
                Some(MultiPolygon::new(polygons))
            }
        }
        _ => None,
    }
}
