//! Budget de complexité d'un jeu de données (features, sommets)

use futures::future::BoxFuture;
use geojson::{FeatureCollection, Geometry, Value};
use tracing::{info, warn};

use crate::types::{DatasetBudgetStats, Limits};
use crate::GeoIngestError;

/// Demande de confirmation pour un chargement proche des limites
pub trait ConfirmLoad: Send + Sync {
    /// Retourne `true` si l'utilisateur accepte de poursuivre
    fn confirm<'a>(&'a self, stats: &'a DatasetBudgetStats, label: &'a str) -> BoxFuture<'a, bool>;
}

/// Compte features et sommets.
///
/// Un Point compte pour exactement un sommet sans parcours.
pub fn compute_stats(collection: &FeatureCollection) -> DatasetBudgetStats {
    let vertex_count = collection
        .features
        .iter()
        .filter_map(|f| f.geometry.as_ref())
        .map(geometry_vertex_count)
        .sum();

    DatasetBudgetStats {
        feature_count: collection.features.len(),
        vertex_count,
    }
}

/// Nombre de paires de coordonnées d'une géométrie
pub fn geometry_vertex_count(geometry: &Geometry) -> usize {
    match &geometry.value {
        Value::Point(_) => 1,
        Value::MultiPoint(points) => points.len(),
        Value::LineString(line) => line.len(),
        Value::MultiLineString(lines) => lines.iter().map(Vec::len).sum(),
        Value::Polygon(rings) => rings.iter().map(Vec::len).sum(),
        Value::MultiPolygon(polygons) => polygons
            .iter()
            .flat_map(|rings| rings.iter())
            .map(Vec::len)
            .sum(),
        Value::GeometryCollection(geometries) => geometries.iter().map(geometry_vertex_count).sum(),
    }
}

/// Vérifie les plafonds durs ; les valeurs égales aux plafonds passent
pub fn assert_within_limits(
    collection: &FeatureCollection,
    label: &str,
    limits: &Limits,
) -> Result<DatasetBudgetStats, GeoIngestError> {
    let stats = compute_stats(collection);

    if stats.feature_count > limits.max_features {
        return Err(GeoIngestError::TooManyFeatures {
            label: label.to_string(),
            count: stats.feature_count,
            limit: limits.max_features,
        });
    }

    if stats.vertex_count > limits.max_vertices {
        return Err(GeoIngestError::TooComplex {
            label: label.to_string(),
            count: stats.vertex_count,
            limit: limits.max_vertices,
        });
    }

    Ok(stats)
}

/// Vrai si l'un des deux ratios atteint le seuil d'avertissement
pub fn is_near_limits(stats: &DatasetBudgetStats, limits: &Limits) -> bool {
    let feature_ratio = ratio(stats.feature_count, limits.max_features);
    let vertex_ratio = ratio(stats.vertex_count, limits.max_vertices);
    feature_ratio >= limits.near_limit_ratio || vertex_ratio >= limits.near_limit_ratio
}

fn ratio(count: usize, cap: usize) -> f64 {
    if cap == 0 {
        return f64::INFINITY;
    }
    count as f64 / cap as f64
}

/// Demande confirmation si le jeu est proche des limites.
///
/// Retourne `false` si l'utilisateur refuse (l'import doit être abandonné).
pub async fn confirm_large_load(
    stats: &DatasetBudgetStats,
    label: &str,
    limits: &Limits,
    prompt: &dyn ConfirmLoad,
) -> bool {
    if !is_near_limits(stats, limits) {
        return true;
    }

    warn!(
        label = %label,
        features = stats.feature_count,
        vertices = stats.vertex_count,
        "Dataset is close to the import limits"
    );

    let accepted = prompt.confirm(stats, label).await;
    if !accepted {
        info!(label = %label, "Large dataset load declined");
    }
    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use geojson::Feature;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn feature(value: Value) -> Feature {
        Feature {
            bbox: None,
            geometry: Some(Geometry::new(value)),
            id: None,
            properties: None,
            foreign_members: None,
        }
    }

    fn collection(features: Vec<Feature>) -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }

    fn square() -> Vec<Vec<f64>> {
        vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
            vec![0.0, 1.0],
            vec![0.0, 0.0],
        ]
    }

    struct CountingPrompt {
        answer: bool,
        calls: AtomicUsize,
    }

    impl ConfirmLoad for CountingPrompt {
        fn confirm<'a>(&'a self, _stats: &'a DatasetBudgetStats, _label: &'a str) -> BoxFuture<'a, bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let answer = self.answer;
            async move { answer }.boxed()
        }
    }

    #[test]
    fn test_compute_stats_is_additive() {
        let features = vec![
            feature(Value::Point(vec![1.0, 2.0])),
            feature(Value::LineString(vec![vec![0.0, 0.0], vec![1.0, 1.0], vec![2.0, 2.0]])),
            feature(Value::Polygon(vec![square(), square()])),
            feature(Value::MultiPolygon(vec![vec![square()], vec![square()]])),
            feature(Value::MultiPoint(vec![vec![0.0, 0.0], vec![1.0, 1.0]])),
            feature(Value::MultiLineString(vec![
                vec![vec![0.0, 0.0], vec![1.0, 1.0]],
                vec![vec![2.0, 2.0], vec![3.0, 3.0]],
            ])),
        ];
        let per_feature: usize = features
            .iter()
            .map(|f| geometry_vertex_count(f.geometry.as_ref().unwrap()))
            .sum();

        let stats = compute_stats(&collection(features));
        assert_eq!(stats.feature_count, 6);
        assert_eq!(stats.vertex_count, per_feature);
        assert_eq!(stats.vertex_count, 1 + 3 + 10 + 10 + 2 + 4);
    }

    #[test]
    fn test_point_counts_one_and_null_geometry_zero() {
        let mut empty = feature(Value::Point(vec![0.0, 0.0]));
        empty.geometry = None;
        let stats = compute_stats(&collection(vec![
            feature(Value::Point(vec![0.0, 0.0, 12.0])),
            empty,
        ]));
        assert_eq!(stats, DatasetBudgetStats { feature_count: 2, vertex_count: 1 });
    }

    #[test]
    fn test_assert_within_limits_boundaries() {
        let limits = Limits {
            max_features: 2,
            max_vertices: 3,
            ..Default::default()
        };
        let at_cap = collection(vec![
            feature(Value::Point(vec![0.0, 0.0])),
            feature(Value::LineString(vec![vec![0.0, 0.0], vec![1.0, 1.0]])),
        ]);
        assert!(assert_within_limits(&at_cap, "cap", &limits).is_ok());

        let too_many = collection(vec![
            feature(Value::Point(vec![0.0, 0.0])),
            feature(Value::Point(vec![0.0, 0.0])),
            feature(Value::Point(vec![0.0, 0.0])),
        ]);
        assert!(matches!(
            assert_within_limits(&too_many, "many", &limits),
            Err(GeoIngestError::TooManyFeatures { count: 3, .. })
        ));

        let too_complex = collection(vec![feature(Value::Polygon(vec![square()]))]);
        assert!(matches!(
            assert_within_limits(&too_complex, "complex", &limits),
            Err(GeoIngestError::TooComplex { count: 5, .. })
        ));
    }

    #[test]
    fn test_is_near_limits() {
        let limits = Limits {
            max_features: 100,
            max_vertices: 1000,
            ..Default::default()
        };
        let below = DatasetBudgetStats { feature_count: 79, vertex_count: 799 };
        let features_near = DatasetBudgetStats { feature_count: 80, vertex_count: 10 };
        let vertices_near = DatasetBudgetStats { feature_count: 1, vertex_count: 800 };
        assert!(!is_near_limits(&below, &limits));
        assert!(is_near_limits(&features_near, &limits));
        assert!(is_near_limits(&vertices_near, &limits));
    }

    #[tokio::test]
    async fn test_confirm_only_when_near() {
        let limits = Limits {
            max_features: 10,
            ..Default::default()
        };
        let prompt = CountingPrompt {
            answer: false,
            calls: AtomicUsize::new(0),
        };

        let small = DatasetBudgetStats { feature_count: 1, vertex_count: 1 };
        assert!(confirm_large_load(&small, "small", &limits, &prompt).await);
        assert_eq!(prompt.calls.load(Ordering::SeqCst), 0);

        let large = DatasetBudgetStats { feature_count: 9, vertex_count: 9 };
        assert!(!confirm_large_load(&large, "large", &limits, &prompt).await);
        assert_eq!(prompt.calls.load(Ordering::SeqCst), 1);
    }
}
