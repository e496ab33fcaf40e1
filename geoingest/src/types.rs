//! Types de données partagés par le crate geoingest

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use geojson::{Feature, FeatureCollection, Geometry, Value};
pub use serde_json::Value as JsonValue;

/// Table d'attributs d'une feature
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// Budgets de ressources appliqués à chaque import
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Limits {
    /// Taille maximale d'un fichier local (octets)
    pub max_local_file_bytes: u64,

    /// Taille maximale d'un téléchargement distant (octets)
    pub max_remote_bytes: u64,

    /// Durée maximale d'un téléchargement (secondes)
    pub fetch_timeout_secs: u64,

    /// Nombre maximal de features
    pub max_features: usize,

    /// Nombre maximal de sommets
    pub max_vertices: usize,

    /// Ratio à partir duquel une confirmation est demandée
    pub near_limit_ratio: f64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_local_file_bytes: 1024 * 1024 * 1024,
            max_remote_bytes: 512 * 1024 * 1024,
            fetch_timeout_secs: 300,
            max_features: 1_000_000,
            max_vertices: 10_000_000,
            near_limit_ratio: 0.8,
        }
    }
}

impl Limits {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

/// Politique de sécurité des imports distants
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityPolicy {
    /// Hôtes privés explicitement autorisés (contourne le blocage réseau interne)
    pub allowed_private_hosts: Vec<String>,

    /// Restreindre les imports aux hôtes de `allowed_hosts`
    pub strict_allowlist: bool,

    /// Hôtes (et leurs sous-domaines) acceptés en mode strict
    pub allowed_hosts: Vec<String>,
}

impl Default for SecurityPolicy {
    fn default() -> Self {
        Self {
            allowed_private_hosts: Vec::new(),
            strict_allowlist: false,
            allowed_hosts: [
                "raw.githubusercontent.com",
                "cdn.jsdelivr.net",
                "unpkg.com",
                "data.humdata.org",
                "naciscdn.org",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

/// Emplacements des données de référence (frontières + métadonnées pays).
/// Le chemin local est prioritaire, l'URL sert de repli.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ReferenceSources {
    pub boundary_path: Option<PathBuf>,
    pub boundary_url: Option<String>,
    pub metadata_path: Option<PathBuf>,
    pub metadata_url: Option<String>,
}

/// Compteurs de complexité d'un jeu de données (recalculés à chaque chargement)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DatasetBudgetStats {
    pub feature_count: usize,
    pub vertex_count: usize,
}

/// Clés d'attributs identifiées comme continent / pays
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterFields {
    pub continent_key: Option<String>,
    pub country_key: Option<String>,
}

/// Convertit une valeur d'attribut scalaire en texte ("" pour null)
pub fn value_as_text(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s.clone(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Valeur textuelle d'une propriété de feature, si présente et non nulle
pub fn property_text(feature: &Feature, key: &str) -> Option<String> {
    feature
        .properties
        .as_ref()?
        .get(key)
        .filter(|v| !v.is_null())
        .map(value_as_text)
}
