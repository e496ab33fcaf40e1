//! Configuration de l'application

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use geoingest::{
    BoundaryCache, ClassificationMethod, ConfirmLoad, HttpFetch, Importer, Limits,
    ReferenceSources, ReqwestFetcher, SecurityPolicy, Session,
};
use serde::{Deserialize, Serialize};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration principale ; chaque section est optionnelle
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Budgets d'import
    pub limits: Limits,

    /// Politique d'hôtes distants
    pub security: SecurityPolicy,

    /// Frontières mondiales et métadonnées pays
    pub reference: ReferenceSources,

    /// Valeurs par défaut de classification
    pub classification: ClassificationDefaults,
}

/// Méthode et nombre de classes utilisés quand la CLI ne les précise pas
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClassificationDefaults {
    #[serde(with = "method_name")]
    pub method: ClassificationMethod,
    pub classes: usize,
}

impl Default for ClassificationDefaults {
    fn default() -> Self {
        Self {
            method: ClassificationMethod::NaturalBreaks,
            classes: 5,
        }
    }
}

mod method_name {
    use geoingest::ClassificationMethod;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(method: &ClassificationMethod, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(method)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<ClassificationMethod, D::Error> {
        let raw = String::deserialize(d)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl Config {
    /// Charge une configuration depuis un fichier
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content).context("Failed to parse config JSON")
    }

    /// Fichier si fourni, sinon valeurs par défaut ; puis surcharges d'environnement
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Transport HTTP de production
    pub fn fetcher(&self) -> Result<Arc<dyn HttpFetch>> {
        let fetcher = ReqwestFetcher::new(self.security.clone(), CONNECT_TIMEOUT)
            .context("Failed to create HTTP client")?;
        Ok(Arc::new(fetcher))
    }

    /// Session vide dont l'index des frontières sera chargé à la demande
    pub fn session(&self, fetcher: Arc<dyn HttpFetch>) -> Session {
        Session::new(BoundaryCache::new(
            self.reference.clone(),
            fetcher,
            self.limits.clone(),
            self.security.clone(),
        ))
    }

    pub fn importer(&self, fetcher: Arc<dyn HttpFetch>, confirm: Arc<dyn ConfirmLoad>) -> Importer {
        Importer::new(self.limits.clone(), self.security.clone(), fetcher, confirm)
    }

    /// Applique les variables `GEOINGEST_*` ; `lookup` abstrait l'environnement
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = non_empty("GEOINGEST_BOUNDARY_PATH") {
            self.reference.boundary_path = Some(PathBuf::from(path));
        }
        if let Some(url) = non_empty("GEOINGEST_BOUNDARY_URL") {
            self.reference.boundary_url = Some(url);
        }
        if let Some(path) = non_empty("GEOINGEST_METADATA_PATH") {
            self.reference.metadata_path = Some(PathBuf::from(path));
        }
        if let Some(url) = non_empty("GEOINGEST_METADATA_URL") {
            self.reference.metadata_url = Some(url);
        }
        if let Some(flag) = non_empty("GEOINGEST_STRICT_HOSTS") {
            self.security.strict_allowlist = matches!(
                flag.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
    }
}
