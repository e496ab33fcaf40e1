//! Rapport de chargement
//!
//! Résume un import (réussi, dégradé, annulé ou échoué) pour la console
//! et pour un fichier JSON.

use std::path::Path;

use anyhow::{Context, Result};
use geoingest::{ErrorKind, FieldSource, GeoIngestError, ImportOutcome};
use serde::Serialize;

/// Statut global du chargement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoadStatus {
    /// Chargé, champs résolus sans repli
    Success,
    /// Chargé avec repli ou avertissements
    Degraded,
    /// Confirmation refusée, aucune couche ajoutée
    Canceled,
    /// Chargement échoué
    Failed,
}

/// Résolution d'un champ de filtre
#[derive(Debug, Clone, Serialize)]
pub struct FieldReport {
    pub key: Option<String>,
    pub source: FieldSource,
    /// Règle d'inférence qui a retenu la colonne
    pub rule: Option<&'static str>,
}

/// Rapport complet de chargement
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub source: String,
    pub status: LoadStatus,
    pub duration_secs: f64,

    pub features: usize,
    pub vertices: usize,
    pub near_limit: bool,

    pub continent: Option<FieldReport>,
    pub country: Option<FieldReport>,
    pub spatially_tagged: usize,

    /// Valeurs distinctes des champs détectés (ordre d'apparition)
    pub continents: Vec<String>,
    pub countries: Vec<String>,

    pub warnings: Vec<String>,
    /// Message d'erreur (statut `Failed`)
    pub error: Option<String>,
    pub error_kind: Option<ErrorKind>,
}

impl LoadReport {
    fn empty(source: &str, status: LoadStatus) -> Self {
        Self {
            source: source.to_string(),
            status,
            duration_secs: 0.0,
            features: 0,
            vertices: 0,
            near_limit: false,
            continent: None,
            country: None,
            spatially_tagged: 0,
            continents: Vec::new(),
            countries: Vec::new(),
            warnings: Vec::new(),
            error: None,
            error_kind: None,
        }
    }

    /// Rapport d'un import abouti
    pub fn from_outcome(outcome: &ImportOutcome) -> Self {
        let status = if outcome.is_degraded() {
            LoadStatus::Degraded
        } else {
            LoadStatus::Success
        };

        Self {
            duration_secs: outcome.duration_ms as f64 / 1000.0,
            features: outcome.stats.feature_count,
            vertices: outcome.stats.vertex_count,
            near_limit: outcome.near_limit,
            continent: Some(FieldReport {
                key: outcome.fields.continent_key.clone(),
                source: outcome.continent_source,
                rule: outcome.continent_rule,
            }),
            country: Some(FieldReport {
                key: outcome.fields.country_key.clone(),
                source: outcome.country_source,
                rule: outcome.country_rule,
            }),
            spatially_tagged: outcome.spatially_tagged,
            warnings: outcome.warnings.clone(),
            ..Self::empty(&outcome.label, status)
        }
    }

    /// Rapport d'un import interrompu ; un refus de confirmation donne `Canceled`
    pub fn from_error(source: &str, error: &GeoIngestError) -> Self {
        if error.kind() == ErrorKind::UserCanceled {
            return Self::empty(source, LoadStatus::Canceled);
        }
        Self {
            error: Some(error.to_string()),
            error_kind: Some(error.kind()),
            ..Self::empty(source, LoadStatus::Failed)
        }
    }

    /// Renseigne les valeurs distinctes affichées dans le résumé
    pub fn with_values(mut self, continents: Vec<String>, countries: Vec<String>) -> Self {
        self.continents = continents;
        self.countries = countries;
        self
    }

    /// Affiche le rapport sur la console
    pub fn display(&self) {
        println!("\n{}", "=".repeat(60));
        println!("LOAD REPORT - {}", self.source);
        println!("{}", "=".repeat(60));

        println!("\nStatus: {:?}", self.status);
        println!("Duration: {:.2}s", self.duration_secs);

        if let Some(ref error) = self.error {
            println!("Error: {}", error);
        }

        if matches!(self.status, LoadStatus::Success | LoadStatus::Degraded) {
            println!("\n--- SUMMARY ---");
            println!("Features: {}", self.features);
            println!("Vertices: {}", self.vertices);
            if self.near_limit {
                println!("Near configured limits (confirmed)");
            }

            println!("\n--- FIELDS ---");
            print_field("Continent", self.continent.as_ref(), &self.continents);
            print_field("Country", self.country.as_ref(), &self.countries);
            if self.spatially_tagged > 0 {
                println!("  {} features tagged from world boundaries", self.spatially_tagged);
            }
        }

        if !self.warnings.is_empty() {
            println!("\n--- WARNINGS ({}) ---", self.warnings.len());
            for w in self.warnings.iter().take(10) {
                println!("  {}", w);
            }
            if self.warnings.len() > 10 {
                println!("  ... and {} more", self.warnings.len() - 10);
            }
        }

        println!("\n{}", "=".repeat(60));
    }

    /// Sauvegarde le rapport en JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .context(format!("Failed to write report: {}", path.display()))?;
        Ok(())
    }

    /// Affichage compact pour le résumé
    pub fn summary(&self) -> String {
        match self.status {
            LoadStatus::Canceled => format!("{}: canceled", self.source),
            LoadStatus::Failed => format!(
                "{}: failed ({})",
                self.source,
                self.error.as_deref().unwrap_or("unknown error")
            ),
            _ => format!(
                "{}: {} features, {} vertices, {} warnings",
                self.source,
                self.features,
                self.vertices,
                self.warnings.len()
            ),
        }
    }
}

fn print_field(name: &str, field: Option<&FieldReport>, values: &[String]) {
    let Some(field) = field else { return };
    match field.key {
        Some(ref key) => {
            let rule = field.rule.map(|r| format!(", rule {}", r)).unwrap_or_default();
            println!("  {}: {} ({:?}{})", name, key, field.source, rule);
            if !values.is_empty() {
                let shown: Vec<_> = values.iter().take(15).map(String::as_str).collect();
                let more = values.len().saturating_sub(shown.len());
                if more > 0 {
                    println!("    {} ... and {} more", shown.join(", "), more);
                } else {
                    println!("    {}", shown.join(", "));
                }
            }
        }
        None => println!("  {}: not found", name),
    }
}
