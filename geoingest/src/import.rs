//! Pipeline d'import : garde d'entrée, décodage, budget, inférence des
//! champs (avec repli spatial) puis enregistrement de la couche.
//!
//! La couche n'est enregistrée, et la sélection de filtres touchée, qu'une
//! fois toutes les étapes réussies.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use geojson::FeatureCollection;
use serde::Serialize;
use tracing::{info, warn};

use crate::boundary::{tag_continents_from_coords, tag_spatial_fields, CONTINENT_TAG, COUNTRY_TAG};
use crate::budget::{assert_within_limits, confirm_large_load, is_near_limits, ConfirmLoad};
use crate::decode::{decode_dataset, ShapefileDecoder};
use crate::guard::{fetch_with_budget, read_local_file, validate_import_url, HttpFetch};
use crate::schema::detect_filter_fields_explained;
use crate::session::{LayerId, NewLayer, Session};
use crate::types::{DatasetBudgetStats, FilterFields, Limits, SecurityPolicy};
use crate::GeoIngestError;

/// Origine d'un jeu de données
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportSource {
    Url(String),
    File(PathBuf),
}

impl ImportSource {
    /// Une chaîne contenant un schéma (`xxx://`) est une URL, sinon un chemin
    pub fn parse(input: &str) -> Self {
        if input.contains("://") {
            Self::Url(input.trim().to_string())
        } else {
            Self::File(PathBuf::from(input))
        }
    }
}

impl std::fmt::Display for ImportSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Url(url) => f.write_str(url),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Manière dont un champ a été résolu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSource {
    /// Colonne existante (règle d'inférence)
    Schema,
    /// Marquage par frontières de référence
    Spatial,
    /// Boîtes de coordonnées (données de référence indisponibles)
    CoordinateFallback,
    Missing,
}

/// Résumé d'un import réussi
#[derive(Debug, Clone, Serialize)]
pub struct ImportOutcome {
    pub layer_id: LayerId,
    pub label: String,
    pub stats: DatasetBudgetStats,
    pub near_limit: bool,
    pub fields: FilterFields,
    pub continent_source: FieldSource,
    pub country_source: FieldSource,
    pub continent_rule: Option<&'static str>,
    pub country_rule: Option<&'static str>,
    pub spatially_tagged: usize,
    pub warnings: Vec<String>,
    pub duration_ms: u64,
}

impl ImportOutcome {
    /// Import dégradé : un champ n'a pu être résolu que partiellement
    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
            || self.continent_source == FieldSource::CoordinateFallback
            || self.continent_source == FieldSource::Missing
            || self.country_source == FieldSource::Missing
    }
}

/// Importateur configuré (limites, politique, transport, confirmation)
pub struct Importer {
    limits: Limits,
    policy: SecurityPolicy,
    fetcher: Arc<dyn HttpFetch>,
    confirm: Arc<dyn ConfirmLoad>,
    shapefile: Option<Arc<dyn ShapefileDecoder>>,
}

impl Importer {
    pub fn new(
        limits: Limits,
        policy: SecurityPolicy,
        fetcher: Arc<dyn HttpFetch>,
        confirm: Arc<dyn ConfirmLoad>,
    ) -> Self {
        Self {
            limits,
            policy,
            fetcher,
            confirm,
            shapefile: None,
        }
    }

    pub fn with_shapefile_decoder(mut self, decoder: Arc<dyn ShapefileDecoder>) -> Self {
        self.shapefile = Some(decoder);
        self
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Importe `source` dans la session et active la nouvelle couche
    pub async fn import(
        &self,
        session: &mut Session,
        source: &ImportSource,
    ) -> Result<ImportOutcome, GeoIngestError> {
        let start = Instant::now();
        let (label, mut collection) = self.load(source).await?;

        // Budget
        let stats = assert_within_limits(&collection, &label, &self.limits)?;
        let near_limit = is_near_limits(&stats, &self.limits);
        if !confirm_large_load(&stats, &label, &self.limits, self.confirm.as_ref()).await {
            return Err(GeoIngestError::UserCanceled);
        }

        // Champs
        let detection = detect_filter_fields_explained(&collection);
        let mut fields = detection.fields.clone();
        let mut continent_source = source_of(&fields.continent_key);
        let mut country_source = source_of(&fields.country_key);
        let mut warnings = Vec::new();
        let mut spatially_tagged = 0;

        if fields.continent_key.is_none() || fields.country_key.is_none() {
            match session.boundaries().get().await {
                Ok(index) => {
                    spatially_tagged = tag_spatial_fields(&mut collection, &index);
                    if spatially_tagged > 0 {
                        if fields.continent_key.is_none() {
                            fields.continent_key = Some(CONTINENT_TAG.to_string());
                            continent_source = FieldSource::Spatial;
                        }
                        if fields.country_key.is_none() {
                            fields.country_key = Some(COUNTRY_TAG.to_string());
                            country_source = FieldSource::Spatial;
                        }
                    } else {
                        warnings.push("no feature falls inside a reference boundary".to_string());
                    }
                }
                Err(e) => {
                    warn!(label = %label, error = %e, "Reference data unavailable, using coordinate fallback");
                    warnings.push(format!("reference data unavailable: {e}"));
                    let tagged = tag_continents_from_coords(&mut collection);
                    if tagged > 0 && fields.continent_key.is_none() {
                        fields.continent_key = Some(CONTINENT_TAG.to_string());
                        continent_source = FieldSource::CoordinateFallback;
                    }
                }
            }
        }

        let layer_id = session.add_layer(NewLayer {
            label: label.clone(),
            collection,
            stats,
            fields: fields.clone(),
            spatially_tagged,
        });

        let outcome = ImportOutcome {
            layer_id,
            label,
            stats,
            near_limit,
            fields,
            continent_source,
            country_source,
            continent_rule: detection.continent_rule,
            country_rule: detection.country_rule,
            spatially_tagged,
            warnings,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            layer = outcome.layer_id,
            label = %outcome.label,
            features = stats.feature_count,
            vertices = stats.vertex_count,
            degraded = outcome.is_degraded(),
            "Dataset imported"
        );
        Ok(outcome)
    }

    /// Garde d'entrée puis décodage ; retourne le libellé et la collection
    async fn load(&self, source: &ImportSource) -> Result<(String, FeatureCollection), GeoIngestError> {
        match source {
            ImportSource::Url(raw) => {
                let validated = validate_import_url(raw, &self.policy)?;
                let fetched = fetch_with_budget(self.fetcher.as_ref(), &validated.url, &self.limits).await?;
                let label = validated.url.to_string();
                let collection = decode_dataset(
                    fetched.text.as_bytes(),
                    &validated.extension,
                    &label,
                    None,
                    self.shapefile.as_deref(),
                )?;
                Ok((label, collection))
            }
            ImportSource::File(path) => {
                let file = read_local_file(path, &self.limits).await?;
                let collection = decode_dataset(
                    &file.bytes,
                    &file.extension,
                    &file.name,
                    None,
                    self.shapefile.as_deref(),
                )?;
                Ok((file.name, collection))
            }
        }
    }
}

fn source_of(key: &Option<String>) -> FieldSource {
    if key.is_some() {
        FieldSource::Schema
    } else {
        FieldSource::Missing
    }
}
