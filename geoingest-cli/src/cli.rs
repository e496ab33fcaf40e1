//! Définition et implémentation des commandes CLI
//!
//! - `inspect`: statistiques et champs détectés
//! - `classify`: bornes et couleurs d'un attribut
//! - `export`: couche filtrée (et stylée) vers GeoJSON

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use tracing::{info, warn};

use geoingest::{
    distinct_values, ClassValues, ClassificationMethod, ClassificationState, ConfirmLoad,
    ErrorKind, ImportOutcome, ImportSource, LayerId, Session,
};
use geoingest_cli::{export_to_geojson, AutoConfirm, Config, LoadReport, StdinConfirm};

#[derive(Subcommand)]
pub enum Commands {
    /// Load a dataset and print its statistics and detected fields
    Inspect {
        /// File path or https URL
        source: String,

        /// Save the load report as JSON
        #[arg(short, long)]
        report: Option<PathBuf>,
    },

    /// Classify a numeric or categorical attribute
    Classify {
        /// File path or https URL
        source: String,

        #[command(flatten)]
        class: ClassArgs,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Write the filtered layer to GeoJSON, with class colours when classified
    Export {
        /// File path or https URL
        source: String,

        /// Output GeoJSON file
        #[arg(short, long)]
        output: PathBuf,

        /// Attribute to classify before export
        #[arg(short, long)]
        attribute: Option<String>,

        /// Classification method (equal, quantile, jenks, unique)
        #[arg(short, long)]
        method: Option<ClassificationMethod>,

        /// Number of classes (2-10)
        #[arg(short, long)]
        classes: Option<usize>,

        #[command(flatten)]
        filter: FilterArgs,
    },
}

#[derive(Args)]
pub struct ClassArgs {
    /// Attribute to classify
    #[arg(short, long)]
    pub attribute: String,

    /// Classification method (equal, quantile, jenks, unique)
    #[arg(short, long)]
    pub method: Option<ClassificationMethod>,

    /// Number of classes (2-10)
    #[arg(short, long)]
    pub classes: Option<usize>,
}

#[derive(Args)]
pub struct FilterArgs {
    /// Keep features of this continent (repeatable)
    #[arg(long = "continent")]
    pub continents: Vec<String>,

    /// Keep features of this country (repeatable)
    #[arg(long = "country")]
    pub countries: Vec<String>,
}

/// Couche chargée dans une session
struct Loaded {
    session: Session,
    outcome: ImportOutcome,
}

impl Loaded {
    fn id(&self) -> LayerId {
        self.outcome.layer_id
    }

    fn apply_filters(&mut self, filter: &FilterArgs) {
        let fields = &self.outcome.fields;
        if !filter.continents.is_empty() && fields.continent_key.is_none() {
            warn!("No continent field detected, --continent ignored");
        }
        if !filter.countries.is_empty() && fields.country_key.is_none() {
            warn!("No country field detected, --country ignored");
        }

        let selection = self.session.filter_mut();
        for continent in &filter.continents {
            selection.select_continent(continent);
        }
        for country in &filter.countries {
            selection.select_country(country);
        }
    }

    fn classify(
        &mut self,
        config: &Config,
        attribute: &str,
        method: Option<ClassificationMethod>,
        classes: Option<usize>,
    ) -> Result<&ClassificationState> {
        let method = method.unwrap_or(config.classification.method);
        let classes = classes.unwrap_or(config.classification.classes);
        let id = self.id();

        self.session
            .classify_layer(id, attribute, method, classes)
            .context(format!("Failed to classify attribute '{}'", attribute))
    }
}

/// Importe la source ; `Ok(None)` si l'utilisateur refuse la confirmation
async fn load(
    config: &Config,
    source: &str,
    assume_yes: bool,
    report_path: Option<&Path>,
) -> Result<Option<Loaded>> {
    let fetcher = config.fetcher()?;
    let confirm: Arc<dyn ConfirmLoad> = if assume_yes {
        Arc::new(AutoConfirm)
    } else {
        Arc::new(StdinConfirm)
    };

    let mut session = config.session(fetcher.clone());
    let importer = config.importer(fetcher, confirm);
    let source = ImportSource::parse(source);

    match importer.import(&mut session, &source).await {
        Ok(outcome) => Ok(Some(Loaded { session, outcome })),
        Err(e) => {
            let report = LoadReport::from_error(&source.to_string(), &e);
            if let Some(path) = report_path {
                report.save_to_file(path)?;
            }
            if e.kind() == ErrorKind::UserCanceled {
                info!(source = %source, "Load canceled");
                return Ok(None);
            }
            Err(e).context(format!("Failed to load {}", source))
        }
    }
}

pub async fn cmd_inspect(
    config: &Config,
    source: &str,
    report_path: Option<&Path>,
    assume_yes: bool,
) -> Result<()> {
    let Some(loaded) = load(config, source, assume_yes, report_path).await? else {
        return Ok(());
    };

    let layer = loaded
        .session
        .layer(loaded.id())
        .context("Loaded layer missing from session")?;
    let values = |key: &Option<String>| {
        key.as_deref()
            .map(|k| distinct_values(&layer.collection, k))
            .unwrap_or_default()
    };

    let report = LoadReport::from_outcome(&loaded.outcome).with_values(
        values(&loaded.outcome.fields.continent_key),
        values(&loaded.outcome.fields.country_key),
    );
    report.display();

    if let Some(path) = report_path {
        report.save_to_file(path)?;
        info!(path = %path.display(), "Report saved");
    }

    Ok(())
}

pub async fn cmd_classify(
    config: &Config,
    source: &str,
    class: &ClassArgs,
    filter: &FilterArgs,
    assume_yes: bool,
) -> Result<()> {
    let Some(mut loaded) = load(config, source, assume_yes, None).await? else {
        return Ok(());
    };
    loaded.apply_filters(filter);

    let view = loaded.session.filtered_view(loaded.id())?;
    let state = loaded.classify(config, &class.attribute, class.method, class.classes)?;

    println!("=== {} ({}, {} classes) ===", state.attribute(), state.method(), state.class_count());
    println!("Features: {}", view.features.len());

    if let ClassValues::Breaks(breaks) = state.values() {
        let breaks: Vec<_> = breaks.iter().map(|b| b.to_string()).collect();
        println!("Breaks: {}", breaks.join(", "));
    }

    let mut counts = vec![0usize; state.class_count()];
    for feature in &view.features {
        let class = feature
            .properties
            .as_ref()
            .and_then(|p| p.get(state.attribute()))
            .and_then(|v| state.class_for_value(v));
        if let Some(class) = class {
            counts[class] += 1;
        }
    }

    for ((label, color), count) in state.labels().iter().zip(state.colors()).zip(&counts) {
        println!("  {}  {:<24} {}", color, label, count);
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub async fn cmd_export(
    config: &Config,
    source: &str,
    output: &Path,
    attribute: Option<&str>,
    method: Option<ClassificationMethod>,
    classes: Option<usize>,
    filter: &FilterArgs,
    assume_yes: bool,
) -> Result<()> {
    let Some(mut loaded) = load(config, source, assume_yes, None).await? else {
        return Ok(());
    };
    loaded.apply_filters(filter);

    if let Some(attribute) = attribute {
        loaded.classify(config, attribute, method, classes)?;
    }

    let id = loaded.id();
    let view = loaded.session.filtered_view(id)?;
    let classification = loaded
        .session
        .layer(id)
        .and_then(|l| l.classification.as_ref());

    let written = export_to_geojson(&view, classification, output)?;
    info!(
        output = %output.display(),
        features = written,
        styled = classification.is_some(),
        "GeoJSON written"
    );
    println!("Exported {} features to {}", written, output.display());

    Ok(())
}
