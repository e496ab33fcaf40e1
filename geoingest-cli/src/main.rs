//! Point d'entrée CLI pour geoingest

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

use geoingest_cli::Config;

// Charger .env au démarrage
fn load_env() {
    if dotenvy::dotenv().is_err() {
        // Essayer depuis le répertoire du binaire
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

mod cli;

use cli::Commands;

/// Charger, filtrer, classifier et exporter des données vectorielles
#[derive(Parser)]
#[command(name = "geoingest")]
#[command(author, version)]
#[command(about = "Load, filter, classify and export vector geodata from files or URLs")]
#[command(long_about = "Loads GeoJSON, CSV or zipped shapefiles from a local file or an https URL under size, time and complexity budgets.\n\nContinent and country fields are detected from the attribute table, or derived from world boundaries when missing.")]
struct Cli {
    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Fichier de configuration JSON
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Accepter sans confirmation les jeux proches des limites
    #[arg(short, long, global = true)]
    yes: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Charger .env avant tout
    load_env();

    let cli = Cli::parse();

    // Configurer le logging
    init_logging(cli.verbose, cli.quiet);

    let config = Config::resolve(cli.config.as_deref())?;

    match cli.command {
        Commands::Inspect { source, report } => {
            info!(source = %source, "Inspect");
            cli::cmd_inspect(&config, &source, report.as_deref(), cli.yes).await?;
        }
        Commands::Classify {
            source,
            class,
            filter,
        } => {
            info!(source = %source, attribute = %class.attribute, "Classify");
            cli::cmd_classify(&config, &source, &class, &filter, cli.yes).await?;
        }
        Commands::Export {
            source,
            output,
            attribute,
            method,
            classes,
            filter,
        } => {
            info!(source = %source, output = %output.display(), "Export vers GeoJSON");
            cli::cmd_export(
                &config,
                &source,
                &output,
                attribute.as_deref(),
                method,
                classes,
                &filter,
                cli.yes,
            )
            .await?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}
