//! Point d'entrée CLI pour bal-pipeline

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

use bal_pipeline::cli::{self, Commands};
use bal_pipeline::Config;

// Charger .env au démarrage
fn load_env() {
    // Chercher .env dans le répertoire courant ou parent
    if dotenvy::dotenv().is_err() {
        // Essayer depuis le répertoire du binaire
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

/// Outils d'échange Base Adresse Locale
#[derive(Parser)]
#[command(name = "bal-pipeline")]
#[command(author, version)]
#[command(about = "Extraire, exporter et valider des Bases Adresses Locales (BAL CSV, GeoJSON)")]
struct Cli {
    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

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

    let config = Config::from_env();

    match cli.command {
        Commands::Extract { commune, output } => {
            cli::cmd_extract(&config, &commune, output.as_deref()).await?;
        }
        Commands::ToGeojson { input, output } => {
            cli::cmd_to_geojson(&input, &output)?;
        }
        Commands::Validate { input } => {
            cli::cmd_validate(&input)?;
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
