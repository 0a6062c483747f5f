//! Définition et implémentation des commandes CLI
//!
//! CLI simplifiée:
//! - `extract`: commune → BAL CSV (instantané de reprise, sinon BAN)
//! - `to-geojson`: BAL CSV → FeatureCollection GeoJSON
//! - `validate`: rapport de validation d'un fichier BAL CSV

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Subcommand;
use reqwest::Client;
use tracing::{info, warn};

use crate::communes::{self, CommunesIndex};
use crate::config::Config;
use crate::export::{csv_bal, geojson};
use crate::extract;

#[derive(Subcommand)]
pub enum Commands {
    /// Extract a commune from external sources and export it as BAL CSV
    Extract {
        /// Code INSEE de la commune (ex: 54084)
        #[arg(short, long)]
        commune: String,

        /// Fichier de sortie (stdout par défaut)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Convert a BAL CSV file into a GeoJSON FeatureCollection
    ToGeojson {
        /// Fichier BAL CSV d'entrée
        #[arg(short, long)]
        input: PathBuf,

        /// Fichier GeoJSON de sortie
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Validate a BAL CSV file and report rejected rows
    Validate {
        /// Fichier BAL CSV d'entrée
        #[arg(short, long)]
        input: PathBuf,
    },
}

/// Extrait une commune et écrit le BAL CSV produit
pub async fn cmd_extract(config: &Config, commune: &str, output: Option<&Path>) -> Result<()> {
    let client = Client::builder()
        .timeout(config.http_timeout)
        .build()
        .context("Failed to build HTTP client")?;

    let data = extract::extract(&client, config, commune).await?;
    info!(
        commune,
        voies = data.voies.len(),
        numeros = data.numeros.len(),
        "extraction done"
    );

    // L'annuaire n'est nécessaire que pour la colonne commune_nom : son
    // indisponibilité dégrade l'export, elle ne l'empêche pas
    let annuaire = match communes::load_communes(&client, config).await {
        Ok(annuaire) => annuaire,
        Err(err) => {
            warn!(%err, "communes directory unavailable, commune_nom left empty");
            CommunesIndex::new()
        }
    };

    match output {
        Some(path) => {
            let fichier = File::create(path)
                .context(format!("Failed to create file: {}", path.display()))?;
            csv_bal::export_as_csv(
                &data.voies,
                &data.numeros,
                &[],
                &annuaire,
                BufWriter::new(fichier),
            )?;
            info!(path = %path.display(), "BAL CSV written");
        }
        None => {
            let stdout = io::stdout();
            csv_bal::export_as_csv(&data.voies, &data.numeros, &[], &annuaire, stdout.lock())?;
        }
    }

    Ok(())
}

/// Convertit un fichier BAL CSV en FeatureCollection GeoJSON
pub fn cmd_to_geojson(input: &Path, output: &Path) -> Result<()> {
    let fichier = File::open(input)
        .context(format!("Failed to open file: {}", input.display()))?;
    let resultat = bal::import::from_reader(fichier)?;

    if !resultat.is_valid {
        return Err(
            bal::BalError::MalformedInput("required header columns missing".to_string()).into(),
        );
    }
    if !resultat.rejected.is_empty() {
        warn!(
            rejected = resultat.rejected.len(),
            "rows rejected during import"
        );
    }

    let sortie = File::create(output)
        .context(format!("Failed to create file: {}", output.display()))?;
    geojson::write_feature_collection(
        BufWriter::new(sortie),
        geojson::stream_features(resultat.voies, resultat.numeros, resultat.toponymes),
    )?;

    info!(path = %output.display(), "GeoJSON written");
    Ok(())
}

/// Valide un fichier BAL CSV et affiche le rapport
pub fn cmd_validate(input: &Path) -> Result<()> {
    let fichier = File::open(input)
        .context(format!("Failed to open file: {}", input.display()))?;
    let resultat = bal::import::from_reader(fichier)?;

    println!("\n{}", "=".repeat(60));
    println!("VALIDATION REPORT - {}", input.display());
    println!("{}", "=".repeat(60));

    if !resultat.is_valid {
        println!("\nStatus: INVALID (required header columns missing)");
        anyhow::bail!("Unusable BAL CSV: required header columns missing");
    }

    println!("\nStatus: {}", if resultat.rejected.is_empty() { "OK" } else { "OK with rejected rows" });
    println!(
        "Rows: {} accepted, {} rejected",
        resultat.accepted,
        resultat.rejected.len()
    );
    println!(
        "Entities: {} voies, {} numeros",
        resultat.voies.len(),
        resultat.numeros.len()
    );

    if !resultat.rejected.is_empty() {
        println!("\n--- REJECTED ({}) ---", resultat.rejected.len());
        for rejet in resultat.rejected.iter().take(20) {
            println!("  {rejet}");
        }
        if resultat.rejected.len() > 20 {
            println!("  ... and {} more", resultat.rejected.len() - 20);
        }
    }

    println!("\n{}", "=".repeat(60));
    Ok(())
}
