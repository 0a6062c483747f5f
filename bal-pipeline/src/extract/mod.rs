//! Extraction des adresses d'une commune depuis les sources externes
//!
//! Deux sources, essayées dans l'ordre : l'instantané de reprise propre à
//! la commune, puis l'export BAN du département. Le repli est un
//! branchement explicite sur un résultat typé, jamais une capture
//! d'exception : « pas d'instantané » est un cas de première classe.

pub mod ban;
pub mod recovery;

use reqwest::Client;
use thiserror::Error;
use tracing::{debug, info};

use bal::types::{Numero, Voie};

use crate::config::Config;

/// Erreurs pouvant survenir lors d'une extraction
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Source externe inaccessible ou illisible
    #[error("Source unavailable: {url}: {reason}")]
    SourceUnavailable { url: String, reason: String },
}

impl ExtractError {
    /// Crée une erreur de source indisponible avec contexte
    pub fn unavailable(url: &str, reason: impl ToString) -> Self {
        Self::SourceUnavailable {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Voies et numéros reconstruits d'une commune
#[derive(Debug, Default)]
pub struct ExtractedData {
    pub voies: Vec<Voie>,
    pub numeros: Vec<Numero>,
}

/// Extrait les adresses d'une commune.
///
/// L'indisponibilité de l'instantané de reprise est avalée (tracée) et
/// déclenche le repli ; l'indisponibilité de l'export BAN est fatale pour
/// la demande, il n'existe pas de troisième source.
pub async fn extract(
    client: &Client,
    config: &Config,
    code_commune: &str,
) -> Result<ExtractedData, ExtractError> {
    match recovery::extract_from_recovery(client, config, code_commune).await {
        Ok(data) => {
            info!(
                code_commune,
                voies = data.voies.len(),
                numeros = data.numeros.len(),
                "recovery snapshot used"
            );
            Ok(data)
        }
        Err(err) => {
            debug!(%err, code_commune, "no recovery snapshot, falling back to BAN");
            ban::extract_from_ban(client, config, code_commune).await
        }
    }
}

/// Code département d'un code commune.
///
/// Deux premiers chiffres, sauf pour l'outre-mer dont les codes commencent
/// par « 97 » et portent un département sur trois chiffres.
pub fn code_departement(code_commune: &str) -> &str {
    if code_commune.starts_with("97") && code_commune.len() >= 3 {
        &code_commune[..3]
    } else if code_commune.len() >= 2 {
        &code_commune[..2]
    } else {
        code_commune
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_departement() {
        assert_eq!(code_departement("54084"), "54");
        assert_eq!(code_departement("75056"), "75");
        // Outre-mer : département sur 3 chiffres
        assert_eq!(code_departement("97411"), "974");
        assert_eq!(code_departement("97209"), "972");
        // Corse
        assert_eq!(code_departement("2A004"), "2A");
        assert_eq!(code_departement("2B033"), "2B");
    }
}
