//! Annuaire des communes
//!
//! Le nom d'affichage d'une commune est résolu par un collaborateur
//! injecté, jamais par une table globale : le pipeline reste testable avec
//! un annuaire de fixtures.

use std::collections::HashMap;

use anyhow::{Context, Result};
use reqwest::Client;
use tracing::info;

use crate::config::Config;

/// Résolution du nom d'affichage d'une commune
pub trait CommuneDirectory {
    /// Nom de la commune, si elle est connue de l'annuaire
    fn nom(&self, code_commune: &str) -> Option<&str>;
}

/// Annuaire en mémoire, indexé par code INSEE
#[derive(Debug, Clone, Default)]
pub struct CommunesIndex {
    noms: HashMap<String, String>,
}

impl CommunesIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Construit un annuaire depuis des paires (code, nom)
    pub fn from_pairs<I, C, N>(paires: I) -> Self
    where
        I: IntoIterator<Item = (C, N)>,
        C: Into<String>,
        N: Into<String>,
    {
        let noms = paires
            .into_iter()
            .map(|(code, nom)| (code.into(), nom.into()))
            .collect();
        Self { noms }
    }

    pub fn insert(&mut self, code: impl Into<String>, nom: impl Into<String>) {
        self.noms.insert(code.into(), nom.into());
    }

    pub fn len(&self) -> usize {
        self.noms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.noms.is_empty()
    }
}

impl CommuneDirectory for CommunesIndex {
    fn nom(&self, code_commune: &str) -> Option<&str> {
        self.noms.get(code_commune).map(String::as_str)
    }
}

/// Charge l'annuaire depuis le jeu des contours administratifs (communes,
/// puis arrondissements municipaux qui portent leur propre code)
pub async fn load_communes(client: &Client, config: &Config) -> Result<CommunesIndex> {
    let mut index = CommunesIndex::new();

    for url in [&config.communes_url, &config.arrondissements_url] {
        let features = fetch_features(client, url).await?;
        for feature in features {
            let proprietes = &feature["properties"];
            if let (Some(code), Some(nom)) =
                (proprietes["code"].as_str(), proprietes["nom"].as_str())
            {
                index.insert(code, nom);
            }
        }
    }

    info!(communes = index.len(), "communes directory loaded");
    Ok(index)
}

async fn fetch_features(client: &Client, url: &str) -> Result<Vec<serde_json::Value>> {
    let corps: serde_json::Value = client
        .get(url)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .context(format!("Failed to fetch {url}"))?
        .json()
        .await
        .context(format!("Failed to parse {url}"))?;

    Ok(corps["features"].as_array().cloned().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_communes_index() {
        let index = CommunesIndex::from_pairs([("54084", "Mont-Bonvillers"), ("75056", "Paris")]);

        assert_eq!(index.nom("54084"), Some("Mont-Bonvillers"));
        assert_eq!(index.nom("75056"), Some("Paris"));
        assert_eq!(index.nom("00000"), None);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_communes_index_vide() {
        let index = CommunesIndex::new();
        assert!(index.is_empty());
        assert_eq!(index.nom("54084"), None);
    }
}
