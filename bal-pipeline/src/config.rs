//! Configuration du système
//!
//! Les URLs des sources externes sont surchargeables par variable
//! d'environnement (un `.env` est chargé au démarrage du binaire).

use std::time::Duration;

/// Motif par défaut de l'export BAN départemental (CSV gzip)
const BAN_SOURCE_URL_PATTERN: &str =
    "https://adresse.data.gouv.fr/data/ban/adresses/latest/csv/adresses-<departement>.csv.gz";

/// Motif par défaut des instantanés de reprise par commune (BAL CSV)
const RECOVERY_URL_PATTERN: &str = "https://adresse.data.gouv.fr/data/sbg-recovery/<commune>.csv";

/// Contours administratifs : communes
const COMMUNES_URL: &str =
    "http://etalab-datasets.geo.data.gouv.fr/contours-administratifs/latest/geojson/communes-100m.geojson";

/// Contours administratifs : arrondissements municipaux
const ARRONDISSEMENTS_URL: &str =
    "http://etalab-datasets.geo.data.gouv.fr/contours-administratifs/latest/geojson/arrondissements-municipaux-100m.geojson";

/// Configuration principale
#[derive(Debug, Clone)]
pub struct Config {
    /// Motif d'URL de l'export BAN, paramétré par `<departement>`
    pub ban_source_url_pattern: String,

    /// Motif d'URL des instantanés de reprise, paramétré par `<commune>`
    pub recovery_url_pattern: String,

    /// URL du GeoJSON des communes
    pub communes_url: String,

    /// URL du GeoJSON des arrondissements municipaux
    pub arrondissements_url: String,

    /// Délai maximal d'une requête HTTP
    pub http_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ban_source_url_pattern: BAN_SOURCE_URL_PATTERN.to_string(),
            recovery_url_pattern: RECOVERY_URL_PATTERN.to_string(),
            communes_url: COMMUNES_URL.to_string(),
            arrondissements_url: ARRONDISSEMENTS_URL.to_string(),
            http_timeout: Duration::from_secs(30),
        }
    }
}

impl Config {
    /// Construit la configuration depuis l'environnement
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(valeur) = std::env::var("BAN_SOURCE_URL_PATTERN") {
            config.ban_source_url_pattern = valeur;
        }
        if let Ok(valeur) = std::env::var("RECOVERY_SOURCE_URL_PATTERN") {
            config.recovery_url_pattern = valeur;
        }
        if let Ok(valeur) = std::env::var("CONTOURS_COMMUNES_URL") {
            config.communes_url = valeur;
        }
        if let Ok(valeur) = std::env::var("CONTOURS_ARRONDISSEMENTS_URL") {
            config.arrondissements_url = valeur;
        }
        if let Some(secondes) = std::env::var("HTTP_TIMEOUT")
            .ok()
            .and_then(|valeur| valeur.parse().ok())
        {
            config.http_timeout = Duration::from_secs(secondes);
        }

        config
    }

    /// URL de l'export BAN d'un département
    pub fn ban_url(&self, code_departement: &str) -> String {
        self.ban_source_url_pattern
            .replace("<departement>", code_departement)
    }

    /// URL de l'instantané de reprise d'une commune
    pub fn recovery_url(&self, code_commune: &str) -> String {
        self.recovery_url_pattern.replace("<commune>", code_commune)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ban_url() {
        let config = Config::default();
        assert_eq!(
            config.ban_url("54"),
            "https://adresse.data.gouv.fr/data/ban/adresses/latest/csv/adresses-54.csv.gz"
        );
        assert_eq!(
            config.ban_url("974"),
            "https://adresse.data.gouv.fr/data/ban/adresses/latest/csv/adresses-974.csv.gz"
        );
    }

    #[test]
    fn test_recovery_url() {
        let config = Config::default();
        assert_eq!(
            config.recovery_url("54084"),
            "https://adresse.data.gouv.fr/data/sbg-recovery/54084.csv"
        );
    }
}
