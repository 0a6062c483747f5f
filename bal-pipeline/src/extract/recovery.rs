//! Instantané de reprise par commune
//!
//! Export BAL CSV archivé, préféré à la BAN quand il existe. Le résultat
//! est déjà groupé : il est repris tel quel. Toute défaillance (réseau,
//! fichier invalide) vaut « pas de reprise disponible » et laisse la
//! main à l'appelant.

use reqwest::Client;
use tracing::debug;

use crate::config::Config;

use super::{ExtractError, ExtractedData};

/// Récupère et parse l'instantané de reprise d'une commune
pub async fn extract_from_recovery(
    client: &Client,
    config: &Config,
    code_commune: &str,
) -> Result<ExtractedData, ExtractError> {
    let url = config.recovery_url(code_commune);
    debug!(%url, "fetching recovery snapshot");

    let corps = client
        .get(&url)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|err| ExtractError::unavailable(&url, err))?
        .bytes()
        .await
        .map_err(|err| ExtractError::unavailable(&url, err))?;

    let resultat = bal::import::from_bytes(&corps);
    if !resultat.is_valid {
        return Err(ExtractError::unavailable(&url, "malformed BAL CSV"));
    }

    if !resultat.rejected.is_empty() {
        debug!(
            rejected = resultat.rejected.len(),
            "rows rejected in recovery snapshot"
        );
    }

    Ok(ExtractedData {
        voies: resultat.voies,
        numeros: resultat.numeros,
    })
}
