//! Extraction depuis l'export départemental BAN
//!
//! Télécharge l'export CSV gzip du département, filtre les lignes de la
//! commune demandée, puis regroupe les adresses retenues en voies par nom
//! normalisé (minuscules, sans diacritiques) pour que les variantes
//! d'accentuation d'un même nom ne produisent qu'une voie.

use std::collections::{HashMap, HashSet};

use csv::{ReaderBuilder, StringRecord};
use flate2::read::GzDecoder;
use reqwest::Client;
use tracing::{debug, info};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use bal::types::{Numero, Position, PositionKind, Voie};

use crate::config::Config;

use super::{code_departement, ExtractError, ExtractedData};

/// Plafond de qualité de la source : au-delà, le numéro est considéré
/// comme une erreur de saisie et la ligne écartée
const NUMERO_MAX_BAN: u32 = 5000;

/// Adresse retenue de l'export BAN après filtrage
#[derive(Debug, Clone, PartialEq)]
pub struct AdresseBan {
    pub nom_voie: String,
    pub numero: u32,
    pub suffixe: Option<String>,
    pub positions: Vec<Position>,
}

/// Télécharge l'export départemental et reconstruit les voies de la
/// commune. Toute défaillance (réseau, gzip, CSV) est fatale : il n'y a
/// pas d'autre source derrière.
pub async fn extract_from_ban(
    client: &Client,
    config: &Config,
    code_commune: &str,
) -> Result<ExtractedData, ExtractError> {
    let departement = code_departement(code_commune);
    let url = config.ban_url(departement);
    info!(%url, code_commune, "fetching BAN departmental export");

    let corps = client
        .get(&url)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|err| ExtractError::unavailable(&url, err))?
        .bytes()
        .await
        .map_err(|err| ExtractError::unavailable(&url, err))?;

    let adresses = parse_ban_csv(&corps, code_commune)
        .map_err(|err| ExtractError::unavailable(&url, err))?;

    debug!(
        code_commune,
        adresses = adresses.len(),
        "BAN rows retained after filtering"
    );

    Ok(grouper_adresses(code_commune, adresses))
}

/// Décompresse et parse l'export, en ne retenant que les lignes valides de
/// la commune
fn parse_ban_csv(corps: &[u8], code_commune: &str) -> Result<Vec<AdresseBan>, csv::Error> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_reader(GzDecoder::new(corps));

    let entete = reader.headers()?.clone();
    let colonnes: HashMap<&str, usize> = entete
        .iter()
        .enumerate()
        .map(|(i, nom)| (nom.trim(), i))
        .collect();

    let mut adresses = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(adresse) = retenir_adresse(&record, &colonnes, code_commune) {
            adresses.push(adresse);
        }
    }

    Ok(adresses)
}

/// Valeur d'une colonne nommée, si la colonne et le champ existent
fn champ<'r>(record: &'r StringRecord, colonnes: &HashMap<&str, usize>, nom: &str) -> Option<&'r str> {
    colonnes
        .get(nom)
        .and_then(|&idx| record.get(idx))
        .map(str::trim)
}

/// Applique le filtre qualité de la source : nom de voie présent, numéro
/// entier entre 1 et 5000. La position n'est retenue que si les deux
/// coordonnées sont présentes et interprétables.
fn retenir_adresse(
    record: &StringRecord,
    colonnes: &HashMap<&str, usize>,
    code_commune: &str,
) -> Option<AdresseBan> {
    if champ(record, colonnes, "code_insee")? != code_commune {
        return None;
    }

    let nom_voie = champ(record, colonnes, "nom_voie")?;
    if nom_voie.is_empty() {
        return None;
    }

    let numero: u32 = champ(record, colonnes, "numero")?.parse().ok()?;
    if numero == 0 || numero > NUMERO_MAX_BAN {
        return None;
    }

    let suffixe = match champ(record, colonnes, "rep")? {
        "" => None,
        rep => Some(rep.to_lowercase()),
    };

    let mut positions = Vec::new();
    if let (Some(lon), Some(lat)) = (
        champ(record, colonnes, "lon").and_then(coordonnee),
        champ(record, colonnes, "lat").and_then(coordonnee),
    ) {
        positions.push(Position::new(
            PositionKind::Inconnue,
            Some("BAN".to_string()),
            lon,
            lat,
        ));
    }

    Some(AdresseBan {
        nom_voie: nom_voie.to_string(),
        numero,
        suffixe,
        positions,
    })
}

fn coordonnee(valeur: &str) -> Option<f64> {
    if valeur.is_empty() {
        return None;
    }
    valeur.parse().ok().filter(|v: &f64| v.is_finite())
}

/// Regroupe les adresses filtrées en voies par nom normalisé.
///
/// Fonction pure de regroupement : l'ordre des voies suit la première
/// apparition de chaque nom, le libellé conservé est celui de la première
/// adresse du groupe, et les doublons (numero, suffixe) d'un même groupe
/// sont écartés en silence, première occurrence gagnante.
pub fn grouper_adresses(code_commune: &str, adresses: Vec<AdresseBan>) -> ExtractedData {
    let mut ordre: Vec<String> = Vec::new();
    let mut groupes: HashMap<String, Vec<AdresseBan>> = HashMap::new();

    for adresse in adresses {
        let cle = cle_groupement(&adresse.nom_voie);
        if !groupes.contains_key(&cle) {
            ordre.push(cle.clone());
        }
        groupes.entry(cle).or_default().push(adresse);
    }

    let mut voies = Vec::new();
    let mut numeros = Vec::new();
    let mut doublons = 0usize;

    for cle in ordre {
        let groupe = groupes.remove(&cle).unwrap_or_default();
        let voie = Voie::new(code_commune, groupe[0].nom_voie.as_str());

        let mut vus: HashSet<(u32, Option<String>)> = HashSet::new();
        for adresse in groupe {
            if !vus.insert((adresse.numero, adresse.suffixe.clone())) {
                doublons += 1;
                continue;
            }

            let mut numero = Numero::new(voie.id, code_commune, adresse.numero);
            numero.suffixe = adresse.suffixe;
            numero.positions = adresse.positions;
            numeros.push(numero);
        }

        voies.push(voie);
    }

    if doublons > 0 {
        debug!(doublons, "duplicate (numero, suffixe) rows dropped");
    }

    ExtractedData { voies, numeros }
}

/// Clé de regroupement d'un nom de voie : minuscules, sans diacritiques
fn cle_groupement(nom: &str) -> String {
    nom.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}
