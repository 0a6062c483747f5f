//! Import du format BAL CSV
//!
//! Parse un export au format d'échange (voir [`crate::cle_interop`] pour la
//! clé et `bal-pipeline` pour l'écriture), valide chaque ligne et
//! reconstruit le graphe voies / numéros. Les lignes invalides sont
//! écartées et rapportées, jamais fatales : seul un en-tête inutilisable
//! invalide le fichier entier.

use std::collections::HashMap;
use std::io::Read;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, warn};

use crate::cle_interop::{format_cle_interop, parse_cle_interop, slugify};
use crate::error::{BalError, RejectedRow};
use crate::types::{Numero, Position, PositionKind, Toponyme, Voie, NUMERO_TOPONYME};

/// Colonnes sans lesquelles un fichier BAL n'est pas exploitable
const COLONNES_REQUISES: [&str; 4] = ["cle_interop", "voie_nom", "numero", "commune_insee"];

/// Résultat d'un import BAL CSV
#[derive(Debug, Default)]
pub struct ImportResult {
    /// Faux uniquement si le fichier entier est inutilisable (en-tête
    /// absent ou incomplet) ; des lignes rejetées ne l'invalident pas
    pub is_valid: bool,

    /// Voies reconstruites, dans l'ordre de première apparition
    pub voies: Vec<Voie>,

    /// Numéros reconstruits, dans l'ordre de première apparition
    pub numeros: Vec<Numero>,

    /// Toujours vide avec le jeu de colonnes 1.1 : le format ne distingue
    /// pas un toponyme d'une voie sans numéro
    pub toponymes: Vec<Toponyme>,

    /// Nombre de lignes acceptées
    pub accepted: usize,

    /// Lignes écartées, avec leur raison
    pub rejected: Vec<RejectedRow>,
}

impl ImportResult {
    fn invalid() -> Self {
        Self::default()
    }
}

/// Importe un fichier BAL CSV depuis un flux d'octets
pub fn from_reader(mut reader: impl Read) -> Result<ImportResult, BalError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    Ok(from_bytes(&bytes))
}

/// Importe un fichier BAL CSV depuis un tampon d'octets.
///
/// Le contenu est décodé en UTF-8, avec repli ISO-8859-15 pour les exports
/// produits par des outils hérités.
pub fn from_bytes(bytes: &[u8]) -> ImportResult {
    let contenu = decode(bytes);

    let mut reader = ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_reader(contenu.as_bytes());

    let entete = match reader.headers() {
        Ok(entete) => entete.clone(),
        Err(err) => {
            warn!(%err, "unreadable BAL CSV header");
            return ImportResult::invalid();
        }
    };

    let colonnes: HashMap<&str, usize> = entete
        .iter()
        .enumerate()
        .map(|(i, nom)| (nom.trim(), i))
        .collect();

    for colonne in COLONNES_REQUISES {
        if !colonnes.contains_key(colonne) {
            warn!(colonne, "missing required BAL CSV column");
            return ImportResult::invalid();
        }
    }

    let mut resultat = ImportResult {
        is_valid: true,
        ..ImportResult::default()
    };

    // Index de regroupement : voie par (commune, nom), numéro par clé
    let mut index_voies: HashMap<(String, String), usize> = HashMap::new();
    let mut index_numeros: HashMap<String, usize> = HashMap::new();

    for (i, record) in reader.records().enumerate() {
        // L'en-tête occupe la ligne 1 du fichier
        let ligne = i + 2;

        let record = match record {
            Ok(record) => record,
            Err(err) => {
                resultat
                    .rejected
                    .push(RejectedRow::new(ligne, format!("unreadable row: {err}")));
                continue;
            }
        };

        let commune = champ(&record, &colonnes, "commune_insee");
        if commune.is_empty() {
            resultat
                .rejected
                .push(RejectedRow::new(ligne, "empty commune_insee"));
            continue;
        }

        let numero_brut = champ(&record, &colonnes, "numero");
        let numero: u32 = match numero_brut.parse() {
            Ok(numero) => numero,
            Err(_) => {
                resultat.rejected.push(
                    RejectedRow::new(ligne, "invalid numero").with_value(numero_brut),
                );
                continue;
            }
        };
        if numero == 0 || numero > NUMERO_TOPONYME {
            resultat.rejected.push(
                RejectedRow::new(ligne, "numero out of range").with_value(numero_brut),
            );
            continue;
        }

        let position = match parse_position(&record, &colonnes) {
            Ok(position) => position,
            Err(rejet) => {
                resultat.rejected.push(rejet.at_line(ligne));
                continue;
            }
        };

        let voie_nom = champ(&record, &colonnes, "voie_nom").to_string();
        let suffixe = non_vide(champ(&record, &colonnes, "suffixe")).map(|s| s.to_lowercase());
        let cle = parse_cle_interop(champ(&record, &colonnes, "cle_interop"));
        let updated = parse_date(champ(&record, &colonnes, "date_der_maj"));

        // Rattachement à la voie (création à la première occurrence)
        let idx_voie = *index_voies
            .entry((commune.to_string(), voie_nom.clone()))
            .or_insert_with(|| {
                let mut voie = Voie::new(commune, voie_nom.clone());
                voie.code = cle.as_ref().map(|c| c.code_voie.clone());
                resultat.voies.push(voie);
                resultat.voies.len() - 1
            });
        let voie = &mut resultat.voies[idx_voie];

        if numero == NUMERO_TOPONYME {
            // Ligne sentinelle : position et date portées par la voie
            if let Some(position) = position {
                voie.positions.push(position);
            }
            if voie.updated.is_none() {
                voie.updated = updated;
            }
            resultat.accepted += 1;
            continue;
        }

        // Déduplication par clé d'interopérabilité : les lignes partageant
        // une clé agrègent leurs positions sur un même numéro
        let cle_numero = match champ(&record, &colonnes, "cle_interop") {
            "" => format_cle_interop(commune, &slugify(&voie_nom), numero, suffixe.as_deref())
                .unwrap_or_default(),
            cle => cle.to_lowercase(),
        };

        match index_numeros.get(&cle_numero) {
            Some(&idx) => {
                if let Some(position) = position {
                    resultat.numeros[idx].positions.push(position);
                }
            }
            None => {
                let mut entree = Numero::new(voie.id, commune, numero);
                entree.suffixe = suffixe;
                entree.positions = position.into_iter().collect();
                entree.updated = updated;
                index_numeros.insert(cle_numero, resultat.numeros.len());
                resultat.numeros.push(entree);
            }
        }

        resultat.accepted += 1;
    }

    debug!(
        voies = resultat.voies.len(),
        numeros = resultat.numeros.len(),
        accepted = resultat.accepted,
        rejected = resultat.rejected.len(),
        "BAL CSV import done"
    );

    resultat
}

/// Rejet en attente de son numéro de ligne
struct Rejet {
    value: Option<String>,
    reason: String,
}

impl Rejet {
    fn new(reason: &str, value: &str) -> Self {
        Self {
            value: non_vide(value).map(str::to_string),
            reason: reason.to_string(),
        }
    }

    fn at_line(self, ligne: usize) -> RejectedRow {
        RejectedRow {
            line: ligne,
            value: self.value,
            reason: self.reason,
        }
    }
}

/// Valeur d'une colonne nommée, vide si la colonne ou le champ est absent
fn champ<'r>(record: &'r StringRecord, colonnes: &HashMap<&str, usize>, nom: &str) -> &'r str {
    colonnes
        .get(nom)
        .and_then(|&idx| record.get(idx))
        .map(str::trim)
        .unwrap_or("")
}

/// Reconstruit la position d'une ligne.
///
/// Une ligne sans aucun champ de position est valide (numéro non
/// positionné). Dès qu'un champ est renseigné, le type doit être reconnu et
/// la paire de coordonnées entière et finie.
fn parse_position(
    record: &StringRecord,
    colonnes: &HashMap<&str, usize>,
) -> Result<Option<Position>, Rejet> {
    let kind = champ(record, colonnes, "position");
    let lon = champ(record, colonnes, "long");
    let lat = champ(record, colonnes, "lat");
    let source = champ(record, colonnes, "source");

    if kind.is_empty() && lon.is_empty() && lat.is_empty() && source.is_empty() {
        return Ok(None);
    }

    let kind = PositionKind::parse(kind).ok_or_else(|| Rejet::new("unknown position type", kind))?;

    let lon: f64 = lon
        .parse()
        .map_err(|_| Rejet::new("invalid coordinates", lon))?;
    let lat: f64 = lat
        .parse()
        .map_err(|_| Rejet::new("invalid coordinates", lat))?;

    if !lon.is_finite() || !lat.is_finite() {
        return Err(Rejet::new("invalid coordinates", ""));
    }

    Ok(Some(Position::new(
        kind,
        non_vide(source).map(str::to_string),
        lon,
        lat,
    )))
}

fn parse_date(valeur: &str) -> Option<NaiveDate> {
    if valeur.is_empty() {
        return None;
    }
    match NaiveDate::parse_from_str(valeur, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            debug!(valeur, "unparseable date_der_maj, ignored");
            None
        }
    }
}

fn non_vide(valeur: &str) -> Option<&str> {
    if valeur.is_empty() {
        None
    } else {
        Some(valeur)
    }
}

/// Décode les octets d'un fichier BAL (UTF-8, repli ISO-8859-15)
fn decode(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(texte) => texte.to_string(),
        Err(_) => encoding_rs::ISO_8859_15.decode(bytes).0.into_owned(),
    }
}
