//! Types de données pour le modèle Base Adresse Locale

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Numéro sentinelle des lignes « voie ou toponyme sans numéro »
/// (constante du protocole BAL, valeur fixée par la convention)
pub const NUMERO_TOPONYME: u32 = 99_999;

/// Borne supérieure d'un numéro encodable dans une clé d'interopérabilité
pub const NUMERO_MAX: u32 = 99_999;

/// Type d'une position (énumération fermée du modèle BAL)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionKind {
    /// Entrée principale
    #[serde(rename = "entrée")]
    Entree,
    /// Point de délivrance postale
    #[serde(rename = "délivrance postale")]
    DelivrancePostale,
    /// Bâtiment
    #[serde(rename = "bâtiment")]
    Batiment,
    /// Cage d'escalier
    #[serde(rename = "cage d’escalier")]
    CageEscalier,
    /// Logement
    #[serde(rename = "logement")]
    Logement,
    /// Parcelle cadastrale
    #[serde(rename = "parcelle")]
    Parcelle,
    /// Segment de voie
    #[serde(rename = "segment")]
    Segment,
    /// Service technique
    #[serde(rename = "service technique")]
    ServiceTechnique,
    /// Position de provenance inconnue
    #[serde(rename = "inconnue")]
    Inconnue,
}

impl PositionKind {
    /// Libellé du format d'échange (colonne `position` du BAL CSV)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Entree => "entrée",
            Self::DelivrancePostale => "délivrance postale",
            Self::Batiment => "bâtiment",
            Self::CageEscalier => "cage d’escalier",
            Self::Logement => "logement",
            Self::Parcelle => "parcelle",
            Self::Segment => "segment",
            Self::ServiceTechnique => "service technique",
            Self::Inconnue => "inconnue",
        }
    }

    /// Parse un libellé du format d'échange.
    ///
    /// L'apostrophe typographique et l'apostrophe ASCII sont acceptées
    /// pour « cage d’escalier » (les deux variantes circulent dans les
    /// fichiers publiés).
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "entrée" => Some(Self::Entree),
            "délivrance postale" => Some(Self::DelivrancePostale),
            "bâtiment" => Some(Self::Batiment),
            "cage d’escalier" | "cage d'escalier" => Some(Self::CageEscalier),
            "logement" => Some(Self::Logement),
            "parcelle" => Some(Self::Parcelle),
            "segment" => Some(Self::Segment),
            "service technique" => Some(Self::ServiceTechnique),
            "inconnue" => Some(Self::Inconnue),
            _ => None,
        }
    }
}

impl std::fmt::Display for PositionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PositionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown position type: {s}"))
    }
}

/// Point typé localisant un élément d'adressage.
///
/// Les coordonnées sont géodésiques (degrés, longitude puis latitude).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Type de la position
    pub kind: PositionKind,

    /// Provenance de la donnée (ex: "Mairie", "BAN")
    pub source: Option<String>,

    /// Longitude en degrés
    pub lon: f64,

    /// Latitude en degrés
    pub lat: f64,
}

impl Position {
    pub fn new(kind: PositionKind, source: Option<String>, lon: f64, lat: f64) -> Self {
        Self {
            kind,
            source,
            lon,
            lat,
        }
    }
}

/// Voie nommée d'une commune
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voie {
    /// Identifiant interne (lien numéro → voie)
    pub id: Uuid,

    /// Code INSEE de la commune
    pub commune: String,

    /// Nom d'affichage de la voie
    pub nom: String,

    /// Code voie historique (FANTOIR) s'il est connu
    pub code: Option<String>,

    /// Positions portées directement par la voie (ex: segment)
    pub positions: Vec<Position>,

    /// Date de dernière modification
    pub updated: Option<NaiveDate>,
}

impl Voie {
    /// Crée une voie sans code ni position
    pub fn new(commune: impl Into<String>, nom: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            commune: commune.into(),
            nom: nom.into(),
            code: None,
            positions: Vec::new(),
            updated: None,
        }
    }
}

/// Numéro d'adresse rattaché à une voie
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Numero {
    /// Voie de rattachement
    pub voie: Uuid,

    /// Toponyme complémentaire éventuel
    pub toponyme: Option<Uuid>,

    /// Code INSEE de la commune (toujours celui de la voie parente)
    pub commune: String,

    /// Numéro dans la voie (1 à 99998 ; 99999 est réservé au sentinel)
    pub numero: u32,

    /// Suffixe (bis, ter...), stocké en minuscules
    pub suffixe: Option<String>,

    /// Positions du numéro, dans l'ordre de la source
    pub positions: Vec<Position>,

    /// Commentaire libre du gestionnaire
    pub comment: Option<String>,

    /// Parcelles cadastrales associées
    pub parcelles: Vec<String>,

    /// Date de dernière modification
    pub updated: Option<NaiveDate>,
}

impl Numero {
    /// Crée un numéro rattaché à une voie
    pub fn new(voie: Uuid, commune: impl Into<String>, numero: u32) -> Self {
        Self {
            voie,
            toponyme: None,
            commune: commune.into(),
            numero,
            suffixe: None,
            positions: Vec::new(),
            comment: None,
            parcelles: Vec::new(),
            updated: None,
        }
    }
}

/// Lieu-dit ou autre toponyme non rattaché à un numéro
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Toponyme {
    /// Identifiant interne
    pub id: Uuid,

    /// Code INSEE de la commune
    pub commune: String,

    /// Nom d'affichage
    pub nom: String,

    /// Positions du toponyme
    pub positions: Vec<Position>,

    /// Parcelles cadastrales associées
    pub parcelles: Vec<String>,

    /// Date de dernière modification
    pub updated: Option<NaiveDate>,
}

impl Toponyme {
    pub fn new(commune: impl Into<String>, nom: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            commune: commune.into(),
            nom: nom.into(),
            positions: Vec::new(),
            parcelles: Vec::new(),
            updated: None,
        }
    }
}
