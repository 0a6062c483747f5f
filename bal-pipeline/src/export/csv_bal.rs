//! Export au format BAL CSV
//!
//! Une ligne par position de numéro (ligne à position vierge si le numéro
//! n'en a pas), puis les positions portées par la voie elle-même sous le
//! numéro sentinelle 99999. Les lignes sont produites par un itérateur et
//! poussées une à une dans le writer, jamais accumulées.

use std::collections::HashMap;
use std::io::Write;

use chrono::NaiveDate;
use csv::{Terminator, WriterBuilder};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use bal::cle_interop::{format_cle_interop, slugify};
use bal::types::{Numero, Position, Toponyme, Voie, NUMERO_TOPONYME};

use crate::communes::CommuneDirectory;
use crate::projection::{project, ProjectionError};

/// Colonnes du format d'échange, dans l'ordre du protocole
pub const COLONNES: [&str; 14] = [
    "cle_interop",
    "uid_adresse",
    "voie_nom",
    "numero",
    "suffixe",
    "commune_insee",
    "commune_nom",
    "position",
    "long",
    "lat",
    "x",
    "y",
    "source",
    "date_der_maj",
];

/// Erreurs pouvant survenir lors de l'export
#[derive(Debug, Error)]
pub enum ExportError {
    /// Erreur d'écriture du flux de sortie
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Erreur du writer CSV sous-jacent
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Position non projetable
    #[error(transparent)]
    Projection(#[from] ProjectionError),

    /// Clé d'interopérabilité non encodable
    #[error(transparent)]
    Bal(#[from] bal::BalError),
}

/// Ligne du format d'échange.
///
/// Tous les champs sont déjà sérialisés en texte : les nombres en décimal
/// simple, la date en `YYYY-MM-DD`, les champs absents vides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalRow {
    pub cle_interop: String,
    pub uid_adresse: String,
    pub voie_nom: String,
    pub numero: String,
    pub suffixe: String,
    pub commune_insee: String,
    pub commune_nom: String,
    pub position: String,
    pub long: String,
    pub lat: String,
    pub x: String,
    pub y: String,
    pub source: String,
    pub date_der_maj: String,
}

/// Champs partagés par toutes les lignes d'une même entité
struct Entite<'a> {
    code_commune: &'a str,
    code_voie: &'a str,
    nom: &'a str,
    numero: u32,
    suffixe: Option<&'a str>,
    updated: Option<NaiveDate>,
}

/// Construit une ligne du format d'échange.
///
/// Le nom de la commune est résolu par l'annuaire injecté ; les champs de
/// position restent vides quand l'entité n'est pas positionnée.
fn create_row<D: CommuneDirectory>(
    entite: &Entite<'_>,
    position: Option<&Position>,
    directory: &D,
) -> Result<BalRow, ExportError> {
    let cle_interop = format_cle_interop(
        entite.code_commune,
        entite.code_voie,
        entite.numero,
        entite.suffixe,
    )?;

    let mut row = BalRow {
        cle_interop,
        uid_adresse: String::new(),
        voie_nom: entite.nom.to_string(),
        numero: entite.numero.to_string(),
        suffixe: entite.suffixe.unwrap_or("").to_string(),
        commune_insee: entite.code_commune.to_string(),
        commune_nom: directory
            .nom(entite.code_commune)
            .unwrap_or("")
            .to_string(),
        position: String::new(),
        long: String::new(),
        lat: String::new(),
        x: String::new(),
        y: String::new(),
        source: String::new(),
        date_der_maj: entite
            .updated
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
    };

    if let Some(position) = position {
        let (x, y) = project(position.lon, position.lat)?;
        row.position = position.kind.to_string();
        row.long = position.lon.to_string();
        row.lat = position.lat.to_string();
        row.x = x.to_string();
        row.y = y.to_string();
        row.source = position.source.clone().unwrap_or_default();
    }

    Ok(row)
}

/// Lignes d'une voie : ses numéros dans l'ordre d'entrée, puis ses
/// positions propres sous le sentinelle 99999. Une voie sans numéro ni
/// position produit exactement une ligne sentinelle vierge.
fn rows_pour_voie<D: CommuneDirectory>(
    voie: &Voie,
    numeros: &[&Numero],
    directory: &D,
) -> Vec<Result<BalRow, ExportError>> {
    let code_voie = voie
        .code
        .clone()
        .unwrap_or_else(|| slugify(&voie.nom));

    let mut lignes = Vec::new();

    for numero in numeros {
        let entite = Entite {
            code_commune: &numero.commune,
            code_voie: &code_voie,
            nom: &voie.nom,
            numero: numero.numero,
            suffixe: numero.suffixe.as_deref(),
            updated: numero.updated,
        };

        if numero.positions.is_empty() {
            lignes.push(create_row(&entite, None, directory));
        } else {
            for position in &numero.positions {
                lignes.push(create_row(&entite, Some(position), directory));
            }
        }
    }

    let entite = Entite {
        code_commune: &voie.commune,
        code_voie: &code_voie,
        nom: &voie.nom,
        numero: NUMERO_TOPONYME,
        suffixe: None,
        updated: voie.updated,
    };

    if voie.positions.is_empty() {
        if lignes.is_empty() {
            lignes.push(create_row(&entite, None, directory));
        }
    } else {
        for position in &voie.positions {
            lignes.push(create_row(&entite, Some(position), directory));
        }
    }

    lignes
}

/// Lignes d'un toponyme : même politique sentinelle qu'une voie sans
/// numéro, la clé étant dérivée du nom translittéré
fn rows_pour_toponyme<D: CommuneDirectory>(
    toponyme: &Toponyme,
    directory: &D,
) -> Vec<Result<BalRow, ExportError>> {
    let code_voie = slugify(&toponyme.nom);

    let entite = Entite {
        code_commune: &toponyme.commune,
        code_voie: &code_voie,
        nom: &toponyme.nom,
        numero: NUMERO_TOPONYME,
        suffixe: None,
        updated: toponyme.updated,
    };

    if toponyme.positions.is_empty() {
        vec![create_row(&entite, None, directory)]
    } else {
        toponyme
            .positions
            .iter()
            .map(|position| create_row(&entite, Some(position), directory))
            .collect()
    }
}

/// Produit les lignes d'export, paresseusement, dans l'ordre du
/// protocole : les voies dans l'ordre d'entrée (chacune suivie de ses
/// numéros dans l'ordre d'entrée), puis les toponymes.
pub fn rows<'a, D: CommuneDirectory>(
    voies: &'a [Voie],
    numeros: &'a [Numero],
    toponymes: &'a [Toponyme],
    directory: &'a D,
) -> impl Iterator<Item = Result<BalRow, ExportError>> + 'a {
    // Index des numéros par voie ; ne retient que des références
    let mut par_voie: HashMap<Uuid, Vec<&'a Numero>> = HashMap::new();
    for numero in numeros {
        par_voie.entry(numero.voie).or_default().push(numero);
    }

    let lignes_voies = voies.iter().flat_map(move |voie| {
        let numeros_voie = par_voie.remove(&voie.id).unwrap_or_default();
        rows_pour_voie(voie, &numeros_voie, directory)
    });

    let lignes_toponymes = toponymes
        .iter()
        .flat_map(move |toponyme| rows_pour_toponyme(toponyme, directory));

    lignes_voies.chain(lignes_toponymes)
}

/// Exporte le jeu de données en BAL CSV dans `writer`.
///
/// Séparateur `;`, fins de ligne CRLF y compris après la dernière ligne.
/// L'en-tête est toujours émis, même pour un jeu vide. La sortie est
/// écrite au fil de l'eau, ligne à ligne.
pub fn export_as_csv<W: Write, D: CommuneDirectory>(
    voies: &[Voie],
    numeros: &[Numero],
    toponymes: &[Toponyme],
    directory: &D,
    writer: W,
) -> Result<(), ExportError> {
    let mut csv_writer = WriterBuilder::new()
        .delimiter(b';')
        .terminator(Terminator::CRLF)
        .has_headers(false)
        .from_writer(writer);

    csv_writer.write_record(COLONNES)?;

    for row in rows(voies, numeros, toponymes, directory) {
        csv_writer.serialize(row?)?;
    }

    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::communes::CommunesIndex;
    use bal::types::PositionKind;

    fn annuaire() -> CommunesIndex {
        CommunesIndex::from_pairs([("54084", "Mont-Bonvillers")])
    }

    fn date(annee: i32, mois: u32, jour: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(annee, mois, jour)
    }

    #[test]
    fn test_create_row() {
        let entite = Entite {
            code_commune: "54084",
            code_voie: "XXXX",
            nom: "rue des peupliers",
            numero: 12,
            suffixe: Some("bis"),
            updated: date(2019, 1, 1),
        };
        let position = Position::new(
            PositionKind::Entree,
            Some("Mairie".to_string()),
            5.835188,
            49.326038,
        );

        let row = create_row(&entite, Some(&position), &annuaire()).unwrap();

        assert_eq!(
            row,
            BalRow {
                cle_interop: "54084_xxxx_00012_bis".to_string(),
                uid_adresse: String::new(),
                voie_nom: "rue des peupliers".to_string(),
                numero: "12".to_string(),
                suffixe: "bis".to_string(),
                commune_insee: "54084".to_string(),
                commune_nom: "Mont-Bonvillers".to_string(),
                position: "entrée".to_string(),
                long: "5.835188".to_string(),
                lat: "49.326038".to_string(),
                x: "906109.41".to_string(),
                y: "6917751.73".to_string(),
                source: "Mairie".to_string(),
                date_der_maj: "2019-01-01".to_string(),
            }
        );
    }

    #[test]
    fn test_create_row_sans_position() {
        let entite = Entite {
            code_commune: "54084",
            code_voie: "6789",
            nom: "allée des acacias",
            numero: 1,
            suffixe: None,
            updated: None,
        };

        let row = create_row(&entite, None, &annuaire()).unwrap();
        assert_eq!(row.cle_interop, "54084_6789_00001");
        assert_eq!(row.position, "");
        assert_eq!(row.long, "");
        assert_eq!(row.x, "");
        assert_eq!(row.date_der_maj, "");
    }

    #[test]
    fn test_create_row_commune_inconnue() {
        let entite = Entite {
            code_commune: "99999",
            code_voie: "6789",
            nom: "rue du test",
            numero: 1,
            suffixe: None,
            updated: None,
        };
        let row = create_row(&entite, None, &annuaire()).unwrap();
        assert_eq!(row.commune_nom, "");
    }

    fn jeu_de_donnees() -> (Vec<Voie>, Vec<Numero>) {
        let mut voie1 = Voie::new("54084", "allée des acacias");
        voie1.code = Some("6789".to_string());
        voie1.updated = date(2019, 1, 1);
        voie1.positions.push(Position::new(
            PositionKind::Segment,
            Some("Mairie".to_string()),
            5.834072,
            49.324156,
        ));

        let mut voie2 = Voie::new("54084", "rue des aulnes");
        voie2.code = Some("A100".to_string());
        voie2.updated = date(2019, 1, 5);

        let mut numero1 = Numero::new(voie1.id, "54084", 1);
        numero1.suffixe = Some("bis".to_string());
        numero1.updated = date(2019, 2, 1);

        let mut numero2 = Numero::new(voie1.id, "54084", 6);
        numero2.positions.push(Position::new(
            PositionKind::Entree,
            Some("Mairie".to_string()),
            5.83315,
            49.324433,
        ));
        numero2.updated = date(2019, 2, 5);

        (vec![voie1, voie2], vec![numero1, numero2])
    }

    #[test]
    fn test_export_as_csv() {
        let (voies, numeros) = jeu_de_donnees();

        let mut sortie = Vec::new();
        export_as_csv(&voies, &numeros, &[], &annuaire(), &mut sortie).unwrap();

        let attendu = "cle_interop;uid_adresse;voie_nom;numero;suffixe;commune_insee;commune_nom;position;long;lat;x;y;source;date_der_maj\r\n\
54084_6789_00001_bis;;allée des acacias;1;bis;54084;Mont-Bonvillers;;;;;;;2019-02-01\r\n\
54084_6789_00006;;allée des acacias;6;;54084;Mont-Bonvillers;entrée;5.83315;49.324433;905967.72;6917567.98;Mairie;2019-02-05\r\n\
54084_6789_99999;;allée des acacias;99999;;54084;Mont-Bonvillers;segment;5.834072;49.324156;906035.82;6917539.59;Mairie;2019-01-01\r\n\
54084_a100_99999;;rue des aulnes;99999;;54084;Mont-Bonvillers;;;;;;;2019-01-05\r\n";

        assert_eq!(String::from_utf8(sortie).unwrap(), attendu);
    }

    #[test]
    fn test_export_deterministe() {
        let (voies, numeros) = jeu_de_donnees();

        let mut premiere = Vec::new();
        let mut seconde = Vec::new();
        export_as_csv(&voies, &numeros, &[], &annuaire(), &mut premiere).unwrap();
        export_as_csv(&voies, &numeros, &[], &annuaire(), &mut seconde).unwrap();

        assert_eq!(premiere, seconde);
    }

    #[test]
    fn test_export_jeu_vide() {
        let mut sortie = Vec::new();
        export_as_csv(&[], &[], &[], &annuaire(), &mut sortie).unwrap();

        let texte = String::from_utf8(sortie).unwrap();
        assert!(texte.starts_with("cle_interop;"));
        assert!(texte.ends_with("date_der_maj\r\n"));
        assert_eq!(texte.lines().count(), 1);
    }

    #[test]
    fn test_export_numero_multi_positions() {
        let voie = Voie::new("54084", "rue des peupliers");
        let mut numero = Numero::new(voie.id, "54084", 12);
        numero.positions.push(Position::new(PositionKind::Entree, None, 5.83, 49.32));
        numero.positions.push(Position::new(PositionKind::Batiment, None, 5.84, 49.33));
        let voies = vec![voie];
        let numeros = vec![numero];

        let lignes: Vec<BalRow> = rows(&voies, &numeros, &[], &annuaire())
            .collect::<Result<_, _>>()
            .unwrap();

        // Une ligne par position, dans l'ordre de la source
        assert_eq!(lignes.len(), 2);
        assert_eq!(lignes[0].position, "entrée");
        assert_eq!(lignes[1].position, "bâtiment");
        assert_eq!(lignes[0].cle_interop, lignes[1].cle_interop);
    }

    #[test]
    fn test_export_toponyme() {
        let mut toponyme = Toponyme::new("54084", "Le Haut des Vignes");
        toponyme.updated = date(2019, 3, 1);
        toponyme.positions.push(Position::new(
            PositionKind::Segment,
            Some("Mairie".to_string()),
            5.834072,
            49.324156,
        ));

        let lignes: Vec<BalRow> = rows(&[], &[], &[toponyme], &annuaire())
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(lignes.len(), 1);
        assert_eq!(lignes[0].cle_interop, "54084_le-haut-des-vignes_99999");
        assert_eq!(lignes[0].voie_nom, "Le Haut des Vignes");
        assert_eq!(lignes[0].numero, "99999");
    }

    #[test]
    fn test_export_position_invalide() {
        let mut voie = Voie::new("54084", "rue cassée");
        voie.positions.push(Position::new(PositionKind::Segment, None, 200.0, 49.0));

        let erreurs: Vec<_> = rows(&vec![voie], &[], &[], &annuaire()).collect();
        assert!(matches!(
            erreurs[0],
            Err(ExportError::Projection(ProjectionError::InvalidCoordinate { .. }))
        ));
    }
}
