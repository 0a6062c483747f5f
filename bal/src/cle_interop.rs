//! Clé d'interopérabilité (`cle_interop`)
//!
//! Identifiant textuel inter-systèmes d'un numéro d'adresse :
//! `<commune>_<code voie>_<numéro sur 5 chiffres>[_<suffixe>]`.
//! Le code voie et le suffixe sont abaissés en minuscules, le code commune
//! est repris tel quel.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::error::BalError;
use crate::types::NUMERO_MAX;

/// Construit la clé d'interopérabilité d'un numéro.
///
/// `code_voie` est soit un code voie historique (FANTOIR), soit un nom
/// déjà passé par [`slugify`] : aucune translittération n'est faite ici.
/// Les numéros au-delà de 99999 ne sont pas encodables.
pub fn format_cle_interop(
    code_commune: &str,
    code_voie: &str,
    numero: u32,
    suffixe: Option<&str>,
) -> Result<String, BalError> {
    if numero > NUMERO_MAX {
        return Err(BalError::NumeroOutOfRange(numero));
    }

    let mut cle = format!(
        "{}_{}_{:05}",
        code_commune,
        code_voie.to_lowercase(),
        numero
    );

    if let Some(suffixe) = suffixe {
        if !suffixe.is_empty() {
            cle.push('_');
            cle.push_str(&suffixe.to_lowercase());
        }
    }

    Ok(cle)
}

/// Segments d'une clé d'interopérabilité décodée
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleInterop {
    pub code_commune: String,
    pub code_voie: String,
    pub numero: u32,
    pub suffixe: Option<String>,
}

/// Décompose une clé d'interopérabilité.
///
/// Opération inverse de [`format_cle_interop`], à la casse près : la clé
/// ne conserve pas la casse d'origine du code voie.
pub fn parse_cle_interop(cle: &str) -> Option<CleInterop> {
    let mut parts = cle.split('_');

    let code_commune = parts.next()?.to_string();
    let code_voie = parts.next()?.to_string();
    let numero: u32 = parts.next()?.parse().ok()?;

    if code_commune.is_empty() || code_voie.is_empty() || numero > NUMERO_MAX {
        return None;
    }

    // Tout segment restant appartient au suffixe
    let reste: Vec<&str> = parts.collect();
    let suffixe = if reste.is_empty() {
        None
    } else {
        Some(reste.join("_"))
    };

    Some(CleInterop {
        code_commune,
        code_voie,
        numero,
        suffixe,
    })
}

/// Translittère un nom de voie en segment de clé : minuscules, diacritiques
/// supprimés, toute suite de caractères non alphanumériques réduite à `-`.
pub fn slugify(nom: &str) -> String {
    let depouille: String = nom
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();

    let mut slug = String::with_capacity(depouille.len());
    let mut precedent_separateur = true;

    for c in depouille.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
            precedent_separateur = false;
        } else if !precedent_separateur {
            slug.push('-');
            precedent_separateur = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cle_interop() {
        assert_eq!(
            format_cle_interop("12345", "A100", 12, None).unwrap(),
            "12345_a100_00012"
        );
        assert_eq!(
            format_cle_interop("1a345", "A100", 12, None).unwrap(),
            "1a345_a100_00012"
        );
        assert_eq!(
            format_cle_interop("1a345", "A100", 12, Some("bis")).unwrap(),
            "1a345_a100_00012_bis"
        );
    }

    #[test]
    fn test_format_cle_interop_suffixe_vide() {
        assert_eq!(
            format_cle_interop("54084", "6789", 1, Some("")).unwrap(),
            "54084_6789_00001"
        );
    }

    #[test]
    fn test_format_cle_interop_suffixe_majuscules() {
        assert_eq!(
            format_cle_interop("54084", "6789", 1, Some("BIS")).unwrap(),
            "54084_6789_00001_bis"
        );
    }

    #[test]
    fn test_format_cle_interop_numero_trop_grand() {
        assert!(matches!(
            format_cle_interop("54084", "6789", 100_000, None),
            Err(BalError::NumeroOutOfRange(100_000))
        ));
    }

    #[test]
    fn test_format_cle_interop_sentinelle() {
        // 99999 est la borne, pas au-delà
        assert_eq!(
            format_cle_interop("54084", "a100", 99_999, None).unwrap(),
            "54084_a100_99999"
        );
    }

    #[test]
    fn test_parse_cle_interop() {
        assert_eq!(
            parse_cle_interop("54084_6789_00012_bis"),
            Some(CleInterop {
                code_commune: "54084".to_string(),
                code_voie: "6789".to_string(),
                numero: 12,
                suffixe: Some("bis".to_string()),
            })
        );
        assert_eq!(
            parse_cle_interop("54084_a100_99999"),
            Some(CleInterop {
                code_commune: "54084".to_string(),
                code_voie: "a100".to_string(),
                numero: 99_999,
                suffixe: None,
            })
        );
        assert_eq!(parse_cle_interop("54084_6789"), None);
        assert_eq!(parse_cle_interop("54084_6789_xx"), None);
    }

    #[test]
    fn test_parse_format_roundtrip() {
        let cle = format_cle_interop("54084", "A100", 42, Some("Ter")).unwrap();
        let decode = parse_cle_interop(&cle).unwrap();
        assert_eq!(decode.code_commune, "54084");
        assert_eq!(decode.code_voie, "a100");
        assert_eq!(decode.numero, 42);
        assert_eq!(decode.suffixe.as_deref(), Some("ter"));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Allée des Acacias"), "allee-des-acacias");
        assert_eq!(slugify("Rue de l'Église"), "rue-de-l-eglise");
        assert_eq!(slugify("  Grand' Rue  "), "grand-rue");
        assert_eq!(slugify("Château-Gaillard"), "chateau-gaillard");
    }
}
