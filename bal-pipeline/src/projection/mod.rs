//! Projection légère en Rust pur (sans dépendances externes)
//!
//! L'export BAL CSV publie, en plus des coordonnées géodésiques, la
//! position projetée en Lambert 93 (EPSG:2154) arrondie au centimètre,
//! pour l'interopérabilité avec les outils hérités.

mod ellipsoid;
mod lambert;

use thiserror::Error;

/// Erreur de projection
#[derive(Debug, Error, PartialEq)]
pub enum ProjectionError {
    /// Coordonnée géodésique non finie ou hors bornes (±180, ±90)
    #[error("Invalid coordinate: ({lon}, {lat})")]
    InvalidCoordinate { lon: f64, lat: f64 },
}

/// Arrondit `value` à `precision` décimales.
///
/// Les demi-valeurs sont arrondies à l'écart de zéro, jamais tronquées :
/// `round(1.999999, 2)` vaut `2.0`, pas `1.99`.
pub fn round(value: f64, precision: u8) -> f64 {
    let facteur = 10f64.powi(i32::from(precision));
    (value * facteur).round() / facteur
}

/// Projette une paire géodésique (degrés, WGS84) en Lambert 93.
///
/// Résultat arrondi à 2 décimales (le centimètre). Fonction pure, sans
/// état partagé.
pub fn project(lon: f64, lat: f64) -> Result<(f64, f64), ProjectionError> {
    if !lon.is_finite() || !lat.is_finite() || lon.abs() > 180.0 || lat.abs() > 90.0 {
        return Err(ProjectionError::InvalidCoordinate { lon, lat });
    }

    let (x, y) = lambert::geographic_to_lambert93(lon, lat);
    Ok((round(x, 2), round(y, 2)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round() {
        assert_eq!(round(1.11111111111111, 0), 1.0);
        assert_eq!(round(1.11111111111111, 5), 1.11111);
        assert_eq!(round(1.999999, 2), 2.0);
    }

    #[test]
    fn test_round_negatif() {
        assert_eq!(round(-1.999999, 2), -2.0);
        assert_eq!(round(-0.125, 2), -0.13);
    }

    #[test]
    fn test_project() {
        assert_eq!(project(5.835188, 49.326038).unwrap(), (906109.41, 6917751.73));
        assert_eq!(project(5.83315, 49.324433).unwrap(), (905967.72, 6917567.98));
        assert_eq!(project(5.834072, 49.324156).unwrap(), (906035.82, 6917539.59));
    }

    #[test]
    fn test_project_coordonnees_invalides() {
        assert!(project(f64::NAN, 49.0).is_err());
        assert!(project(5.8, f64::INFINITY).is_err());
        assert!(project(181.0, 49.0).is_err());
        assert!(project(5.8, -90.5).is_err());
    }
}
