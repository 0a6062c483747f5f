//! Projection Lambert 93 (EPSG:2154)
//!
//! Lambert Conformal Conic avec 2 parallèles standards, sens direct
//! (géographique → plan)

use super::ellipsoid::GRS80;

/// Paramètres Lambert 93 (EPSG:2154)
struct Lambert93 {
    /// Longitude origine (méridien de référence RGF93 = Greenwich)
    lon0: f64,
    /// Latitude origine
    lat0: f64,
    /// Premier parallèle standard
    lat1: f64,
    /// Deuxième parallèle standard
    lat2: f64,
    /// False easting
    x0: f64,
    /// False northing
    y0: f64,
}

impl Default for Lambert93 {
    fn default() -> Self {
        Self {
            lon0: 3.0_f64.to_radians(),  // 3°E
            lat0: 46.5_f64.to_radians(), // 46.5°N
            lat1: 44.0_f64.to_radians(), // 44°N
            lat2: 49.0_f64.to_radians(), // 49°N
            x0: 700000.0,                // False easting
            y0: 6600000.0,               // False northing
        }
    }
}

/// Calcule la latitude isométrique
fn isometric_latitude(lat: f64, e: f64) -> f64 {
    let sin_lat = lat.sin();
    let term = ((1.0 - e * sin_lat) / (1.0 + e * sin_lat)).powf(e / 2.0);
    ((std::f64::consts::FRAC_PI_4 + lat / 2.0).tan() * term).ln()
}

/// Calcule le grand normal (rayon de courbure dans le plan vertical)
fn grande_normale(lat: f64, a: f64, e2: f64) -> f64 {
    a / (1.0 - e2 * lat.sin().powi(2)).sqrt()
}

/// Convertit des coordonnées géographiques WGS84 (degrés) vers Lambert 93
pub fn geographic_to_lambert93(lon_deg: f64, lat_deg: f64) -> (f64, f64) {
    let params = Lambert93::default();
    let e = GRS80::E;
    let e2 = GRS80::E2;
    let a = GRS80::A;

    let lon = lon_deg.to_radians();
    let lat = lat_deg.to_radians();

    // Calcul des constantes de la projection
    let n1 = grande_normale(params.lat1, a, e2);
    let n2 = grande_normale(params.lat2, a, e2);

    let iso_lat1 = isometric_latitude(params.lat1, e);
    let iso_lat2 = isometric_latitude(params.lat2, e);
    let iso_lat0 = isometric_latitude(params.lat0, e);

    // Exposant de la projection
    let n = (n1 * params.lat1.cos()).ln() - (n2 * params.lat2.cos()).ln();
    let n = n / (iso_lat2 - iso_lat1);

    // Constante C
    let c = (n1 * params.lat1.cos() / n) * (n * iso_lat1).exp();

    // Rayon à l'origine
    let r0 = c * (-n * iso_lat0).exp();

    // Rayon et angle du point projeté
    let iso_lat = isometric_latitude(lat, e);
    let r = c * (-n * iso_lat).exp();
    let gamma = n * (lon - params.lon0);

    let x = params.x0 + r * gamma.sin();
    let y = params.y0 + r0 - r * gamma.cos();

    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paris() {
        // Tour Eiffel: 2.2945°E, 48.8584°N
        let (x, y) = geographic_to_lambert93(2.2945, 48.8584);

        // Lambert 93 attendu: environ (648237, 6862275)
        assert!((x - 648237.0).abs() < 500.0, "x={}", x);
        assert!((y - 6862275.0).abs() < 500.0, "y={}", y);
    }

    #[test]
    fn test_marseille() {
        // Vieux-Port: 5.37°E, 43.30°N
        let (x, y) = geographic_to_lambert93(5.37, 43.30);

        assert!((x - 892000.0).abs() < 5000.0, "x={}", x);
        assert!((y - 6246000.0).abs() < 5000.0, "y={}", y);
    }
}
