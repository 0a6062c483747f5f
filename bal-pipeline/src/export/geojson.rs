//! Export GeoJSON en flux
//!
//! Transforme les enregistrements voies / numéros / toponymes en Features
//! ponctuelles, sans matérialiser le corpus : les trois curseurs d'entrée
//! sont consommés paresseusement, en un seul passage.

use std::io::Write;

use geojson::{Feature, Geometry, JsonObject, Value};
use serde_json::json;

use bal::types::{Numero, Position, Toponyme, Voie};

/// Transforme trois curseurs indépendants en séquence paresseuse de
/// Features ponctuelles, dans l'ordre voies, numéros, toponymes.
///
/// Les coordonnées émises sont géodésiques, reprises telles quelles de la
/// position de l'enregistrement (la projection plane est propre à l'export
/// CSV). Un enregistrement sans position exploitable est sauté, jamais
/// émis en géométrie vide. Mémoire bornée par l'enregistrement courant.
pub fn stream_features<V, N, T>(
    voies: V,
    numeros: N,
    toponymes: T,
) -> impl Iterator<Item = Feature>
where
    V: IntoIterator<Item = Voie>,
    N: IntoIterator<Item = Numero>,
    T: IntoIterator<Item = Toponyme>,
{
    voies
        .into_iter()
        .filter_map(voie_feature)
        .chain(numeros.into_iter().filter_map(numero_feature))
        .chain(toponymes.into_iter().filter_map(toponyme_feature))
}

/// Écrit une FeatureCollection au fil de l'eau dans `writer`
pub fn write_feature_collection<W: Write>(
    mut writer: W,
    features: impl Iterator<Item = Feature>,
) -> std::io::Result<()> {
    write!(writer, r#"{{"type":"FeatureCollection","features":["#)?;

    for (i, feature) in features.enumerate() {
        if i > 0 {
            write!(writer, ",")?;
        }
        serde_json::to_writer(&mut writer, &feature)?;
    }

    write!(writer, "]}}")?;
    writer.flush()
}

fn point(position: &Position) -> Geometry {
    Geometry::new(Value::Point(vec![position.lon, position.lat]))
}

fn feature(geometry: Geometry, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(geometry),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Propriétés communes de position (type et provenance)
fn proprietes_position(properties: &mut JsonObject, position: &Position) {
    properties.insert("positionType".to_string(), json!(position.kind.as_str()));
    if let Some(source) = &position.source {
        properties.insert("source".to_string(), json!(source));
    }
}

fn voie_feature(voie: Voie) -> Option<Feature> {
    let position = voie.positions.first()?;

    let mut properties = JsonObject::new();
    properties.insert("type".to_string(), json!("voie"));
    properties.insert("nom".to_string(), json!(voie.nom));
    properties.insert("commune".to_string(), json!(voie.commune));
    proprietes_position(&mut properties, position);

    Some(feature(point(position), properties))
}

fn numero_feature(numero: Numero) -> Option<Feature> {
    let position = numero.positions.first()?;

    let mut properties = JsonObject::new();
    properties.insert("type".to_string(), json!("numero"));
    properties.insert("numero".to_string(), json!(numero.numero));
    if let Some(suffixe) = &numero.suffixe {
        properties.insert("suffixe".to_string(), json!(suffixe));
    }
    properties.insert("commune".to_string(), json!(numero.commune));
    properties.insert("idVoie".to_string(), json!(numero.voie.to_string()));
    proprietes_position(&mut properties, position);

    Some(feature(point(position), properties))
}

fn toponyme_feature(toponyme: Toponyme) -> Option<Feature> {
    let position = toponyme.positions.first()?;

    let mut properties = JsonObject::new();
    properties.insert("type".to_string(), json!("toponyme"));
    properties.insert("nom".to_string(), json!(toponyme.nom));
    properties.insert("commune".to_string(), json!(toponyme.commune));
    proprietes_position(&mut properties, position);

    Some(feature(point(position), properties))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bal::types::PositionKind;

    fn position(lon: f64, lat: f64) -> Position {
        Position::new(PositionKind::Entree, Some("Mairie".to_string()), lon, lat)
    }

    #[test]
    fn test_stream_features_ordre_et_filtrage() {
        let mut voie = Voie::new("54084", "allée des acacias");
        voie.positions.push(position(5.834072, 49.324156));
        let voie_sans_position = Voie::new("54084", "rue des aulnes");

        let mut numero = Numero::new(voie.id, "54084", 6);
        numero.positions.push(position(5.83315, 49.324433));
        let numero_sans_position = Numero::new(voie.id, "54084", 1);

        let mut toponyme = Toponyme::new("54084", "Le Paquis");
        toponyme.positions.push(position(5.83, 49.32));

        let features: Vec<Feature> = stream_features(
            vec![voie, voie_sans_position],
            vec![numero, numero_sans_position],
            vec![toponyme],
        )
        .collect();

        // Les enregistrements non positionnés sont sautés
        assert_eq!(features.len(), 3);

        let types: Vec<&str> = features
            .iter()
            .map(|f| {
                f.properties
                    .as_ref()
                    .and_then(|p| p.get("type"))
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
            })
            .collect();
        assert_eq!(types, ["voie", "numero", "toponyme"]);
    }

    #[test]
    fn test_stream_features_geometrie_geodesique() {
        let mut numero = Numero::new(uuid::Uuid::new_v4(), "54084", 6);
        numero.positions.push(position(5.83315, 49.324433));
        numero.positions.push(position(5.9, 49.4));

        let features: Vec<Feature> = stream_features(vec![], vec![numero], vec![]).collect();
        assert_eq!(features.len(), 1);

        // Première position de l'enregistrement, coordonnées non projetées
        match &features[0].geometry {
            Some(Geometry {
                value: Value::Point(coordonnees),
                ..
            }) => assert_eq!(coordonnees, &vec![5.83315, 49.324433]),
            autre => panic!("unexpected geometry: {autre:?}"),
        }
    }

    #[test]
    fn test_stream_features_vide() {
        let features: Vec<Feature> = stream_features(vec![], vec![], vec![]).collect();
        assert!(features.is_empty());
    }

    #[test]
    fn test_write_feature_collection() {
        let mut voie = Voie::new("54084", "allée des acacias");
        voie.positions.push(position(5.834072, 49.324156));

        let mut sortie = Vec::new();
        write_feature_collection(
            &mut sortie,
            stream_features(vec![voie], vec![], vec![]),
        )
        .unwrap();

        let texte = String::from_utf8(sortie).unwrap();
        assert!(texte.starts_with(r#"{"type":"FeatureCollection","features":["#));
        assert!(texte.ends_with("]}"));
        assert!(texte.contains(r#""type":"Point""#));

        // Le document produit doit rester du JSON valide
        let document: serde_json::Value = serde_json::from_str(&texte).unwrap();
        assert_eq!(document["features"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_write_feature_collection_vide() {
        let mut sortie = Vec::new();
        write_feature_collection(&mut sortie, stream_features(vec![], vec![], vec![])).unwrap();
        assert_eq!(
            String::from_utf8(sortie).unwrap(),
            r#"{"type":"FeatureCollection","features":[]}"#
        );
    }
}
