//! Métadonnées pays (nom commun, officiel, variantes, région)

use std::collections::HashMap;

use serde::Deserialize;

use crate::types::JsonValue;
use crate::GeoIngestError;

/// Une entrée de la table de métadonnées pays
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CountryMetadata {
    pub name: CountryName,
    pub alt_spellings: Vec<String>,
    pub region: Option<String>,
    pub subregion: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CountryName {
    pub common: Option<String>,
    pub official: Option<String>,
}

impl CountryMetadata {
    /// Continent déduit de la région (les Amériques sont scindées par sous-région)
    pub fn continent(&self) -> Option<&'static str> {
        let region = self.region.as_deref()?.trim().to_ascii_lowercase();
        let subregion = self
            .subregion
            .as_deref()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match region.as_str() {
            "africa" => Some("Africa"),
            "asia" => Some("Asia"),
            "europe" => Some("Europe"),
            "oceania" => Some("Oceania"),
            "antarctic" | "antarctica" => Some("Antarctica"),
            "americas" if subregion == "south america" => Some("South America"),
            "americas" => Some("North America"),
            "north america" => Some("North America"),
            "south america" => Some("South America"),
            _ => None,
        }
    }

    /// Tous les noms connus du pays
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.name
            .common
            .as_deref()
            .into_iter()
            .chain(self.name.official.as_deref())
            .chain(self.alt_spellings.iter().map(String::as_str))
    }
}

/// Parse la table de métadonnées ; la racine doit être un tableau.
///
/// Les entrées mal formées sont ignorées individuellement.
pub fn parse_metadata(json: &JsonValue) -> Result<Vec<CountryMetadata>, GeoIngestError> {
    let entries = json
        .as_array()
        .ok_or_else(|| GeoIngestError::InvalidMetadata("top-level value is not an array".into()))?;

    Ok(entries
        .iter()
        .filter_map(|e| CountryMetadata::deserialize(e).ok())
        .collect())
}

/// Normalisation des noms pour la comparaison : minuscules, alphanumériques,
/// accents latins courants repliés
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .map(fold_accent)
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => 'a',
        'Á' | 'À' | 'Â' | 'Ä' | 'Ã' | 'Å' => 'A',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
        'Ó' | 'Ò' | 'Ô' | 'Ö' | 'Õ' => 'O',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
        'ç' => 'c',
        'Ç' => 'C',
        'ñ' => 'n',
        'Ñ' => 'N',
        other => other,
    }
}

/// Index nom normalisé -> continent
pub fn continent_lookup(metadata: &[CountryMetadata]) -> HashMap<String, &'static str> {
    let mut lookup = HashMap::new();
    for country in metadata {
        let Some(continent) = country.continent() else {
            continue;
        };
        for name in country.names() {
            let key = normalize_name(name);
            if !key.is_empty() {
                lookup.entry(key).or_insert(continent);
            }
        }
    }
    lookup
}
