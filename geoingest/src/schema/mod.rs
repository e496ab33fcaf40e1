//! Inférence des champs continent / pays sur des tables d'attributs sans schéma
//!
//! Chaque champ est résolu par une chaîne ordonnée de tentatives pures ; la
//! première qui retourne une clé l'emporte :
//!
//! 1. correspondance exacte normalisée sur les clés des 50 premières features
//! 2. correspondance exacte sur les clés de la première feature
//! 3. correspondance floue par inclusion (noms normalisés d'au moins 5 caractères)
//! 4. continent : motifs de valeurs (codes et noms de continents), 400 features
//! 5. pays : colonne non numérique la plus diversifiée, 500 features, au moins 8 valeurs

pub mod candidates;

use std::collections::{HashMap, HashSet};

use geojson::{Feature, FeatureCollection};
use serde::Serialize;
use tracing::debug;

use crate::types::{value_as_text, FilterFields};
use candidates::{
    CONTINENT_CANDIDATES, CONTINENT_CODES, CONTINENT_NAMES, COUNTRY_CANDIDATES, NON_SEMANTIC_KEYS,
};

const KEY_SAMPLE_SIZE: usize = 50;
const CONTINENT_VALUE_SCAN: usize = 400;
const CONTINENT_MIN_HITS: usize = 2;
const COUNTRY_VALUE_SCAN: usize = 500;
const COUNTRY_MIN_DISTINCT: usize = 8;
const FUZZY_MIN_LEN: usize = 5;

/// Contexte partagé par les tentatives d'un champ
pub struct InferenceContext<'a> {
    pub features: &'a [Feature],
    pub candidates: &'static [&'static str],
    /// Clé déjà attribuée à un autre champ
    pub exclude: Option<&'a str>,
}

/// Une tentative d'inférence
pub type Attempt = fn(&InferenceContext<'_>) -> Option<String>;

const CONTINENT_CHAIN: &[(&str, Attempt)] = &[
    ("exact", exact_in_sample),
    ("first-feature", exact_in_first_feature),
    ("fuzzy", fuzzy_in_sample),
    ("values", continent_by_values),
];

const COUNTRY_CHAIN: &[(&str, Attempt)] = &[
    ("exact", exact_in_sample),
    ("first-feature", exact_in_first_feature),
    ("fuzzy", fuzzy_in_sample),
    ("cardinality", country_by_cardinality),
];

/// Résultat détaillé : clés retenues et règle ayant conclu
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldDetection {
    pub fields: FilterFields,
    pub continent_rule: Option<&'static str>,
    pub country_rule: Option<&'static str>,
}

/// Identifie les clés continent et pays d'une collection.
///
/// `None` pour un champ signifie qu'aucune règle n'a conclu ; l'appelant
/// doit alors recourir à l'inférence spatiale.
pub fn detect_filter_fields(collection: &FeatureCollection) -> FilterFields {
    detect_filter_fields_explained(collection).fields
}

/// Comme [`detect_filter_fields`], en indiquant la règle utilisée
pub fn detect_filter_fields_explained(collection: &FeatureCollection) -> FieldDetection {
    let features = collection.features.as_slice();

    let continent = run_chain(
        CONTINENT_CHAIN,
        &InferenceContext {
            features,
            candidates: CONTINENT_CANDIDATES,
            exclude: None,
        },
    );

    let country = run_chain(
        COUNTRY_CHAIN,
        &InferenceContext {
            features,
            candidates: COUNTRY_CANDIDATES,
            exclude: continent.as_ref().map(|(key, _)| key.as_str()),
        },
    );

    debug!(continent = ?continent, country = ?country, "Filter fields detected");

    let (continent_key, continent_rule) = split(continent);
    let (country_key, country_rule) = split(country);

    FieldDetection {
        fields: FilterFields {
            continent_key,
            country_key,
        },
        continent_rule,
        country_rule,
    }
}

fn split(found: Option<(String, &'static str)>) -> (Option<String>, Option<&'static str>) {
    match found {
        Some((key, rule)) => (Some(key), Some(rule)),
        None => (None, None),
    }
}

fn run_chain(
    chain: &[(&'static str, Attempt)],
    ctx: &InferenceContext<'_>,
) -> Option<(String, &'static str)> {
    chain
        .iter()
        .find_map(|(rule, attempt)| attempt(ctx).map(|key| (key, *rule)))
}

/// Minuscules, caractères alphanumériques ASCII uniquement
pub fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Clés des `limit` premières features, dans l'ordre de première apparition
fn sampled_keys<'a>(features: &'a [Feature], limit: usize, exclude: Option<&str>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    let mut keys = Vec::new();
    for props in features.iter().take(limit).filter_map(|f| f.properties.as_ref()) {
        for key in props.keys() {
            if Some(key.as_str()) == exclude {
                continue;
            }
            if seen.insert(key.as_str()) {
                keys.push(key.as_str());
            }
        }
    }
    keys
}

fn exact_match(keys: &[&str], candidates: &[&str]) -> Option<String> {
    let normalized: Vec<String> = keys.iter().map(|k| normalize_key(k)).collect();
    candidates.iter().find_map(|candidate| {
        let nc = normalize_key(candidate);
        normalized
            .iter()
            .position(|nk| *nk == nc)
            .map(|idx| keys[idx].to_string())
    })
}

fn exact_in_sample(ctx: &InferenceContext<'_>) -> Option<String> {
    let keys = sampled_keys(ctx.features, KEY_SAMPLE_SIZE, ctx.exclude);
    exact_match(&keys, ctx.candidates)
}

fn exact_in_first_feature(ctx: &InferenceContext<'_>) -> Option<String> {
    let keys = sampled_keys(ctx.features, 1, ctx.exclude);
    exact_match(&keys, ctx.candidates)
}

fn fuzzy_in_sample(ctx: &InferenceContext<'_>) -> Option<String> {
    let keys = sampled_keys(ctx.features, KEY_SAMPLE_SIZE, ctx.exclude);
    let normalized: Vec<String> = keys.iter().map(|k| normalize_key(k)).collect();

    ctx.candidates.iter().find_map(|candidate| {
        let nc = normalize_key(candidate);
        if nc.len() < FUZZY_MIN_LEN {
            return None;
        }
        normalized
            .iter()
            .position(|nk| {
                !nk.is_empty() && (nc.contains(nk.as_str()) || nk.contains(nc.as_str()))
            })
            .map(|idx| keys[idx].to_string())
    })
}

fn is_continent_value(raw: &str) -> bool {
    let v = normalize_key(raw);
    if v.is_empty() {
        return false;
    }
    CONTINENT_CODES.contains(&v.as_str()) || CONTINENT_NAMES.iter().any(|name| v.contains(name))
}

fn continent_by_values(ctx: &InferenceContext<'_>) -> Option<String> {
    let mut order: Vec<&str> = Vec::new();
    let mut hits: HashMap<&str, usize> = HashMap::new();

    for props in ctx
        .features
        .iter()
        .take(CONTINENT_VALUE_SCAN)
        .filter_map(|f| f.properties.as_ref())
    {
        for (key, value) in props {
            if Some(key.as_str()) == ctx.exclude || value.is_null() {
                continue;
            }
            if !is_continent_value(&value_as_text(value)) {
                continue;
            }
            let counter = hits.entry(key.as_str()).or_insert_with(|| {
                order.push(key.as_str());
                0
            });
            *counter += 1;
        }
    }

    best_by_count(&order, &hits)
        .filter(|(_, count)| *count >= CONTINENT_MIN_HITS)
        .map(|(key, _)| key.to_string())
}

fn country_by_cardinality(ctx: &InferenceContext<'_>) -> Option<String> {
    let keys = sampled_keys(ctx.features, COUNTRY_VALUE_SCAN, ctx.exclude);
    let mut order: Vec<&str> = Vec::new();
    let mut distinct: HashMap<&str, usize> = HashMap::new();

    for key in keys {
        if NON_SEMANTIC_KEYS
            .iter()
            .any(|k| normalize_key(k) == normalize_key(key))
        {
            continue;
        }

        let mut values = HashSet::new();
        let mut all_numeric = true;
        for props in ctx
            .features
            .iter()
            .take(COUNTRY_VALUE_SCAN)
            .filter_map(|f| f.properties.as_ref())
        {
            let Some(value) = props.get(key).filter(|v| !v.is_null()) else {
                continue;
            };
            let text = value_as_text(value).trim().to_string();
            if text.is_empty() {
                continue;
            }
            if !is_finite_number(&text) {
                all_numeric = false;
            }
            values.insert(text);
        }

        if all_numeric {
            continue;
        }
        order.push(key);
        distinct.insert(key, values.len());
    }

    best_by_count(&order, &distinct)
        .filter(|(_, count)| *count >= COUNTRY_MIN_DISTINCT)
        .map(|(key, _)| key.to_string())
}

fn is_finite_number(text: &str) -> bool {
    fast_float::parse::<f64, _>(text).map_or(false, |v| v.is_finite())
}

/// Clé au compteur maximal ; à égalité, la première rencontrée
fn best_by_count<'a>(order: &[&'a str], counts: &HashMap<&'a str, usize>) -> Option<(&'a str, usize)> {
    let mut best: Option<(&str, usize)> = None;
    for &key in order {
        let count = counts.get(key).copied().unwrap_or(0);
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((key, count));
        }
    }
    best
}
