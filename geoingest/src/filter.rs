//! Filtrage des features par sélection de continents et de pays

use std::collections::{BTreeSet, HashSet};

use geojson::{Feature, FeatureCollection};
use serde::Serialize;

use crate::types::{property_text, FilterFields};

/// Sélection courante ; remise à zéro à chaque changement de couche active
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterSelection {
    pub active_continent_field: Option<String>,
    pub active_country_field: Option<String>,
    /// Valeurs normalisées
    pub selected_continents: BTreeSet<String>,
    pub selected_countries: BTreeSet<String>,
}

/// Forme de comparaison : minuscules, espaces fusionnés
pub fn normalize_value(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

impl FilterSelection {
    /// Sélection vide sur les champs donnés
    pub fn for_fields(fields: &FilterFields) -> Self {
        Self {
            active_continent_field: fields.continent_key.clone(),
            active_country_field: fields.country_key.clone(),
            ..Default::default()
        }
    }

    /// Vide les sélections et installe de nouveaux champs actifs
    pub fn reset(&mut self, fields: &FilterFields) {
        *self = Self::for_fields(fields);
    }

    pub fn select_continent(&mut self, value: &str) {
        let value = normalize_value(value);
        if !value.is_empty() {
            self.selected_continents.insert(value);
        }
    }

    pub fn select_country(&mut self, value: &str) {
        let value = normalize_value(value);
        if !value.is_empty() {
            self.selected_countries.insert(value);
        }
    }

    /// Vrai si au moins un critère restreint effectivement les features
    pub fn is_active(&self) -> bool {
        (self.active_continent_field.is_some() && !self.selected_continents.is_empty())
            || (self.active_country_field.is_some() && !self.selected_countries.is_empty())
    }

    pub fn matches(&self, feature: &Feature) -> bool {
        field_matches(
            feature,
            self.active_continent_field.as_deref(),
            &self.selected_continents,
        ) && field_matches(
            feature,
            self.active_country_field.as_deref(),
            &self.selected_countries,
        )
    }
}

fn field_matches(feature: &Feature, field: Option<&str>, selected: &BTreeSet<String>) -> bool {
    let Some(field) = field else {
        return true;
    };
    if selected.is_empty() {
        return true;
    }
    property_text(feature, field).is_some_and(|v| selected.contains(&normalize_value(&v)))
}

/// Nouvelle collection ne contenant que les features retenues ; les autres
/// membres de la collection sont conservés, la source n'est pas modifiée
pub fn apply_filters(collection: &FeatureCollection, selection: &FilterSelection) -> FeatureCollection {
    FeatureCollection {
        bbox: collection.bbox.clone(),
        features: collection
            .features
            .iter()
            .filter(|f| selection.matches(f))
            .cloned()
            .collect(),
        foreign_members: collection.foreign_members.clone(),
    }
}

/// Valeurs distinctes non vides d'un attribut, dans l'ordre de première
/// apparition (dédoublonnées après normalisation)
pub fn distinct_values(collection: &FeatureCollection, key: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    collection
        .features
        .iter()
        .filter_map(|f| property_text(f, key))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && seen.insert(normalize_value(v)))
        .collect()
}
