//! Moteur de classification thématique.
//!
//! Une classification numérique produit `n + 1` bornes (n borné à [2, 10]) ;
//! une valeur `v` appartient à la classe `i` si `bornes[i] <= v <= bornes[i+1]`,
//! les classes étant parcourues de la plus basse à la plus haute (une valeur
//! sur une borne interne revient donc à la classe inférieure).
//!
//! La méthode "unique" produit une classe par valeur distincte, dans l'ordre
//! de première apparition.

pub mod breaks;
pub mod edit;
pub mod palette;

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use geojson::FeatureCollection;
use serde::Serialize;
use tracing::debug;

use crate::types::{value_as_text, JsonValue};
use crate::GeoIngestError;

pub use edit::parse_break_range;

pub const MIN_CLASSES: usize = 2;
pub const MAX_CLASSES: usize = 10;

/// Méthode de classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationMethod {
    EqualInterval,
    Quantile,
    NaturalBreaks,
    Unique,
}

impl ClassificationMethod {
    pub fn is_numeric(self) -> bool {
        self != Self::Unique
    }
}

impl FromStr for ClassificationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "equal" | "equal_interval" | "equal-interval" => Ok(Self::EqualInterval),
            "quantile" => Ok(Self::Quantile),
            "jenks" | "natural" | "natural_breaks" => Ok(Self::NaturalBreaks),
            "unique" | "categorical" => Ok(Self::Unique),
            other => Err(format!(
                "unknown classification method: {other} (expected equal, quantile, jenks or unique)"
            )),
        }
    }
}

impl fmt::Display for ClassificationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::EqualInterval => "equal",
            Self::Quantile => "quantile",
            Self::NaturalBreaks => "jenks",
            Self::Unique => "unique",
        };
        f.write_str(name)
    }
}

/// Bornes numériques ou catégories
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "values", rename_all = "snake_case")]
pub enum ClassValues {
    Breaks(Vec<f64>),
    Categories(Vec<String>),
}

/// État de classification d'une couche
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationState {
    attribute: String,
    method: ClassificationMethod,
    values: ClassValues,
    colors: Vec<String>,
    /// Couleurs choisies par l'utilisateur, par indice de classe
    overrides: BTreeMap<usize, String>,
}

impl ClassificationState {
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn method(&self) -> ClassificationMethod {
        self.method
    }

    pub fn values(&self) -> &ClassValues {
        &self.values
    }

    pub fn colors(&self) -> &[String] {
        &self.colors
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.values, ClassValues::Breaks(_))
    }

    pub fn class_count(&self) -> usize {
        match &self.values {
            ClassValues::Breaks(b) => b.len().saturating_sub(1),
            ClassValues::Categories(c) => c.len(),
        }
    }

    /// Classe d'une valeur brute d'attribut ; la première classe qui convient
    /// l'emporte
    pub fn class_for_value(&self, value: &JsonValue) -> Option<usize> {
        match &self.values {
            ClassValues::Breaks(breaks) => {
                let v = numeric_value(value)?;
                breaks
                    .windows(2)
                    .position(|w| w[0] <= v && v <= w[1])
            }
            ClassValues::Categories(categories) => {
                let text = value_as_text(value);
                categories.iter().position(|c| *c == text)
            }
        }
    }

    pub fn color_for_value(&self, value: &JsonValue) -> Option<&str> {
        self.class_for_value(value)
            .and_then(|i| self.colors.get(i))
            .map(String::as_str)
    }

    /// Libellés de légende : "lo - hi" ou la catégorie
    pub fn labels(&self) -> Vec<String> {
        match &self.values {
            ClassValues::Breaks(breaks) => breaks
                .windows(2)
                .map(|w| format!("{} - {}", w[0], w[1]))
                .collect(),
            ClassValues::Categories(categories) => categories.clone(),
        }
    }

    /// Fixe la couleur d'une classe ; elle survit aux reclassifications
    /// tant que le nombre de classes ne change pas
    pub fn set_color(&mut self, class: usize, color: &str) -> Result<(), GeoIngestError> {
        if class >= self.class_count() {
            return Err(GeoIngestError::UnknownClass(class));
        }
        let color = palette::normalize_color(color)
            .ok_or_else(|| GeoIngestError::InvalidColor(color.to_string()))?;
        self.colors[class] = color.clone();
        self.overrides.insert(class, color);
        Ok(())
    }

    /// Remplace la plage d'une classe numérique par la saisie `"lo - hi"`.
    ///
    /// En cas d'erreur l'état est inchangé.
    pub fn edit_break_range(&mut self, class: usize, input: &str) -> Result<(), GeoIngestError> {
        let ClassValues::Breaks(breaks) = &mut self.values else {
            return Err(GeoIngestError::NotNumeric(self.attribute.clone()));
        };
        if class + 1 >= breaks.len() {
            return Err(GeoIngestError::UnknownClass(class));
        }
        let (lo, hi) = parse_break_range(input)?;
        breaks[class] = lo;
        breaks[class + 1] = hi;
        debug!(class, lo, hi, "Class range edited");
        Ok(())
    }
}

/// Valeur numérique d'un attribut (nombre JSON ou texte numérique)
pub fn numeric_value(value: &JsonValue) -> Option<f64> {
    let v = match value {
        JsonValue::Number(n) => n.as_f64()?,
        JsonValue::String(s) => fast_float::parse::<f64, _>(s.trim()).ok()?,
        _ => return None,
    };
    v.is_finite().then_some(v)
}

fn is_empty_value(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => true,
        JsonValue::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn attribute_values<'a>(
    collection: &'a FeatureCollection,
    attribute: &'a str,
) -> impl Iterator<Item = &'a JsonValue> + 'a {
    collection
        .features
        .iter()
        .filter_map(move |f| f.properties.as_ref()?.get(attribute))
        .filter(|v| !is_empty_value(v))
}

/// Valeurs numériques triées, ou `None` si une valeur non vide n'est pas un nombre
pub fn numeric_values(collection: &FeatureCollection, attribute: &str) -> Option<Vec<f64>> {
    let mut values = attribute_values(collection, attribute)
        .map(numeric_value)
        .collect::<Option<Vec<f64>>>()?;
    values.sort_by(f64::total_cmp);
    Some(values)
}

/// Valeurs distinctes dans l'ordre de première apparition
pub fn unique_values(collection: &FeatureCollection, attribute: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    attribute_values(collection, attribute)
        .map(value_as_text)
        .filter(|v| seen.insert(v.clone()))
        .collect()
}

/// Classifie `attribute` sur la collection (déjà filtrée).
///
/// `previous` est l'état courant de la couche : ses couleurs personnalisées
/// sont conservées si le nombre de classes est identique.
pub fn classify(
    collection: &FeatureCollection,
    attribute: &str,
    method: ClassificationMethod,
    classes: usize,
    previous: Option<&ClassificationState>,
) -> Result<ClassificationState, GeoIngestError> {
    let values = if method.is_numeric() {
        let sorted = numeric_values(collection, attribute)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| GeoIngestError::NotNumeric(attribute.to_string()))?;
        let classes = classes.clamp(MIN_CLASSES, MAX_CLASSES);
        let mut breaks = match method {
            ClassificationMethod::EqualInterval => breaks::equal_interval(&sorted, classes),
            ClassificationMethod::Quantile => breaks::quantile(&sorted, classes),
            _ => breaks::natural_breaks(&sorted, classes),
        };
        breaks::round_breaks(&mut breaks);
        ClassValues::Breaks(breaks)
    } else {
        ClassValues::Categories(unique_values(collection, attribute))
    };

    let mut state = ClassificationState {
        attribute: attribute.to_string(),
        method,
        values,
        colors: Vec::new(),
        overrides: BTreeMap::new(),
    };

    let count = state.class_count();
    state.colors = if state.is_numeric() {
        palette::numeric_palette(count)
    } else {
        palette::categorical_palette(count)
    };

    if let Some(previous) = previous.filter(|p| p.class_count() == count) {
        for (&class, color) in &previous.overrides {
            state.colors[class] = color.clone();
            state.overrides.insert(class, color.clone());
        }
    }

    debug!(
        attribute = %attribute,
        method = %method,
        classes = count,
        "Attribute classified"
    );
    Ok(state)
}
