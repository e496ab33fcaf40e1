//! Export GeoJSON d'une couche filtrée, avec la couleur de classe par feature

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use geoingest::ClassificationState;
use geojson::{Feature, FeatureCollection};

/// Propriété portant la couleur de classe
pub const FILL_PROPERTY: &str = "_fill";

/// Exporte une collection en GeoJSON (écriture feature par feature).
/// Avec une classification, chaque feature classée reçoit `_fill`.
///
/// Retourne le nombre de features écrites.
pub fn export_to_geojson(
    collection: &FeatureCollection,
    classification: Option<&ClassificationState>,
    output_path: &Path,
) -> Result<usize> {
    let file = File::create(output_path)
        .context(format!("Failed to create file: {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);

    write_collection(&mut writer, collection, classification)?;
    writer.flush()?;

    Ok(collection.features.len())
}

fn write_collection<W: Write>(
    writer: &mut W,
    collection: &FeatureCollection,
    classification: Option<&ClassificationState>,
) -> Result<()> {
    write!(writer, r#"{{"type":"FeatureCollection""#)?;
    if let Some(bbox) = &collection.bbox {
        write!(writer, r#","bbox":"#)?;
        serde_json::to_writer(&mut *writer, bbox)?;
    }
    // Membres de premier niveau (name, crs...) conservés tels quels
    for (key, value) in collection.foreign_members.iter().flatten() {
        if matches!(key.as_str(), "type" | "features" | "bbox") {
            continue;
        }
        write!(writer, ",")?;
        serde_json::to_writer(&mut *writer, key)?;
        write!(writer, ":")?;
        serde_json::to_writer(&mut *writer, value)?;
    }
    write!(writer, r#","features":["#)?;

    for (i, feature) in collection.features.iter().enumerate() {
        if i > 0 {
            write!(writer, ",")?;
        }
        match classification {
            Some(state) => serde_json::to_writer(&mut *writer, &styled(feature, state))?,
            None => serde_json::to_writer(&mut *writer, feature)?,
        }
    }

    write!(writer, "]}}")?;
    Ok(())
}

/// Copie de la feature avec sa couleur de classe (inchangée si non classée)
fn styled(feature: &Feature, state: &ClassificationState) -> Feature {
    let mut feature = feature.clone();
    let color = feature
        .properties
        .as_ref()
        .and_then(|p| p.get(state.attribute()))
        .and_then(|v| state.color_for_value(v))
        .map(str::to_string);

    if let Some(color) = color {
        feature
            .properties
            .get_or_insert_with(Default::default)
            .insert(FILL_PROPERTY.to_string(), color.into());
    }
    feature
}
