//! Contexte de session : couches chargées, couche active, sélection de
//! filtres et cache de l'index des frontières.

use geojson::FeatureCollection;
use tracing::{debug, info};

use crate::boundary::BoundaryCache;
use crate::classify::{classify, ClassificationMethod, ClassificationState};
use crate::filter::{apply_filters, FilterSelection};
use crate::types::{DatasetBudgetStats, FilterFields};
use crate::GeoIngestError;

pub type LayerId = u64;

/// Une couche chargée ; elle possède sa collection et son état de
/// classification (`None` = non classifiée)
#[derive(Debug, Clone)]
pub struct Layer {
    pub id: LayerId,
    pub label: String,
    pub collection: FeatureCollection,
    pub stats: DatasetBudgetStats,
    pub fields: FilterFields,
    /// Nombre de features marquées par géocodage
    pub spatially_tagged: usize,
    pub classification: Option<ClassificationState>,
}

/// Couche prête à être enregistrée
#[derive(Debug, Clone)]
pub struct NewLayer {
    pub label: String,
    pub collection: FeatureCollection,
    pub stats: DatasetBudgetStats,
    pub fields: FilterFields,
    pub spatially_tagged: usize,
}

#[derive(Debug)]
pub struct Session {
    boundaries: BoundaryCache,
    filter: FilterSelection,
    layers: Vec<Layer>,
    active: Option<LayerId>,
    next_id: LayerId,
}

impl Session {
    pub fn new(boundaries: BoundaryCache) -> Self {
        Self {
            boundaries,
            filter: FilterSelection::default(),
            layers: Vec::new(),
            active: None,
            next_id: 1,
        }
    }

    pub fn boundaries(&self) -> &BoundaryCache {
        &self.boundaries
    }

    pub fn filter(&self) -> &FilterSelection {
        &self.filter
    }

    pub fn filter_mut(&mut self) -> &mut FilterSelection {
        &mut self.filter
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    fn layer_mut(&mut self, id: LayerId) -> Result<&mut Layer, GeoIngestError> {
        self.layers
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or(GeoIngestError::UnknownLayer(id))
    }

    pub fn active_id(&self) -> Option<LayerId> {
        self.active
    }

    pub fn active_layer(&self) -> Option<&Layer> {
        self.active.and_then(|id| self.layer(id))
    }

    /// Enregistre la couche et l'active
    pub fn add_layer(&mut self, new: NewLayer) -> LayerId {
        let id = self.next_id;
        self.next_id += 1;

        info!(
            layer = id,
            label = %new.label,
            features = new.stats.feature_count,
            "Layer added"
        );
        self.layers.push(Layer {
            id,
            label: new.label,
            collection: new.collection,
            stats: new.stats,
            fields: new.fields,
            spatially_tagged: new.spatially_tagged,
            classification: None,
        });
        self.activate(id);
        id
    }

    /// Active une couche ; la sélection de filtres est remise à zéro sur ses
    /// champs détectés
    pub fn set_active(&mut self, id: LayerId) -> Result<(), GeoIngestError> {
        if self.layer(id).is_none() {
            return Err(GeoIngestError::UnknownLayer(id));
        }
        self.activate(id);
        Ok(())
    }

    fn activate(&mut self, id: LayerId) {
        let fields = self
            .layer(id)
            .map(|l| l.fields.clone())
            .unwrap_or_default();
        self.filter.reset(&fields);
        self.active = Some(id);
        debug!(layer = id, "Active layer changed, filter selection reset");
    }

    /// Retire la couche et son état de classification
    pub fn remove_layer(&mut self, id: LayerId) -> Option<Layer> {
        let pos = self.layers.iter().position(|l| l.id == id)?;
        let layer = self.layers.remove(pos);
        if self.active == Some(id) {
            self.active = None;
            self.filter = FilterSelection::default();
        }
        info!(layer = id, "Layer removed");
        Some(layer)
    }

    /// Collection de la couche après filtres (seule la couche active est filtrée)
    pub fn filtered_view(&self, id: LayerId) -> Result<FeatureCollection, GeoIngestError> {
        let layer = self.layer(id).ok_or(GeoIngestError::UnknownLayer(id))?;
        if self.active == Some(id) {
            Ok(apply_filters(&layer.collection, &self.filter))
        } else {
            Ok(layer.collection.clone())
        }
    }

    /// (Re)classifie un attribut sur les valeurs filtrées de la couche
    pub fn classify_layer(
        &mut self,
        id: LayerId,
        attribute: &str,
        method: ClassificationMethod,
        classes: usize,
    ) -> Result<&ClassificationState, GeoIngestError> {
        let view = self.filtered_view(id)?;
        let layer = self.layer_mut(id)?;
        let state = classify(
            &view,
            attribute,
            method,
            classes,
            layer.classification.as_ref(),
        )?;
        Ok(&*layer.classification.insert(state))
    }

    /// Accès mutable à la classification (édition de couleurs ou de bornes)
    pub fn classification_mut(&mut self, id: LayerId) -> Result<Option<&mut ClassificationState>, GeoIngestError> {
        Ok(self.layer_mut(id)?.classification.as_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::compute_stats;
    use geojson::{Feature, Geometry, Value};
    use serde_json::json;

    fn layer(label: &str, rows: &[(&str, f64)]) -> NewLayer {
        let collection = FeatureCollection {
            bbox: None,
            features: rows
                .iter()
                .map(|(continent, pop)| Feature {
                    bbox: None,
                    geometry: Some(Geometry::new(Value::Point(vec![0.0, 0.0]))),
                    id: None,
                    properties: json!({ "continent": continent, "pop": pop }).as_object().cloned(),
                    foreign_members: None,
                })
                .collect(),
            foreign_members: None,
        };
        NewLayer {
            label: label.to_string(),
            stats: compute_stats(&collection),
            collection,
            fields: FilterFields {
                continent_key: Some("continent".into()),
                country_key: None,
            },
            spatially_tagged: 0,
        }
    }

    fn session() -> Session {
        Session::new(BoundaryCache::preloaded(Default::default()))
    }

    #[test]
    fn test_add_activates_and_resets_filter() {
        let mut session = session();
        let a = session.add_layer(layer("a", &[("Africa", 1.0)]));
        session.filter_mut().select_continent("Africa");

        let b = session.add_layer(layer("b", &[("Europe", 2.0)]));
        assert_eq!(session.active_id(), Some(b));
        assert!(session.filter().selected_continents.is_empty());
        assert_eq!(session.filter().active_continent_field.as_deref(), Some("continent"));

        session.set_active(a).unwrap();
        assert_eq!(session.active_layer().map(|l| l.label.as_str()), Some("a"));
        assert!(matches!(session.set_active(99), Err(GeoIngestError::UnknownLayer(99))));
    }

    #[test]
    fn test_classify_uses_filtered_values() {
        let mut session = session();
        let id = session.add_layer(layer(
            "cities",
            &[("Africa", 10.0), ("Africa", 20.0), ("Europe", 1000.0)],
        ));
        session.filter_mut().select_continent("africa");

        let state = session
            .classify_layer(id, "pop", ClassificationMethod::EqualInterval, 2)
            .unwrap();
        assert_eq!(state.labels(), ["10 - 15", "15 - 20"]);
        assert!(session.layer(id).unwrap().classification.is_some());
    }

    #[test]
    fn test_remove_layer_clears_active_state() {
        let mut session = session();
        let id = session.add_layer(layer("a", &[("Africa", 1.0), ("Africa", 2.0)]));
        session
            .classify_layer(id, "pop", ClassificationMethod::Quantile, 2)
            .unwrap();
        session.filter_mut().select_continent("Africa");

        let removed = session.remove_layer(id).unwrap();
        assert!(removed.classification.is_some());
        assert_eq!(session.active_id(), None);
        assert_eq!(session.filter(), &FilterSelection::default());
        assert!(session.filtered_view(id).is_err());
        assert!(session.remove_layer(id).is_none());
    }
}
