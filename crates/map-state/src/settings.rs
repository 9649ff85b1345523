//! Settings ingestion: turns the server-provided settings payload into the
//! seed state for the layer and filter stores. Runs once per settings
//! fetch; the stores keep the payload around to rebuild defaults.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use aigle_shared::models::{
    CustomZone, DetectionControlStatus, DetectionValidationStatus, ObjectType,
    ObjectTypeCategoryStatus, ObjectsFilter, TileSet, TileSetStatus, TileSetType,
};

use crate::error::StateError;
use crate::layers::{CustomZoneLayer, Layer};

/// Default minimum detection score seeded into the initial filter.
pub const DEFAULT_SCORE_THRESHOLD: f64 = 0.6;

/// One object type as referenced by a category, with the category's
/// visibility flag for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectTypeSetting {
    pub object_type: ObjectType,
    pub status: ObjectTypeCategoryStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectTypeCategory {
    pub name: String,
    pub object_type_settings: Vec<ObjectTypeSetting>,
}

/// The parsed settings payload. How it was fetched (HTTP, cache) is the
/// caller's business.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapSettings {
    pub object_type_categories: Vec<ObjectTypeCategory>,
    pub tile_sets: Vec<TileSet>,
    pub custom_zones: Vec<CustomZone>,
}

/// Output of [`ingest`]: everything needed to seed the stores.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestedSettings {
    pub layers: Vec<Layer>,
    pub custom_zone_layers: Vec<CustomZoneLayer>,
    pub object_types: Vec<ObjectType>,
    pub initial_filter: ObjectsFilter,
}

/// Transforms `settings` into store seed state.
///
/// Policies (deliberate, not emergent iteration-order behavior):
/// - object types are de-duplicated by uuid in first-seen order, and the
///   *first* occurrence's category flag decides default visibility when the
///   same type appears under several categories with conflicting flags;
/// - the first BACKGROUND tile set *in payload order* becomes the displayed
///   background; every other layer follows its own status
///   (VISIBLE ⟹ displayed);
/// - layers are stacked by (type, ascending capture date), oldest at the
///   bottom, BACKGROUND under PARTIAL under INDICATIVE;
/// - custom zone layers start hidden, geometry unset until lazily fetched.
///
/// `default_prescription` seeds the prescription flag of the initial
/// filter; the right default depends on the call site.
///
/// All-or-nothing: on [`StateError::MalformedSettings`] nothing is built.
pub fn ingest(
    settings: &MapSettings,
    default_prescription: Option<bool>,
) -> Result<IngestedSettings, StateError> {
    if settings.tile_sets.is_empty() {
        return Err(StateError::MalformedSettings(
            "payload contains no tile set".to_string(),
        ));
    }
    for category in &settings.object_type_categories {
        if category.object_type_settings.is_empty() {
            return Err(StateError::MalformedSettings(format!(
                "category '{}' references no object type",
                category.name
            )));
        }
    }

    let mut object_types = Vec::new();
    let mut visible_by_default = BTreeSet::new();
    let mut seen = BTreeSet::new();
    for category in &settings.object_type_categories {
        for setting in &category.object_type_settings {
            if seen.insert(setting.object_type.uuid) {
                if setting.status == ObjectTypeCategoryStatus::Visible {
                    visible_by_default.insert(setting.object_type.uuid);
                }
                object_types.push(setting.object_type.clone());
            }
        }
    }

    let first_background = settings
        .tile_sets
        .iter()
        .position(|ts| ts.tile_set_type == TileSetType::Background);

    let mut layers: Vec<Layer> = settings
        .tile_sets
        .iter()
        .enumerate()
        .map(|(i, tile_set)| {
            let displayed = if tile_set.tile_set_type == TileSetType::Background {
                Some(i) == first_background
            } else {
                tile_set.status == TileSetStatus::Visible
            };
            Layer::new(tile_set.clone(), displayed)
        })
        .collect();
    // Stable sort: payload order breaks ties between equal capture dates
    layers.sort_by_key(|layer| (layer.tile_set().tile_set_type, layer.tile_set().date));

    let custom_zone_layers: Vec<CustomZoneLayer> = settings
        .custom_zones
        .iter()
        .map(|zone| CustomZoneLayer::new(zone.clone()))
        .collect();

    let initial_filter = ObjectsFilter {
        object_type_uuids: visible_by_default,
        validation_statuses: DetectionValidationStatus::not_yet_reviewed()
            .into_iter()
            .collect(),
        control_statuses: DetectionControlStatus::all()
            .into_iter()
            .filter(|status| *status != DetectionControlStatus::Rehabilitated)
            .collect(),
        score: DEFAULT_SCORE_THRESHOLD,
        prescripted: default_prescription,
        custom_zone_uuids: settings.custom_zones.iter().map(|z| z.uuid).collect(),
    };

    tracing::debug!(
        layers = layers.len(),
        zones = custom_zone_layers.len(),
        object_types = object_types.len(),
        "settings ingested"
    );

    Ok(IngestedSettings {
        layers,
        custom_zone_layers,
        object_types,
        initial_filter,
    })
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_first_background_in_input_order_is_displayed() {
        let settings = settings_with(vec![
            tile_set(1, TileSetType::Background, TileSetStatus::Visible),
            tile_set(2, TileSetType::Background, TileSetStatus::Visible),
            tile_set(3, TileSetType::Partial, TileSetStatus::Hidden),
        ]);
        let ingested = ingest(&settings, None).unwrap();

        let displayed_of = |id: u128| {
            ingested
                .layers
                .iter()
                .find(|l| l.tile_set().id == Uuid::from_u128(id))
                .unwrap()
                .displayed()
        };
        assert!(displayed_of(1));
        assert!(!displayed_of(2));
        assert!(!displayed_of(3));
    }

    #[test]
    fn test_non_background_follows_own_status() {
        let settings = settings_with(vec![
            tile_set(1, TileSetType::Background, TileSetStatus::Visible),
            tile_set(2, TileSetType::Partial, TileSetStatus::Visible),
            tile_set(3, TileSetType::Indicative, TileSetStatus::Deactivated),
        ]);
        let ingested = ingest(&settings, None).unwrap();
        assert!(ingested.layers[1].displayed());
        assert!(!ingested.layers[2].displayed());
    }

    #[test]
    fn test_layer_stack_order_type_then_date() {
        let settings = settings_with(vec![
            tile_set_dated(1, TileSetType::Partial, TileSetStatus::Visible, 2),
            tile_set_dated(2, TileSetType::Indicative, TileSetStatus::Visible, 0),
            tile_set_dated(3, TileSetType::Partial, TileSetStatus::Visible, 1),
            tile_set_dated(4, TileSetType::Background, TileSetStatus::Visible, 3),
        ]);
        let ingested = ingest(&settings, None).unwrap();
        let order: Vec<u128> = ingested
            .layers
            .iter()
            .map(|l| l.tile_set().id.as_u128())
            .collect();
        // Background first, then partials oldest-first, then indicative
        assert_eq!(order, vec![4, 3, 1, 2]);
    }

    #[test]
    fn test_object_type_dedup_first_occurrence_governs() {
        let mut settings = settings_with(vec![tile_set(
            1,
            TileSetType::Background,
            TileSetStatus::Visible,
        )]);
        settings.object_type_categories = vec![
            ObjectTypeCategory {
                name: "A".to_string(),
                object_type_settings: vec![ObjectTypeSetting {
                    object_type: object_type(100, "Piscine"),
                    status: ObjectTypeCategoryStatus::Hidden,
                }],
            },
            ObjectTypeCategory {
                name: "B".to_string(),
                object_type_settings: vec![
                    ObjectTypeSetting {
                        object_type: object_type(100, "Piscine"),
                        status: ObjectTypeCategoryStatus::Visible,
                    },
                    ObjectTypeSetting {
                        object_type: object_type(101, "Abri de jardin"),
                        status: ObjectTypeCategoryStatus::Visible,
                    },
                ],
            },
        ];
        let ingested = ingest(&settings, None).unwrap();

        // De-duplicated, first-seen order
        assert_eq!(ingested.object_types.len(), 2);
        assert_eq!(ingested.object_types[0].uuid, Uuid::from_u128(100));
        // First occurrence (Hidden) governs: Piscine is not visible by default
        assert!(!ingested
            .initial_filter
            .object_type_uuids
            .contains(&Uuid::from_u128(100)));
        assert!(ingested
            .initial_filter
            .object_type_uuids
            .contains(&Uuid::from_u128(101)));
    }

    #[test]
    fn test_initial_filter_defaults() {
        let settings = settings_with(vec![tile_set(
            1,
            TileSetType::Background,
            TileSetStatus::Visible,
        )]);
        let ingested = ingest(&settings, Some(true)).unwrap();
        let filter = &ingested.initial_filter;

        assert_eq!(filter.score, DEFAULT_SCORE_THRESHOLD);
        assert_eq!(filter.prescripted, Some(true));
        assert!(filter
            .validation_statuses
            .contains(&DetectionValidationStatus::DetectedNotVerified));
        assert!(!filter
            .validation_statuses
            .contains(&DetectionValidationStatus::Legitimate));
        assert!(!filter
            .control_statuses
            .contains(&DetectionControlStatus::Rehabilitated));
        assert!(filter
            .control_statuses
            .contains(&DetectionControlStatus::NotControlled));
        assert!(filter.custom_zone_uuids.contains(&Uuid::from_u128(200)));
    }

    #[test]
    fn test_custom_zone_layers_start_hidden_without_geometry() {
        let settings = settings_with(vec![tile_set(
            1,
            TileSetType::Background,
            TileSetStatus::Visible,
        )]);
        let ingested = ingest(&settings, None).unwrap();
        assert_eq!(ingested.custom_zone_layers.len(), 1);
        assert!(!ingested.custom_zone_layers[0].displayed());
        assert!(ingested.custom_zone_layers[0].geometry().is_none());
    }

    #[test]
    fn test_ingestion_is_deterministic() {
        let settings = settings_with(vec![
            tile_set(1, TileSetType::Background, TileSetStatus::Visible),
            tile_set(2, TileSetType::Partial, TileSetStatus::Hidden),
        ]);
        let a = ingest(&settings, None).unwrap();
        let b = ingest(&settings, None).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_no_tile_sets_is_malformed() {
        let settings = settings_with(vec![]);
        assert!(matches!(
            ingest(&settings, None),
            Err(StateError::MalformedSettings(_))
        ));
    }

    #[test]
    fn test_empty_category_is_malformed() {
        let mut settings = settings_with(vec![tile_set(
            1,
            TileSetType::Background,
            TileSetStatus::Visible,
        )]);
        settings.object_type_categories.push(ObjectTypeCategory {
            name: "Vide".to_string(),
            object_type_settings: vec![],
        });
        assert!(matches!(
            ingest(&settings, None),
            Err(StateError::MalformedSettings(_))
        ));
    }

    #[test]
    fn test_payload_deserializes_from_json() {
        let json = r##"{
            "objectTypeCategories": [
                {
                    "name": "Urbanisme",
                    "objectTypeSettings": [
                        {
                            "objectType": {
                                "uuid": "00000000-0000-0000-0000-000000000064",
                                "name": "Piscine",
                                "color": "#1f77b4"
                            },
                            "status": "VISIBLE"
                        }
                    ]
                }
            ],
            "tileSets": [
                {
                    "id": "00000000-0000-0000-0000-000000000001",
                    "name": "Ortho 2023",
                    "url": "https://tiles.example.org/2023/{z}/{x}/{y}.png",
                    "scheme": "xyz",
                    "tileSetType": "BACKGROUND",
                    "status": "VISIBLE",
                    "date": "2023-06-01T00:00:00Z",
                    "minZoom": null,
                    "maxZoom": 19,
                    "geometry": null
                }
            ],
            "customZones": []
        }"##;
        let settings: MapSettings = serde_json::from_str(json).unwrap();
        let ingested = ingest(&settings, None).unwrap();
        assert_eq!(ingested.layers.len(), 1);
        assert!(ingested.layers[0].displayed());
    }
}
