//! The application-root context: one event bus, one layer store and one
//! filter store, constructed once per running app and passed to consumers.
//! Explicit injection instead of a process-wide singleton, so tests (and a
//! future multi-map screen) can hold several independent instances.

use aigle_shared::models::ObjectType;

use crate::error::StateError;
use crate::events::EventBus;
use crate::filter::FilterStore;
use crate::layers::LayerStore;
use crate::settings::{ingest, MapSettings};

pub struct MapContext {
    pub bus: EventBus,
    pub layers: LayerStore,
    pub filter: FilterStore,
    object_types: Vec<ObjectType>,
}

impl MapContext {
    /// Ingests `settings` once and wires the stores onto a fresh bus.
    ///
    /// `default_prescription` seeds the prescription flag of the initial
    /// detection filter (the map screen and the statistics screen want
    /// different defaults).
    pub fn from_settings(
        settings: MapSettings,
        default_prescription: Option<bool>,
    ) -> Result<Self, StateError> {
        let ingested = ingest(&settings, default_prescription)?;
        let bus = EventBus::new();
        let layers = LayerStore::new(
            ingested.layers,
            ingested.custom_zone_layers,
            settings,
            default_prescription,
            bus.clone(),
        );
        let filter = FilterStore::new(ingested.initial_filter);

        Ok(MapContext {
            bus,
            layers,
            filter,
            object_types: ingested.object_types,
        })
    }

    /// De-duplicated object types, in first-seen payload order.
    pub fn object_types(&self) -> &[ObjectType] {
        &self.object_types
    }
}
