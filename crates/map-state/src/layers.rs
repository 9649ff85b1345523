//! The central layer state machine: ordered tile-set layers and custom
//! zone overlays, with the single-visible-background invariant enforced at
//! the store level.
//!
//! Every mutator works copy-on-write: it builds the next layer list, swaps
//! it in, then emits. Subscribers can never observe a half-applied update
//! (no state with zero or two displayed backgrounds exists, even
//! transiently).

use uuid::Uuid;

use aigle_shared::geometry::point_in_polygon;
use aigle_shared::models::{CustomZone, Polygon, Position, TileSet, TileSetStatus, TileSetType};

use crate::error::StateError;
use crate::events::{EventBus, MapEvent};
use crate::settings::{ingest, MapSettings};

/// A tile set paired with its client-side displayed flag. Created by
/// settings ingestion, mutated only through [`LayerStore`] mutators, and
/// replaced wholesale on re-ingestion — never destroyed individually.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    tile_set: TileSet,
    displayed: bool,
}

impl Layer {
    pub(crate) fn new(tile_set: TileSet, displayed: bool) -> Self {
        Layer {
            tile_set,
            displayed,
        }
    }

    pub fn tile_set(&self) -> &TileSet {
        &self.tile_set
    }

    pub fn displayed(&self) -> bool {
        self.displayed
    }
}

/// A custom zone overlay with a displayed flag and a lazily fetched
/// geometry. The geometry is fetched at most once for the lifetime of the
/// store; the fetch itself is orchestrated by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomZoneLayer {
    zone: CustomZone,
    displayed: bool,
    geometry: Option<Polygon>,
}

impl CustomZoneLayer {
    pub(crate) fn new(zone: CustomZone) -> Self {
        CustomZoneLayer {
            zone,
            displayed: false,
            geometry: None,
        }
    }

    pub fn zone(&self) -> &CustomZone {
        &self.zone
    }

    pub fn displayed(&self) -> bool {
        self.displayed
    }

    pub fn geometry(&self) -> Option<&Polygon> {
        self.geometry.as_ref()
    }
}

/// Owner of the layer lists. All external mutation goes through the
/// documented mutators; accessors hand out references or clones, never
/// aliased mutable state.
pub struct LayerStore {
    layers: Vec<Layer>,
    custom_zone_layers: Vec<CustomZoneLayer>,
    /// Last-ingested payload, kept so `reset_to_defaults` can rebuild the
    /// default visibility without refetching.
    settings: MapSettings,
    default_prescription: Option<bool>,
    bus: EventBus,
}

impl LayerStore {
    /// Seeds the store from an ingestion result. `settings` must be the
    /// payload the layers were ingested from; it backs
    /// [`reset_to_defaults`](Self::reset_to_defaults).
    pub fn new(
        layers: Vec<Layer>,
        custom_zone_layers: Vec<CustomZoneLayer>,
        settings: MapSettings,
        default_prescription: Option<bool>,
        bus: EventBus,
    ) -> Self {
        LayerStore {
            layers,
            custom_zone_layers,
            settings,
            default_prescription,
            bus,
        }
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn custom_zone_layers(&self) -> &[CustomZoneLayer] {
        &self.custom_zone_layers
    }

    /// Shows or hides one tile-set layer.
    ///
    /// Unknown ids are silent no-ops: layer lists can legitimately lag
    /// behind id references during async transitions. Hiding a background
    /// directly is refused — a background can only be replaced by
    /// displaying another one. Displaying a background hides every sibling
    /// background in the same atomic update.
    ///
    /// Emits [`MapEvent::LayersUpdated`] once per state-changing call.
    pub fn set_visibility(&mut self, tile_set_id: Uuid, visible: bool) -> Result<(), StateError> {
        let Some(index) = self
            .layers
            .iter()
            .position(|l| l.tile_set.id == tile_set_id)
        else {
            tracing::warn!(%tile_set_id, "visibility change for unknown tile set ignored");
            return Ok(());
        };

        let is_background = self.layers[index].tile_set.tile_set_type == TileSetType::Background;
        if is_background && !visible {
            return Err(StateError::InvalidTransition { tile_set_id });
        }

        let mut next = self.layers.clone();
        if is_background {
            for layer in &mut next {
                if layer.tile_set.tile_set_type == TileSetType::Background {
                    layer.displayed = false;
                }
            }
        }
        next[index].displayed = visible;
        self.layers = next;

        tracing::debug!(%tile_set_id, visible, "tile set visibility changed");
        self.bus.emit(&MapEvent::LayersUpdated);
        Ok(())
    }

    /// Applies [`set_visibility`](Self::set_visibility) semantics to a set
    /// of ids in one atomic update, with a single emission.
    ///
    /// Refuses a batch that would display more than one background: the
    /// store will not silently pick one.
    pub fn set_visibility_batch(
        &mut self,
        tile_set_ids: &[Uuid],
        visible: bool,
    ) -> Result<(), StateError> {
        let mut targets = Vec::new();
        for &tile_set_id in tile_set_ids {
            match self
                .layers
                .iter()
                .position(|l| l.tile_set.id == tile_set_id)
            {
                Some(index) => targets.push(index),
                None => {
                    tracing::warn!(%tile_set_id, "visibility change for unknown tile set ignored");
                }
            }
        }

        let background_ids: Vec<Uuid> = targets
            .iter()
            .filter(|&&i| self.layers[i].tile_set.tile_set_type == TileSetType::Background)
            .map(|&i| self.layers[i].tile_set.id)
            .collect();

        if visible && background_ids.len() > 1 {
            return Err(StateError::AmbiguousBackgroundSelection {
                tile_set_ids: background_ids,
            });
        }
        if !visible {
            if let Some(&tile_set_id) = background_ids.first() {
                return Err(StateError::InvalidTransition { tile_set_id });
            }
        }
        if targets.is_empty() {
            return Ok(());
        }

        let mut next = self.layers.clone();
        if visible && !background_ids.is_empty() {
            for layer in &mut next {
                if layer.tile_set.tile_set_type == TileSetType::Background {
                    layer.displayed = false;
                }
            }
        }
        for index in targets {
            next[index].displayed = visible;
        }
        self.layers = next;

        tracing::debug!(count = tile_set_ids.len(), visible, "batch visibility changed");
        self.bus.emit(&MapEvent::LayersUpdated);
        Ok(())
    }

    /// Toggles a custom zone overlay. No cross-zone invariant, and no
    /// geometry fetch: lazy-fetch orchestration belongs to the caller.
    pub fn set_custom_zone_visibility(&mut self, zone_id: Uuid, visible: bool) {
        let Some(index) = self
            .custom_zone_layers
            .iter()
            .position(|z| z.zone.uuid == zone_id)
        else {
            tracing::warn!(%zone_id, "visibility change for unknown custom zone ignored");
            return;
        };

        let mut next = self.custom_zone_layers.clone();
        next[index].displayed = visible;
        self.custom_zone_layers = next;

        tracing::debug!(%zone_id, visible, "custom zone visibility changed");
        self.bus.emit(&MapEvent::LayersUpdated);
    }

    /// Whether the zone's geometry has already been fed back via
    /// [`set_zone_geometry`](Self::set_zone_geometry). Callers use this to
    /// avoid duplicate fetches.
    pub fn geometry_loaded(&self, zone_id: Uuid) -> bool {
        self.custom_zone_layers
            .iter()
            .any(|z| z.zone.uuid == zone_id && z.geometry.is_some())
    }

    /// Caches a fetched zone geometry. Idempotent for a repeated identical
    /// geometry; once cached, the geometry is kept for the lifetime of the
    /// store and a differing late result is ignored.
    pub fn set_zone_geometry(&mut self, zone_id: Uuid, geometry: Polygon) {
        let Some(index) = self
            .custom_zone_layers
            .iter()
            .position(|z| z.zone.uuid == zone_id)
        else {
            tracing::warn!(%zone_id, "geometry for unknown custom zone ignored");
            return;
        };

        match &self.custom_zone_layers[index].geometry {
            Some(existing) if *existing == geometry => {}
            Some(_) => {
                tracing::warn!(%zone_id, "differing geometry for already-loaded zone ignored");
            }
            None => {
                let mut next = self.custom_zone_layers.clone();
                next[index].geometry = Some(geometry);
                self.custom_zone_layers = next;
            }
        }
    }

    /// Pure projection: tile sets with `type ∈ types` and
    /// `status ∈ statuses`, optionally filtered on the displayed flag, in
    /// store (stack) order. Returns clones — the store's state cannot be
    /// mutated through the result.
    pub fn get_tile_sets(
        &self,
        types: &[TileSetType],
        statuses: &[TileSetStatus],
        displayed: Option<bool>,
    ) -> Vec<TileSet> {
        self.layers
            .iter()
            .filter(|layer| {
                types.contains(&layer.tile_set.tile_set_type)
                    && statuses.contains(&layer.tile_set.status)
                    && displayed.map_or(true, |d| layer.displayed == d)
            })
            .map(|layer| layer.tile_set.clone())
            .collect()
    }

    /// URL templates of the displayed layers, bottom of the stack first,
    /// ready for a raster compositor.
    pub fn displayed_tile_urls(&self) -> Vec<String> {
        self.layers
            .iter()
            .filter(|layer| layer.displayed)
            .map(|layer| layer.tile_set.url.clone())
            .collect()
    }

    /// Tile sets whose coverage contains `point`. A tile set without a
    /// boundary geometry covers the whole territory and always matches.
    pub fn tile_sets_containing(&self, point: Position) -> Vec<TileSet> {
        self.layers
            .iter()
            .filter(|layer| match &layer.tile_set.geometry {
                Some(polygon) => point_in_polygon(polygon, point),
                None => true,
            })
            .map(|layer| layer.tile_set.clone())
            .collect()
    }

    /// Discards all manual toggling and rebuilds the default visibility
    /// from the last-ingested settings. Cached zone geometries survive:
    /// they are fetched once per store lifetime.
    pub fn reset_to_defaults(&mut self) -> Result<(), StateError> {
        let ingested = ingest(&self.settings, self.default_prescription)?;

        let mut zones = ingested.custom_zone_layers;
        for zone in &mut zones {
            if let Some(previous) = self
                .custom_zone_layers
                .iter()
                .find(|z| z.zone.uuid == zone.zone.uuid)
            {
                zone.geometry = previous.geometry.clone();
            }
        }

        self.layers = ingested.layers;
        self.custom_zone_layers = zones;

        tracing::debug!("layer store reset to ingestion defaults");
        self.bus.emit(&MapEvent::LayersUpdated);
        Ok(())
    }
}
