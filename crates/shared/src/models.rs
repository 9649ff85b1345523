use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A WGS84 coordinate (longitude first, as in GeoJSON).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lng: f64,
    pub lat: f64,
}

impl Position {
    pub fn new(lng: f64, lat: f64) -> Self {
        Position { lng, lat }
    }
}

/// A polygon as a list of rings. Ring 0 is the outer boundary, any further
/// rings are holes. Rings are closed: first position == last position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub rings: Vec<Vec<Position>>,
}

impl Polygon {
    pub fn new(rings: Vec<Vec<Position>>) -> Self {
        Polygon { rings }
    }
}

/// Axis-aligned bounding box `[minLng, minLat, maxLng, maxLat]`.
/// Always derived from a geometry, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn new(min_lng: f64, min_lat: f64, max_lng: f64, max_lat: f64) -> Self {
        BoundingBox {
            min_lng,
            min_lat,
            max_lng,
            max_lat,
        }
    }

    pub fn center(&self) -> Position {
        Position::new(
            (self.min_lng + self.max_lng) / 2.0,
            (self.min_lat + self.max_lat) / 2.0,
        )
    }
}

/// Stacking role of a tile set. Stack order is fixed:
/// Background under Partial under Indicative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TileSetType {
    Background,
    Partial,
    Indicative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TileSetStatus {
    Visible,
    Hidden,
    Deactivated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileSetScheme {
    Tms,
    Xyz,
}

/// Server-defined raster source. Immutable on the client; display state
/// lives in the layer wrapping it, never here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileSet {
    pub id: Uuid,
    pub name: String,
    /// Source URL template ({z}/{x}/{y} placeholders).
    pub url: String,
    pub scheme: TileSetScheme,
    pub tile_set_type: TileSetType,
    pub status: TileSetStatus,
    /// Capture date of the imagery.
    pub date: DateTime<Utc>,
    pub min_zoom: Option<u32>,
    pub max_zoom: Option<u32>,
    /// Area actually covered by the imagery, if not the whole territory.
    pub geometry: Option<Polygon>,
}

/// An AI-detectable object category (swimming pool, shed, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectType {
    pub uuid: Uuid,
    pub name: String,
    pub color: String,
}

/// Visibility of an object type within one category of the settings payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjectTypeCategoryStatus {
    Visible,
    Hidden,
}

/// A named area-of-interest polygon, independent of tile sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomZone {
    pub uuid: Uuid,
    pub name: String,
    pub color: String,
}

/// Review state of a detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DetectionValidationStatus {
    DetectedNotVerified,
    Suspect,
    Legitimate,
    Invalidated,
}

impl DetectionValidationStatus {
    /// Statuses a reviewer has not yet ruled on. Used as the default
    /// validation filter after settings ingestion.
    pub fn not_yet_reviewed() -> Vec<Self> {
        vec![Self::DetectedNotVerified, Self::Suspect]
    }

    /// Wire name, identical to the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DetectedNotVerified => "DETECTED_NOT_VERIFIED",
            Self::Suspect => "SUSPECT",
            Self::Legitimate => "LEGITIMATE",
            Self::Invalidated => "INVALIDATED",
        }
    }
}

/// Enforcement state of a detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DetectionControlStatus {
    NotControlled,
    PriorLetterSent,
    Verbalized,
    Rehabilitated,
}

impl DetectionControlStatus {
    pub fn all() -> Vec<Self> {
        vec![
            Self::NotControlled,
            Self::PriorLetterSent,
            Self::Verbalized,
            Self::Rehabilitated,
        ]
    }

    /// Wire name, identical to the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotControlled => "NOT_CONTROLLED",
            Self::PriorLetterSent => "PRIOR_LETTER_SENT",
            Self::Verbalized => "VERBALIZED",
            Self::Rehabilitated => "REHABILITATED",
        }
    }
}

/// Client-side predicate controlling which detections are fetched and
/// displayed. Immutable snapshot: the filter store replaces it wholesale
/// or merges field by field, it never mutates one in place.
///
/// Sets are ordered so query-parameter projections are deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectsFilter {
    pub object_type_uuids: BTreeSet<Uuid>,
    pub validation_statuses: BTreeSet<DetectionValidationStatus>,
    pub control_statuses: BTreeSet<DetectionControlStatus>,
    /// Minimum detection score, in [0, 1].
    pub score: f64,
    /// `Some(true)` = prescripted only, `Some(false)` = non-prescripted
    /// only, `None` = no filtering on prescription.
    pub prescripted: Option<bool>,
    pub custom_zone_uuids: BTreeSet<Uuid>,
}
