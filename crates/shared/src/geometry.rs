use thiserror::Error;

use crate::models::{BoundingBox, Polygon, Position};

/// Malformed polygon input. Always surfaced to the caller: a bad geometry
/// here means a data-integrity bug upstream, never something to paper over.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
}

/// A ring needs at least 4 positions to be closed (triangle + repeated
/// first point).
const MIN_RING_LEN: usize = 4;

fn validate(polygon: &Polygon) -> Result<(), GeometryError> {
    if polygon.rings.is_empty() {
        return Err(GeometryError::InvalidGeometry(
            "polygon has no rings".to_string(),
        ));
    }
    for (i, ring) in polygon.rings.iter().enumerate() {
        if ring.len() < MIN_RING_LEN {
            return Err(GeometryError::InvalidGeometry(format!(
                "ring {} has {} positions, need at least {}",
                i,
                ring.len(),
                MIN_RING_LEN
            )));
        }
    }
    Ok(())
}

/// Tightest box enclosing every vertex of every ring (holes included, so a
/// degenerate hole sticking out of the outer ring still widens the box).
pub fn compute_bounding_box(polygon: &Polygon) -> Result<BoundingBox, GeometryError> {
    validate(polygon)?;

    let mut min_lng = f64::MAX;
    let mut min_lat = f64::MAX;
    let mut max_lng = f64::MIN;
    let mut max_lat = f64::MIN;

    for ring in &polygon.rings {
        for p in ring {
            min_lng = min_lng.min(p.lng);
            min_lat = min_lat.min(p.lat);
            max_lng = max_lng.max(p.lng);
            max_lat = max_lat.max(p.lat);
        }
    }

    Ok(BoundingBox::new(min_lng, min_lat, max_lng, max_lat))
}

/// Grow `bbox` symmetrically around its center by `factor`: `factor = 1`
/// doubles the width and height, `factor = 0` is the identity. Negative
/// factors shrink the box and are clamped at -1 so min/max ordering can
/// never invert.
pub fn extend_bounding_box(bbox: &BoundingBox, factor: f64) -> BoundingBox {
    let factor = factor.max(-1.0);
    let center = bbox.center();
    let half_w = (bbox.max_lng - bbox.min_lng) / 2.0 * (1.0 + factor);
    let half_h = (bbox.max_lat - bbox.min_lat) / 2.0 * (1.0 + factor);
    BoundingBox::new(
        center.lng - half_w,
        center.lat - half_h,
        center.lng + half_w,
        center.lat + half_h,
    )
}

/// Closed 5-point ring tracing `bbox` clockwise from the min corner.
pub fn bounding_box_to_polygon(bbox: &BoundingBox) -> Polygon {
    Polygon::new(vec![vec![
        Position::new(bbox.min_lng, bbox.min_lat),
        Position::new(bbox.min_lng, bbox.max_lat),
        Position::new(bbox.max_lng, bbox.max_lat),
        Position::new(bbox.max_lng, bbox.min_lat),
        Position::new(bbox.min_lng, bbox.min_lat),
    ]])
}

/// Ray-casting containment test for a single ring (odd number of
/// crossings of a ray going east from the point).
///
/// Boundary convention: edges are half-open. For an axis-aligned ring this
/// means points exactly on the bottom or left edge are inside, points on
/// the top or right edge are outside. Callers must not rely on any finer
/// boundary behavior than that.
fn ring_contains(ring: &[Position], point: Position) -> bool {
    if ring.is_empty() {
        return false;
    }
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[j];
        if (a.lat > point.lat) != (b.lat > point.lat) {
            let crossing_lng = a.lng + (point.lat - a.lat) / (b.lat - a.lat) * (b.lng - a.lng);
            if point.lng < crossing_lng {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// True when `point` lies inside the polygon's outer ring and outside all
/// of its holes. An empty polygon contains nothing.
pub fn point_in_polygon(polygon: &Polygon, point: Position) -> bool {
    let Some(outer) = polygon.rings.first() else {
        return false;
    };
    if !ring_contains(outer, point) {
        return false;
    }
    !polygon.rings[1..].iter().any(|hole| ring_contains(hole, point))
}
