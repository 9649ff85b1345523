//! Detection filter state: the active [`ObjectsFilter`] plus its
//! translation into the query parameters the data-fetching layer appends
//! to detection requests.

use std::collections::BTreeSet;

use uuid::Uuid;

use aigle_shared::models::{
    DetectionControlStatus, DetectionValidationStatus, ObjectsFilter,
};

/// Field-wise patch for [`FilterStore::update`]. `None` leaves the field
/// untouched; the prescription flag is doubly optional because clearing it
/// (`Some(None)`) is itself a meaningful update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectsFilterUpdate {
    pub object_type_uuids: Option<BTreeSet<Uuid>>,
    pub validation_statuses: Option<BTreeSet<DetectionValidationStatus>>,
    pub control_statuses: Option<BTreeSet<DetectionControlStatus>>,
    pub score: Option<f64>,
    pub prescripted: Option<Option<bool>>,
    pub custom_zone_uuids: Option<BTreeSet<Uuid>>,
}

/// Owner of the active detection filter. Pure state container: no side
/// effects beyond its own snapshot, read by the query builders of the
/// data-fetching layer.
pub struct FilterStore {
    filter: ObjectsFilter,
}

impl FilterStore {
    pub fn new(initial: ObjectsFilter) -> Self {
        FilterStore { filter: initial }
    }

    /// Defensive clone of the current filter; the store's copy cannot be
    /// mutated through it.
    pub fn current(&self) -> ObjectsFilter {
        self.filter.clone()
    }

    /// Shallow-merges `update` into the current filter and returns the new
    /// complete snapshot. Scores outside [0, 1] are clamped, not rejected:
    /// slider UIs routinely overshoot the boundary by a float ulp.
    pub fn update(&mut self, update: ObjectsFilterUpdate) -> ObjectsFilter {
        let mut next = self.filter.clone();
        if let Some(object_type_uuids) = update.object_type_uuids {
            next.object_type_uuids = object_type_uuids;
        }
        if let Some(validation_statuses) = update.validation_statuses {
            next.validation_statuses = validation_statuses;
        }
        if let Some(control_statuses) = update.control_statuses {
            next.control_statuses = control_statuses;
        }
        if let Some(score) = update.score {
            next.score = score.clamp(0.0, 1.0);
        }
        if let Some(prescripted) = update.prescripted {
            next.prescripted = prescripted;
        }
        if let Some(custom_zone_uuids) = update.custom_zone_uuids {
            next.custom_zone_uuids = custom_zone_uuids;
        }
        self.filter = next;
        self.filter.clone()
    }

    /// Wholesale replacement, used when re-seeding from fresh settings.
    pub fn reset(&mut self, defaults: ObjectsFilter) {
        self.filter = defaults;
    }
}

/// Query-string pairs for a detection request. Deterministic: set fields
/// are ordered, so the same filter always yields the same URL (which keeps
/// HTTP-level caching effective). The prescription pair is omitted when
/// the flag is unset.
pub fn to_query_params(filter: &ObjectsFilter) -> Vec<(String, String)> {
    let join_uuids = |uuids: &BTreeSet<Uuid>| {
        uuids
            .iter()
            .map(Uuid::to_string)
            .collect::<Vec<_>>()
            .join(",")
    };

    let mut params = vec![
        (
            "objectTypesUuids".to_string(),
            join_uuids(&filter.object_type_uuids),
        ),
        (
            "detectionValidationStatuses".to_string(),
            filter
                .validation_statuses
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(","),
        ),
        (
            "detectionControlStatuses".to_string(),
            filter
                .control_statuses
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(","),
        ),
        ("score".to_string(), format!("{}", filter.score)),
        (
            "customZonesUuids".to_string(),
            join_uuids(&filter.custom_zone_uuids),
        ),
    ];
    if let Some(prescripted) = filter.prescripted {
        params.push(("prescripted".to_string(), prescripted.to_string()));
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_filter() -> ObjectsFilter {
        ObjectsFilter {
            object_type_uuids: [Uuid::from_u128(1)].into_iter().collect(),
            validation_statuses: [DetectionValidationStatus::DetectedNotVerified]
                .into_iter()
                .collect(),
            control_statuses: [DetectionControlStatus::NotControlled]
                .into_iter()
                .collect(),
            score: 0.6,
            prescripted: None,
            custom_zone_uuids: [Uuid::from_u128(2)].into_iter().collect(),
        }
    }

    #[test]
    fn test_update_merges_only_provided_fields() {
        let mut store = FilterStore::new(base_filter());
        let merged = store.update(ObjectsFilterUpdate {
            score: Some(0.9),
            ..Default::default()
        });

        let mut expected = base_filter();
        expected.score = 0.9;
        assert_eq!(merged, expected);
        assert_eq!(store.current(), expected);
    }

    #[test]
    fn test_update_clamps_score() {
        let mut store = FilterStore::new(base_filter());
        assert_eq!(
            store
                .update(ObjectsFilterUpdate {
                    score: Some(1.2),
                    ..Default::default()
                })
                .score,
            1.0
        );
        assert_eq!(
            store
                .update(ObjectsFilterUpdate {
                    score: Some(-0.3),
                    ..Default::default()
                })
                .score,
            0.0
        );
    }

    #[test]
    fn test_update_can_clear_prescription_flag() {
        let mut filter = base_filter();
        filter.prescripted = Some(true);
        let mut store = FilterStore::new(filter);

        let merged = store.update(ObjectsFilterUpdate {
            prescripted: Some(None),
            ..Default::default()
        });
        assert_eq!(merged.prescripted, None);
    }

    #[test]
    fn test_reset_replaces_wholesale() {
        let mut store = FilterStore::new(base_filter());
        store.update(ObjectsFilterUpdate {
            score: Some(0.1),
            ..Default::default()
        });

        store.reset(base_filter());
        assert_eq!(store.current(), base_filter());
    }

    #[test]
    fn test_query_params_shape() {
        let mut filter = base_filter();
        filter.prescripted = Some(false);
        let params = to_query_params(&filter);

        let get = |key: &str| {
            params
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
                .unwrap()
        };
        assert_eq!(get("objectTypesUuids"), Uuid::from_u128(1).to_string());
        assert_eq!(get("detectionValidationStatuses"), "DETECTED_NOT_VERIFIED");
        assert_eq!(get("detectionControlStatuses"), "NOT_CONTROLLED");
        assert_eq!(get("score"), "0.6");
        assert_eq!(get("prescripted"), "false");
    }

    #[test]
    fn test_query_params_omit_unset_prescription() {
        let params = to_query_params(&base_filter());
        assert!(params.iter().all(|(k, _)| k != "prescripted"));
    }

    #[test]
    fn test_query_params_join_multiple_statuses() {
        let mut filter = base_filter();
        filter.validation_statuses = [
            DetectionValidationStatus::Suspect,
            DetectionValidationStatus::DetectedNotVerified,
        ]
        .into_iter()
        .collect();
        let params = to_query_params(&filter);
        let statuses = &params
            .iter()
            .find(|(k, _)| k == "detectionValidationStatuses")
            .unwrap()
            .1;
        // BTreeSet order: declaration order of the enum
        assert_eq!(statuses, "DETECTED_NOT_VERIFIED,SUSPECT");
    }
}
