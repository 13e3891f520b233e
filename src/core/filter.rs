//! Nearby-event selection.

use super::feed::EventRecord;
use super::geo::Coordinate;

/// An event together with its distance from the observation point
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluatedEvent {
    pub record: EventRecord,
    pub distance_km: f64,
}

impl EvaluatedEvent {
    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn magnitude(&self) -> f64 {
        self.record.magnitude
    }
}

/// Events within `max_distance_km` of `origin`, in feed order
pub fn nearby_events(
    records: &[EventRecord],
    origin: &Coordinate,
    max_distance_km: f64,
) -> Vec<EvaluatedEvent> {
    records
        .iter()
        .filter_map(|record| {
            let distance_km = origin.distance_to(&record.coordinate);
            (distance_km <= max_distance_km).then(|| EvaluatedEvent {
                record: record.clone(),
                distance_km,
            })
        })
        .collect()
}

/// The strongest event within range.
///
/// When several nearby events share the highest magnitude, the one listed
/// first in the feed wins.
pub fn select_strongest(
    records: &[EventRecord],
    origin: &Coordinate,
    max_distance_km: f64,
) -> Option<EvaluatedEvent> {
    nearby_events(records, origin, max_distance_km)
        .into_iter()
        .reduce(|best, candidate| {
            if candidate.magnitude() > best.magnitude() {
                candidate
            } else {
                best
            }
        })
}
