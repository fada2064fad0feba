//! Listing filters and occupancy queries.
//!
//! The in-memory functions here define the semantics; repository
//! implementations translate [`SpotFilter`] into their own query language
//! and must agree with [`SpotFilter::matches`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::car::Car;
use crate::models::parking_spot::{ParkingSpot, SpotSize, SpotStatus};

/// Number of check-outs returned by history queries unless configured
/// otherwise.
pub const DEFAULT_RECENT_CHECKOUTS: usize = 10;

/// Bay predicate. "No bay" and "any bay" are distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BayFilter {
    #[default]
    Any,
    /// Only spots that are not grouped into a bay.
    Unassigned,
    In(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

/// Conjunction of optional spot predicates. An absent predicate matches
/// everything; results are ordered by creation time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotFilter {
    pub status: Option<SpotStatus>,
    pub floor_id: Option<Uuid>,
    pub bay: BayFilter,
    pub size: Option<SpotSize>,
    pub order: SortDirection,
}

impl SpotFilter {
    pub fn with_status(mut self, status: SpotStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn on_floor(mut self, floor_id: Uuid) -> Self {
        self.floor_id = Some(floor_id);
        self
    }

    pub fn in_bay(mut self, bay: BayFilter) -> Self {
        self.bay = bay;
        self
    }

    pub fn with_size(mut self, size: SpotSize) -> Self {
        self.size = Some(size);
        self
    }

    pub fn matches(&self, spot: &ParkingSpot) -> bool {
        if self.status.is_some_and(|s| s != spot.status) {
            return false;
        }
        if self.floor_id.is_some_and(|f| f != spot.floor_id) {
            return false;
        }
        if self.size.is_some_and(|s| s != spot.size) {
            return false;
        }
        match self.bay {
            BayFilter::Any => true,
            BayFilter::Unassigned => spot.bay_id.is_none(),
            BayFilter::In(bay_id) => spot.bay_id == Some(bay_id),
        }
    }

    /// Filter and order a slice of spots.
    pub fn apply(&self, spots: &[ParkingSpot]) -> Vec<ParkingSpot> {
        let mut out: Vec<ParkingSpot> = spots.iter().filter(|s| self.matches(s)).cloned().collect();
        match self.order {
            SortDirection::Ascending => out.sort_by_key(|s| s.created_at),
            SortDirection::Descending => out.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        }
        out
    }
}

/// Cars currently checked in.
pub fn select_checked_in(cars: &[Car]) -> Vec<Car> {
    cars.iter().filter(|c| c.is_checked_in()).cloned().collect()
}

/// The `limit` most recent check-outs, newest first.
pub fn select_recent_checkouts(cars: &[Car], limit: usize) -> Vec<Car> {
    let mut out: Vec<Car> = cars
        .iter()
        .filter(|c| c.checked_out_at.is_some())
        .cloned()
        .collect();
    out.sort_by(|a, b| b.checked_out_at.cmp(&a.checked_out_at));
    out.truncate(limit);
    out
}

/// A point where spot status and car occupancy disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OccupancyViolation {
    /// Spot is `occupied` but no car is checked in to it.
    OccupiedWithoutCar { spot_id: Uuid },
    /// Spot is `available` yet has active occupants.
    AvailableWithCars { spot_id: Uuid, car_ids: Vec<Uuid> },
    /// More than one active car points at the same spot.
    DoubleBooked { spot_id: Uuid, car_ids: Vec<Uuid> },
    /// An active car points at a spot that does not exist.
    MissingSpot { car_id: Uuid, spot_id: Uuid },
}

/// Check the occupancy relation: a spot is occupied iff exactly one car
/// references it with no check-out time.
pub fn find_occupancy_violations(spots: &[ParkingSpot], cars: &[Car]) -> Vec<OccupancyViolation> {
    let mut occupants: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for car in cars.iter().filter(|c| c.checked_out_at.is_none()) {
        if let Some(spot_id) = car.parking_spot_id {
            occupants.entry(spot_id).or_default().push(car.id);
        }
    }

    let mut violations = Vec::new();
    for spot in spots {
        let car_ids = occupants.remove(&spot.id).unwrap_or_default();
        match (spot.status, car_ids.len()) {
            (SpotStatus::Occupied, 0) => {
                violations.push(OccupancyViolation::OccupiedWithoutCar { spot_id: spot.id });
            }
            (SpotStatus::Occupied, 1) => {}
            (SpotStatus::Occupied, _) => violations.push(OccupancyViolation::DoubleBooked {
                spot_id: spot.id,
                car_ids,
            }),
            (SpotStatus::Available, 0) => {}
            (SpotStatus::Available, _) => violations.push(OccupancyViolation::AvailableWithCars {
                spot_id: spot.id,
                car_ids,
            }),
        }
    }

    // Whatever is left references spots we were not given.
    let mut dangling: Vec<_> = occupants.into_iter().collect();
    dangling.sort();
    for (spot_id, car_ids) in dangling {
        for car_id in car_ids {
            violations.push(OccupancyViolation::MissingSpot { car_id, spot_id });
        }
    }

    violations
}
