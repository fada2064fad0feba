//! Car domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::validation::LicensePlate;

/// A vehicle known to the garage.
///
/// A car row survives check-out as history and is reused when the same
/// plate checks in again.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Car {
    pub id: Uuid,
    /// Normalized (trimmed, uppercase) plate.
    pub license_plate: String,
    /// Set exactly while the car is checked in.
    pub parking_spot_id: Option<Uuid>,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub checked_out_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Car {
    pub fn is_checked_in(&self) -> bool {
        self.checked_in_at.is_some()
            && self.checked_out_at.is_none()
            && self.parking_spot_id.is_some()
    }

    pub fn is_checked_out(&self) -> bool {
        self.checked_out_at.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCar {
    pub license_plate: LicensePlate,
    pub parking_spot_id: Option<Uuid>,
    pub checked_in_at: Option<DateTime<Utc>>,
}

impl CreateCar {
    /// A car record with no occupancy history.
    pub fn parked_nowhere(license_plate: LicensePlate) -> Self {
        Self {
            license_plate,
            parking_spot_id: None,
            checked_in_at: None,
        }
    }
}

/// Fields that can be updated on an existing car.
///
/// For the nullable fields: `Some(Some(v))` = set, `Some(None)` = clear,
/// `None` = no change.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateCar {
    pub license_plate: Option<LicensePlate>,
    pub parking_spot_id: Option<Option<Uuid>>,
    pub checked_in_at: Option<Option<DateTime<Utc>>>,
    pub checked_out_at: Option<Option<DateTime<Utc>>>,
}

impl UpdateCar {
    /// An update that puts the occupancy fields back to those of `car`.
    pub fn restore_occupancy(car: &Car) -> Self {
        Self {
            license_plate: None,
            parking_spot_id: Some(car.parking_spot_id),
            checked_in_at: Some(car.checked_in_at),
            checked_out_at: Some(car.checked_out_at),
        }
    }
}
