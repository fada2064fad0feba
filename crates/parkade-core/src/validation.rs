//! Entity validators.
//!
//! Pure checks over prospective field sets. Referential existence of
//! parent ids is not checked here; that belongs to the services, which
//! can see the repositories.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ParkadeError, ParkadeResult};
use crate::models::parking_spot::CreateParkingSpot;
use crate::rules;

/// Maximum plate length, in characters, after normalization.
pub const MAX_LICENSE_PLATE_LEN: usize = 20;

/// A normalized license plate: trimmed, uppercase, 1 to 20 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LicensePlate(String);

impl LicensePlate {
    pub fn parse(raw: &str) -> ParkadeResult<Self> {
        let normalized = raw.trim().to_uppercase();

        if normalized.is_empty() {
            return Err(ParkadeError::validation(
                "license_plate",
                "License plate cannot be empty",
            ));
        }
        if normalized.chars().count() > MAX_LICENSE_PLATE_LEN {
            return Err(ParkadeError::validation(
                "license_plate",
                format!("License plate cannot exceed {MAX_LICENSE_PLATE_LEN} characters"),
            ));
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LicensePlate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for LicensePlate {
    type Error = ParkadeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<LicensePlate> for String {
    fn from(value: LicensePlate) -> Self {
        value.0
    }
}

fn require_text(field: &str, value: &str, label: &str) -> ParkadeResult<()> {
    if value.trim().is_empty() {
        return Err(ParkadeError::validation(field, format!("{label} is required")));
    }
    Ok(())
}

fn require_id(field: &str, value: Uuid, label: &str) -> ParkadeResult<()> {
    if value.is_nil() {
        return Err(ParkadeError::validation(field, format!("{label} is required")));
    }
    Ok(())
}

pub fn validate_garage(name: &str, location: &str) -> ParkadeResult<()> {
    require_text("name", name, "Garage name")?;
    require_text("location", location, "Garage location")
}

pub fn validate_floor(garage_id: Uuid, name: &str) -> ParkadeResult<()> {
    require_id("garage_id", garage_id, "Garage ID")?;
    require_text("name", name, "Floor name")
}

pub fn validate_bay(floor_id: Uuid, name: &str) -> ParkadeResult<()> {
    require_id("floor_id", floor_id, "Floor ID")?;
    require_text("name", name, "Bay name")
}

pub fn validate_parking_spot(input: &CreateParkingSpot) -> ParkadeResult<()> {
    require_id("floor_id", input.floor_id, "Floor ID")?;
    require_text("name", &input.name, "Parking spot name")?;
    rules::validate_rate(input.rate)?;
    rules::validate_features(input.features.as_ref())
}

pub fn validate_parking_fee(car_id: Uuid) -> ParkadeResult<()> {
    require_id("car_id", car_id, "Car ID")
}
