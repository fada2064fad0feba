//! Parking spot business rules.
//!
//! The status machine has two states and two edges:
//!
//! ```text
//!   available ──check-in──▶ occupied
//!   occupied ──check-out──▶ available
//! ```
//!
//! Every status mutation is checked against [`STATUS_TRANSITIONS`] before
//! it is written.

use rust_decimal::Decimal;

use crate::error::{ParkadeError, ParkadeResult};
use crate::models::parking_spot::{SpotFeatures, SpotStatus};

/// Allowed `(from, to)` status edges.
pub const STATUS_TRANSITIONS: &[(SpotStatus, SpotStatus)] = &[
    (SpotStatus::Available, SpotStatus::Occupied),
    (SpotStatus::Occupied, SpotStatus::Available),
];

/// Upper bound for a spot's rate.
pub const MAX_RATE: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);

pub fn can_transition(from: SpotStatus, to: SpotStatus) -> bool {
    STATUS_TRANSITIONS.contains(&(from, to))
}

pub fn validate_status_transition(from: SpotStatus, to: SpotStatus) -> ParkadeResult<()> {
    if from == to {
        return Err(ParkadeError::validation(
            "status",
            "cannot transition to the same status",
        ));
    }
    if !can_transition(from, to) {
        return Err(ParkadeError::validation(
            "status",
            format!("cannot transition from {from} to {to}"),
        ));
    }
    Ok(())
}

pub fn validate_rate(rate: Decimal) -> ParkadeResult<()> {
    if rate <= Decimal::ZERO {
        return Err(ParkadeError::validation(
            "rate",
            "Parking rate must be greater than 0",
        ));
    }
    if rate > MAX_RATE {
        return Err(ParkadeError::validation(
            "rate",
            format!("Parking rate cannot exceed {MAX_RATE}"),
        ));
    }
    Ok(())
}

/// Absent and `null` are accepted; anything else must parse as a
/// [`SpotFeatures`] object.
pub fn validate_features(features: Option<&serde_json::Value>) -> ParkadeResult<()> {
    match features {
        None | Some(serde_json::Value::Null) => Ok(()),
        Some(value) => SpotFeatures::from_json(value).map(|_| ()),
    }
}
