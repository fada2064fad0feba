//! Parking fee domain model.
//!
//! A fee is an independent billing record for a car. The occupancy
//! workflow never reads or writes fees.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParkingFee {
    pub id: Uuid,
    pub car_id: Uuid,
    pub billed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateParkingFee {
    pub car_id: Uuid,
    /// Defaults to the creation time when absent.
    pub billed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateParkingFee {
    pub car_id: Option<Uuid>,
    pub billed_at: Option<DateTime<Utc>>,
}
