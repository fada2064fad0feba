//! Parking spot domain model.
//!
//! A parking spot is the unit of occupancy. Its `status` is one half of
//! the occupancy relation; the other half lives on [`Car`](super::car::Car).
//! Status is absent from [`UpdateParkingSpot`]: it only moves
//! through the occupancy coordinator.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ParkadeError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SpotSize {
    Compact,
    Standard,
    Oversized,
}

impl SpotSize {
    pub const ALL: [SpotSize; 3] = [Self::Compact, Self::Standard, Self::Oversized];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Standard => "standard",
            Self::Oversized => "oversized",
        }
    }
}

impl fmt::Display for SpotSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpotSize {
    type Err = ParkadeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "compact" => Ok(Self::Compact),
            "standard" => Ok(Self::Standard),
            "oversized" => Ok(Self::Oversized),
            other => Err(ParkadeError::validation(
                "size",
                format!("invalid spot size '{other}', must be one of: compact, standard, oversized"),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SpotStatus {
    Available,
    Occupied,
}

impl SpotStatus {
    pub const ALL: [SpotStatus; 2] = [Self::Available, Self::Occupied];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Occupied => "occupied",
        }
    }
}

impl fmt::Display for SpotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpotStatus {
    type Err = ParkadeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(Self::Available),
            "occupied" => Ok(Self::Occupied),
            other => Err(ParkadeError::validation(
                "status",
                format!("invalid status '{other}', must be one of: available, occupied"),
            )),
        }
    }
}

/// Amenity flags of a parking spot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SpotFeatures {
    pub ev_charging: bool,
    pub handicap: bool,
    pub vip: bool,
    pub covered: bool,
}

impl SpotFeatures {
    const KEYS: [&'static str; 4] = ["evCharging", "handicap", "vip", "covered"];

    /// Parse a feature bag from a JSON object.
    ///
    /// Unknown keys are ignored and missing keys read as `false`. The value
    /// itself must be an object, and every known key present must hold a
    /// boolean.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, ParkadeError> {
        let map = value.as_object().ok_or_else(|| {
            ParkadeError::validation("features", "Features must be a valid JSON object")
        })?;

        let mut flags = [false; 4];
        for (flag, key) in flags.iter_mut().zip(Self::KEYS) {
            match map.get(key) {
                None | Some(serde_json::Value::Null) => {}
                Some(serde_json::Value::Bool(b)) => *flag = *b,
                Some(_) => {
                    return Err(ParkadeError::validation(
                        "features",
                        format!("feature '{key}' must be a boolean"),
                    ));
                }
            }
        }

        let [ev_charging, handicap, vip, covered] = flags;
        Ok(Self {
            ev_charging,
            handicap,
            vip,
            covered,
        })
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "evCharging": self.ev_charging,
            "handicap": self.handicap,
            "vip": self.vip,
            "covered": self.covered,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParkingSpot {
    pub id: Uuid,
    pub floor_id: Uuid,
    /// `None` when the spot is not grouped into a bay.
    pub bay_id: Option<Uuid>,
    pub name: String,
    pub size: SpotSize,
    pub status: SpotStatus,
    /// Hourly rate, in (0, 10000].
    pub rate: Decimal,
    pub features: Option<SpotFeatures>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ParkingSpot {
    pub fn is_available(&self) -> bool {
        self.status == SpotStatus::Available
    }

    pub fn is_occupied(&self) -> bool {
        self.status == SpotStatus::Occupied
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateParkingSpot {
    pub floor_id: Uuid,
    pub bay_id: Option<Uuid>,
    pub name: String,
    pub size: SpotSize,
    pub status: SpotStatus,
    pub rate: Decimal,
    /// Raw feature bag as received; validated by
    /// [`validate_features`](crate::rules::validate_features).
    pub features: Option<serde_json::Value>,
}

/// Fields that can be updated on an existing parking spot.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateParkingSpot {
    pub floor_id: Option<Uuid>,
    /// `Some(Some(id))` = move into a bay, `Some(None)` = ungroup, `None` = no change.
    pub bay_id: Option<Option<Uuid>>,
    pub name: Option<String>,
    pub size: Option<SpotSize>,
    pub rate: Option<Decimal>,
    /// `Some(Some(v))` = replace, `Some(None)` = clear, `None` = no change.
    pub features: Option<Option<serde_json::Value>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn size_and_status_round_trip_through_strings() {
        for size in SpotSize::ALL {
            assert_eq!(size.as_str().parse::<SpotSize>().unwrap(), size);
        }
        for status in SpotStatus::ALL {
            assert_eq!(status.as_str().parse::<SpotStatus>().unwrap(), status);
        }
    }

    #[test]
    fn unknown_size_is_rejected() {
        let err = "huge".parse::<SpotSize>().unwrap_err();
        assert!(matches!(err, ParkadeError::Validation { ref field, .. } if field == "size"));
    }

    #[test]
    fn unknown_status_is_rejected() {
        let err = "reserved".parse::<SpotStatus>().unwrap_err();
        assert!(matches!(err, ParkadeError::Validation { ref field, .. } if field == "status"));
    }

    #[test]
    fn features_ignore_unknown_keys() {
        let features = SpotFeatures::from_json(&json!({
            "evCharging": true,
            "covered": true,
            "valet": "yes"
        }))
        .unwrap();
        assert!(features.ev_charging);
        assert!(features.covered);
        assert!(!features.handicap);
        assert!(!features.vip);
    }

    #[test]
    fn features_reject_non_objects() {
        assert!(SpotFeatures::from_json(&json!([true, false])).is_err());
        assert!(SpotFeatures::from_json(&json!("vip")).is_err());
    }

    #[test]
    fn features_reject_non_boolean_flags() {
        assert!(SpotFeatures::from_json(&json!({ "vip": 1 })).is_err());
    }

    #[test]
    fn features_serialize_back_to_the_same_bag() {
        let features = SpotFeatures {
            vip: true,
            ..Default::default()
        };
        assert_eq!(SpotFeatures::from_json(&features.to_json()).unwrap(), features);
    }
}
