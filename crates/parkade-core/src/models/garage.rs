//! Garage domain model.
//!
//! A garage is the root of the parking layout. It owns floors, which in
//! turn own bays and parking spots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Garage {
    pub id: Uuid,
    pub name: String,
    /// Free-form address or description of where the garage is.
    pub location: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a new garage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGarage {
    pub name: String,
    pub location: String,
}

/// Fields that can be updated on an existing garage.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateGarage {
    pub name: Option<String>,
    pub location: Option<String>,
}
