//! Bay domain model.
//!
//! Bays are an optional grouping of parking spots within a floor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Bay {
    pub id: Uuid,
    pub floor_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBay {
    pub floor_id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateBay {
    pub floor_id: Option<Uuid>,
    pub name: Option<String>,
}
