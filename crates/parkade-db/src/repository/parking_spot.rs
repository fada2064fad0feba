//! SurrealDB implementation of [`ParkingSpotRepository`].
//!
//! Status writes go through [`update_status`](ParkingSpotRepository::update_status),
//! which is a conditional `UPDATE ... WHERE status = $expected`. The
//! descriptive [`update`](ParkingSpotRepository::update) never touches
//! status.

use chrono::{DateTime, Utc};
use parkade_core::error::{ParkadeError, ParkadeResult};
use parkade_core::models::parking_spot::{
    CreateParkingSpot, ParkingSpot, SpotFeatures, SpotStatus, UpdateParkingSpot,
};
use parkade_core::query::{BayFilter, SortDirection, SpotFilter};
use parkade_core::repository::{CONCURRENT_MODIFICATION, ParkingSpotRepository};
use rust_decimal::Decimal;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use super::{parse_id, parse_opt_id, single};
use crate::error::DbError;

const TABLE: &str = "parking_spot";

#[derive(Debug, SurrealValue)]
struct ParkingSpotRow {
    floor_id: String,
    bay_id: Option<String>,
    name: String,
    size: String,
    status: String,
    rate: Decimal,
    features: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ParkingSpotRow {
    fn into_spot(self, id: Uuid) -> Result<ParkingSpot, DbError> {
        let features = self
            .features
            .as_ref()
            .map(SpotFeatures::from_json)
            .transpose()
            .map_err(|e| DbError::decode(TABLE, e.to_string()))?;

        Ok(ParkingSpot {
            id,
            floor_id: parse_id(TABLE, "floor", &self.floor_id)?,
            bay_id: parse_opt_id(TABLE, "bay", self.bay_id.as_deref())?,
            name: self.name,
            size: self
                .size
                .parse()
                .map_err(|e: ParkadeError| DbError::decode(TABLE, e.to_string()))?,
            status: self
                .status
                .parse()
                .map_err(|e: ParkadeError| DbError::decode(TABLE, e.to_string()))?,
            rate: self.rate,
            features,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct ParkingSpotRowWithId {
    record_id: String,
    floor_id: String,
    bay_id: Option<String>,
    name: String,
    size: String,
    status: String,
    rate: Decimal,
    features: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ParkingSpotRowWithId {
    fn try_into_spot(self) -> Result<ParkingSpot, DbError> {
        let id = parse_id(TABLE, "record", &self.record_id)?;
        ParkingSpotRow {
            floor_id: self.floor_id,
            bay_id: self.bay_id,
            name: self.name,
            size: self.size,
            status: self.status,
            rate: self.rate,
            features: self.features,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_spot(id)
    }
}

#[derive(Debug, SurrealValue)]
struct StatusRow {
    status: String,
}

/// Canonical stored form of a feature bag: known flags only, `null`
/// collapsed to absent.
fn canonical_features(raw: Option<serde_json::Value>) -> ParkadeResult<Option<serde_json::Value>> {
    match raw {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(value) => Ok(Some(SpotFeatures::from_json(&value)?.to_json())),
    }
}

/// Translate a [`SpotFilter`] into a `WHERE` / `ORDER BY` tail plus the
/// bindings it refers to.
fn filter_clause(filter: &SpotFilter) -> (String, Vec<(&'static str, String)>) {
    let mut conditions = Vec::new();
    let mut binds = Vec::new();

    if let Some(status) = filter.status {
        conditions.push("status = $status");
        binds.push(("status", status.as_str().to_string()));
    }
    if let Some(floor_id) = filter.floor_id {
        conditions.push("floor_id = $floor_id");
        binds.push(("floor_id", floor_id.to_string()));
    }
    match filter.bay {
        BayFilter::Any => {}
        BayFilter::Unassigned => conditions.push("bay_id = NONE"),
        BayFilter::In(bay_id) => {
            conditions.push("bay_id = $bay_id");
            binds.push(("bay_id", bay_id.to_string()));
        }
    }
    if let Some(size) = filter.size {
        conditions.push("size = $size");
        binds.push(("size", size.as_str().to_string()));
    }

    let mut clause = String::new();
    if !conditions.is_empty() {
        clause.push_str(" WHERE ");
        clause.push_str(&conditions.join(" AND "));
    }
    clause.push_str(match filter.order {
        SortDirection::Ascending => " ORDER BY created_at ASC",
        SortDirection::Descending => " ORDER BY created_at DESC",
    });

    (clause, binds)
}

/// SurrealDB implementation of the ParkingSpot repository.
#[derive(Clone)]
pub struct SurrealParkingSpotRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealParkingSpotRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Error for a status-guarded write that matched nothing: either the
    /// spot is gone or its status moved away from `expected`.
    async fn lost_race(&self, id: Uuid, expected: SpotStatus) -> ParkadeError {
        let current = match self.current_status(id).await {
            Ok(row) => row,
            Err(err) => return err.into(),
        };
        debug!(
            spot_id = %id,
            expected = %expected,
            found = %current.status,
            "Spot status compare-and-swap lost"
        );
        ParkadeError::conflict(
            CONCURRENT_MODIFICATION,
            format!(
                "parking spot status changed concurrently (expected {expected}, found {})",
                current.status
            ),
        )
    }

    async fn current_status(&self, id: Uuid) -> Result<StatusRow, DbError> {
        let id_str = id.to_string();
        let mut result = self
            .db
            .query("SELECT status FROM type::record('parking_spot', $id)")
            .bind(("id", id_str.clone()))
            .await?;
        let rows: Vec<StatusRow> = result.take(0)?;
        single(rows, TABLE, &id_str)
    }
}

impl<C: Connection> ParkingSpotRepository for SurrealParkingSpotRepository<C> {
    async fn create(&self, input: CreateParkingSpot) -> ParkadeResult<ParkingSpot> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let features = canonical_features(input.features)?;

        let result = self
            .db
            .query(
                "CREATE type::record('parking_spot', $id) SET \
                 floor_id = $floor_id, bay_id = $bay_id, name = $name, \
                 size = $size, status = $status, rate = $rate, \
                 features = $features",
            )
            .bind(("id", id_str.clone()))
            .bind(("floor_id", input.floor_id.to_string()))
            .bind(("bay_id", input.bay_id.map(|b| b.to_string())))
            .bind(("name", input.name))
            .bind(("size", input.size.as_str().to_string()))
            .bind(("status", input.status.as_str().to_string()))
            .bind(("rate", input.rate))
            .bind(("features", features))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;
        let rows: Vec<ParkingSpotRow> = result.take(0).map_err(DbError::from)?;

        Ok(single(rows, TABLE, &id_str)?.into_spot(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> ParkadeResult<ParkingSpot> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('parking_spot', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ParkingSpotRow> = result.take(0).map_err(DbError::from)?;
        Ok(single(rows, TABLE, &id_str)?.into_spot(id)?)
    }

    async fn update(&self, id: Uuid, input: UpdateParkingSpot) -> ParkadeResult<ParkingSpot> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.floor_id.is_some() {
            sets.push("floor_id = $floor_id");
        }
        if input.bay_id.is_some() {
            sets.push("bay_id = $bay_id");
        }
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.size.is_some() {
            sets.push("size = $size");
        }
        if input.rate.is_some() {
            sets.push("rate = $rate");
        }
        if input.features.is_some() {
            sets.push("features = $features");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('parking_spot', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));
        if let Some(floor_id) = input.floor_id {
            builder = builder.bind(("floor_id", floor_id.to_string()));
        }
        if let Some(bay_id) = input.bay_id {
            builder = builder.bind(("bay_id", bay_id.map(|b| b.to_string())));
        }
        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(size) = input.size {
            builder = builder.bind(("size", size.as_str().to_string()));
        }
        if let Some(rate) = input.rate {
            builder = builder.bind(("rate", rate));
        }
        if let Some(features) = input.features {
            builder = builder.bind(("features", canonical_features(features)?));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;
        let rows: Vec<ParkingSpotRow> = result.take(0).map_err(DbError::from)?;

        Ok(single(rows, TABLE, &id_str)?.into_spot(id)?)
    }

    async fn delete_available(&self, id: Uuid) -> ParkadeResult<()> {
        let result = self
            .db
            .query(
                "DELETE type::record('parking_spot', $id) \
                 WHERE status = $expected RETURN BEFORE",
            )
            .bind(("id", id.to_string()))
            .bind(("expected", SpotStatus::Available.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;
        let rows: Vec<ParkingSpotRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(self.lost_race(id, SpotStatus::Available).await);
        }
        Ok(())
    }

    async fn list(&self, filter: &SpotFilter) -> ParkadeResult<Vec<ParkingSpot>> {
        let (clause, binds) = filter_clause(filter);
        let query = format!("SELECT meta::id(id) AS record_id, * FROM parking_spot{clause}");

        let mut builder = self.db.query(&query);
        for (name, value) in binds {
            builder = builder.bind((name, value));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<ParkingSpotRowWithId> = result.take(0).map_err(DbError::from)?;
        let spots = rows
            .into_iter()
            .map(|row| row.try_into_spot())
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(spots)
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: SpotStatus,
        status: SpotStatus,
    ) -> ParkadeResult<ParkingSpot> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('parking_spot', $id) SET \
                 status = $status, updated_at = time::now() \
                 WHERE status = $expected",
            )
            .bind(("id", id_str.clone()))
            .bind(("status", status.as_str().to_string()))
            .bind(("expected", expected.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;
        let rows: Vec<ParkingSpotRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(row.into_spot(id)?),
            None => Err(self.lost_race(id, expected).await),
        }
    }
}
