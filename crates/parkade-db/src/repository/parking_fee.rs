//! SurrealDB implementation of [`ParkingFeeRepository`].

use chrono::{DateTime, Utc};
use parkade_core::error::ParkadeResult;
use parkade_core::models::parking_fee::{CreateParkingFee, ParkingFee, UpdateParkingFee};
use parkade_core::repository::ParkingFeeRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{parse_id, single};
use crate::error::DbError;

const TABLE: &str = "parking_fee";

#[derive(Debug, SurrealValue)]
struct ParkingFeeRow {
    car_id: String,
    billed_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ParkingFeeRow {
    fn into_fee(self, id: Uuid) -> Result<ParkingFee, DbError> {
        Ok(ParkingFee {
            id,
            car_id: parse_id(TABLE, "car", &self.car_id)?,
            billed_at: self.billed_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct ParkingFeeRowWithId {
    record_id: String,
    car_id: String,
    billed_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ParkingFeeRowWithId {
    fn try_into_fee(self) -> Result<ParkingFee, DbError> {
        Ok(ParkingFee {
            id: parse_id(TABLE, "record", &self.record_id)?,
            car_id: parse_id(TABLE, "car", &self.car_id)?,
            billed_at: self.billed_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the ParkingFee repository.
#[derive(Clone)]
pub struct SurrealParkingFeeRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealParkingFeeRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ParkingFeeRepository for SurrealParkingFeeRepository<C> {
    async fn create(&self, input: CreateParkingFee) -> ParkadeResult<ParkingFee> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let billed_at = input.billed_at.unwrap_or_else(Utc::now);

        let result = self
            .db
            .query(
                "CREATE type::record('parking_fee', $id) SET \
                 car_id = $car_id, billed_at = $billed_at",
            )
            .bind(("id", id_str.clone()))
            .bind(("car_id", input.car_id.to_string()))
            .bind(("billed_at", billed_at))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;
        let rows: Vec<ParkingFeeRow> = result.take(0).map_err(DbError::from)?;

        Ok(single(rows, TABLE, &id_str)?.into_fee(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> ParkadeResult<ParkingFee> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('parking_fee', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ParkingFeeRow> = result.take(0).map_err(DbError::from)?;
        Ok(single(rows, TABLE, &id_str)?.into_fee(id)?)
    }

    async fn update(&self, id: Uuid, input: UpdateParkingFee) -> ParkadeResult<ParkingFee> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.car_id.is_some() {
            sets.push("car_id = $car_id");
        }
        if input.billed_at.is_some() {
            sets.push("billed_at = $billed_at");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('parking_fee', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));
        if let Some(car_id) = input.car_id {
            builder = builder.bind(("car_id", car_id.to_string()));
        }
        if let Some(billed_at) = input.billed_at {
            builder = builder.bind(("billed_at", billed_at));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;
        let rows: Vec<ParkingFeeRow> = result.take(0).map_err(DbError::from)?;

        Ok(single(rows, TABLE, &id_str)?.into_fee(id)?)
    }

    async fn delete(&self, id: Uuid) -> ParkadeResult<()> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("DELETE type::record('parking_fee', $id) RETURN BEFORE")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ParkingFeeRow> = result.take(0).map_err(DbError::from)?;
        single(rows, TABLE, &id_str)?;
        Ok(())
    }

    async fn list(&self, car_id: Option<Uuid>) -> ParkadeResult<Vec<ParkingFee>> {
        let mut result = match car_id {
            Some(car_id) => self
                .db
                .query(
                    "SELECT meta::id(id) AS record_id, * FROM parking_fee \
                     WHERE car_id = $car_id ORDER BY billed_at DESC",
                )
                .bind(("car_id", car_id.to_string()))
                .await
                .map_err(DbError::from)?,
            None => self
                .db
                .query(
                    "SELECT meta::id(id) AS record_id, * FROM parking_fee \
                     ORDER BY billed_at DESC",
                )
                .await
                .map_err(DbError::from)?,
        };

        let rows: Vec<ParkingFeeRowWithId> = result.take(0).map_err(DbError::from)?;
        let fees = rows
            .into_iter()
            .map(|row| row.try_into_fee())
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(fees)
    }
}
