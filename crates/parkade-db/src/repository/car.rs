//! SurrealDB implementation of [`CarRepository`].
//!
//! Check-in and check-out are conditional updates: each carries the
//! occupancy state it expects to find and fails with a
//! `CONCURRENT_MODIFICATION` conflict when the stored row disagrees.

use chrono::{DateTime, Utc};
use parkade_core::error::{ParkadeError, ParkadeResult};
use parkade_core::models::car::{Car, CreateCar, UpdateCar};
use parkade_core::repository::{CONCURRENT_MODIFICATION, CarRepository};
use parkade_core::validation::LicensePlate;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use super::{parse_id, parse_opt_id, single};
use crate::error::DbError;

const TABLE: &str = "car";

/// Matches rows that are not currently checked in.
const UNPARKED: &str = "checked_in_at = NONE OR checked_out_at != NONE OR parking_spot_id = NONE";

#[derive(Debug, SurrealValue)]
struct CarRow {
    license_plate: String,
    parking_spot_id: Option<String>,
    checked_in_at: Option<DateTime<Utc>>,
    checked_out_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CarRow {
    fn into_car(self, id: Uuid) -> Result<Car, DbError> {
        Ok(Car {
            id,
            license_plate: self.license_plate,
            parking_spot_id: parse_opt_id(TABLE, "parking spot", self.parking_spot_id.as_deref())?,
            checked_in_at: self.checked_in_at,
            checked_out_at: self.checked_out_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct CarRowWithId {
    record_id: String,
    license_plate: String,
    parking_spot_id: Option<String>,
    checked_in_at: Option<DateTime<Utc>>,
    checked_out_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CarRowWithId {
    fn try_into_car(self) -> Result<Car, DbError> {
        Ok(Car {
            id: parse_id(TABLE, "record", &self.record_id)?,
            license_plate: self.license_plate,
            parking_spot_id: parse_opt_id(TABLE, "parking spot", self.parking_spot_id.as_deref())?,
            checked_in_at: self.checked_in_at,
            checked_out_at: self.checked_out_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Car repository.
#[derive(Clone)]
pub struct SurrealCarRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealCarRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    fn decode_all(rows: Vec<CarRowWithId>) -> ParkadeResult<Vec<Car>> {
        let cars = rows
            .into_iter()
            .map(|row| row.try_into_car())
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(cars)
    }

    /// Run a conditional single-record update and turn "no row matched"
    /// into `NotFound` or a concurrent-modification conflict.
    async fn conditional_update(
        &self,
        query: &str,
        id: Uuid,
        spot_id: Uuid,
        at: DateTime<Utc>,
        operation: &str,
    ) -> ParkadeResult<Car> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(query)
            .bind(("id", id_str.clone()))
            .bind(("spot_id", spot_id.to_string()))
            .bind(("at", at))
            .await
            .map_err(DbError::from)?;
        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;
        let rows: Vec<CarRow> = result.take(0).map_err(DbError::from)?;
        if let Some(row) = rows.into_iter().next() {
            return Ok(row.into_car(id)?);
        }

        Err(self.lost_race(id, operation).await)
    }

    /// Error for a guarded write that matched nothing: `NotFound` for a
    /// missing car, a concurrent-modification conflict otherwise.
    async fn lost_race(&self, id: Uuid, operation: &str) -> ParkadeError {
        let current = match self.get_by_id(id).await {
            Ok(car) => car,
            Err(err) => return err,
        };
        debug!(
            car_id = %id,
            operation,
            parking_spot_id = ?current.parking_spot_id,
            checked_out_at = ?current.checked_out_at,
            "Car occupancy compare-and-swap lost"
        );
        ParkadeError::conflict(
            CONCURRENT_MODIFICATION,
            format!("car occupancy changed concurrently during {operation}"),
        )
    }
}

impl<C: Connection> CarRepository for SurrealCarRepository<C> {
    async fn create(&self, input: CreateCar) -> ParkadeResult<Car> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('car', $id) SET \
                 license_plate = $license_plate, \
                 parking_spot_id = $parking_spot_id, \
                 checked_in_at = $checked_in_at, \
                 checked_out_at = NONE",
            )
            .bind(("id", id_str.clone()))
            .bind(("license_plate", String::from(input.license_plate)))
            .bind((
                "parking_spot_id",
                input.parking_spot_id.map(|s| s.to_string()),
            ))
            .bind(("checked_in_at", input.checked_in_at))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;
        let rows: Vec<CarRow> = result.take(0).map_err(DbError::from)?;

        Ok(single(rows, TABLE, &id_str)?.into_car(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> ParkadeResult<Car> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('car', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CarRow> = result.take(0).map_err(DbError::from)?;
        Ok(single(rows, TABLE, &id_str)?.into_car(id)?)
    }

    async fn find_by_license_plate(&self, plate: &LicensePlate) -> ParkadeResult<Option<Car>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM car \
                 WHERE license_plate = $license_plate \
                 ORDER BY updated_at DESC",
            )
            .bind(("license_plate", plate.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CarRowWithId> = result.take(0).map_err(DbError::from)?;
        let cars = Self::decode_all(rows)?;

        let checked_in = cars.iter().position(Car::is_checked_in);
        Ok(match checked_in {
            Some(idx) => cars.into_iter().nth(idx),
            None => cars.into_iter().next(),
        })
    }

    async fn update(&self, id: Uuid, input: UpdateCar) -> ParkadeResult<Car> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.license_plate.is_some() {
            sets.push("license_plate = $license_plate");
        }
        if input.parking_spot_id.is_some() {
            sets.push("parking_spot_id = $parking_spot_id");
        }
        if input.checked_in_at.is_some() {
            sets.push("checked_in_at = $checked_in_at");
        }
        if input.checked_out_at.is_some() {
            sets.push("checked_out_at = $checked_out_at");
        }
        sets.push("updated_at = time::now()");

        let query = format!("UPDATE type::record('car', $id) SET {}", sets.join(", "));

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));
        if let Some(plate) = input.license_plate {
            builder = builder.bind(("license_plate", String::from(plate)));
        }
        if let Some(spot_id) = input.parking_spot_id {
            builder = builder.bind(("parking_spot_id", spot_id.map(|s| s.to_string())));
        }
        if let Some(checked_in_at) = input.checked_in_at {
            builder = builder.bind(("checked_in_at", checked_in_at));
        }
        if let Some(checked_out_at) = input.checked_out_at {
            builder = builder.bind(("checked_out_at", checked_out_at));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;
        let rows: Vec<CarRow> = result.take(0).map_err(DbError::from)?;

        Ok(single(rows, TABLE, &id_str)?.into_car(id)?)
    }

    async fn delete(&self, id: Uuid) -> ParkadeResult<()> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("DELETE type::record('car', $id) RETURN BEFORE")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CarRow> = result.take(0).map_err(DbError::from)?;
        single(rows, TABLE, &id_str)?;
        Ok(())
    }

    async fn list(&self) -> ParkadeResult<Vec<Car>> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM car ORDER BY created_at DESC")
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CarRowWithId> = result.take(0).map_err(DbError::from)?;
        Self::decode_all(rows)
    }

    async fn rename_unparked(&self, id: Uuid, plate: LicensePlate) -> ParkadeResult<Car> {
        let query = format!(
            "UPDATE type::record('car', $id) SET \
             license_plate = $license_plate, updated_at = time::now() \
             WHERE {UNPARKED}"
        );

        let result = self
            .db
            .query(&query)
            .bind(("id", id.to_string()))
            .bind(("license_plate", String::from(plate)))
            .await
            .map_err(DbError::from)?;
        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;
        let rows: Vec<CarRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(row.into_car(id)?),
            None => Err(self.lost_race(id, "plate change").await),
        }
    }

    async fn delete_unparked(&self, id: Uuid) -> ParkadeResult<()> {
        let query = format!("DELETE type::record('car', $id) WHERE {UNPARKED} RETURN BEFORE");

        let result = self
            .db
            .query(&query)
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;
        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;
        let rows: Vec<CarRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(self.lost_race(id, "delete").await);
        }
        Ok(())
    }

    async fn record_check_in(
        &self,
        id: Uuid,
        spot_id: Uuid,
        at: DateTime<Utc>,
    ) -> ParkadeResult<Car> {
        let query = format!(
            "UPDATE type::record('car', $id) SET \
             parking_spot_id = $spot_id, checked_in_at = $at, \
             checked_out_at = NONE, updated_at = time::now() \
             WHERE {UNPARKED}"
        );
        self.conditional_update(
            &query,
            id,
            spot_id,
            at,
            "check-in",
        )
        .await
    }

    async fn record_check_out(
        &self,
        id: Uuid,
        spot_id: Uuid,
        at: DateTime<Utc>,
    ) -> ParkadeResult<Car> {
        self.conditional_update(
            "UPDATE type::record('car', $id) SET \
             parking_spot_id = NONE, checked_out_at = $at, \
             updated_at = time::now() \
             WHERE parking_spot_id = $spot_id AND checked_out_at = NONE",
            id,
            spot_id,
            at,
            "check-out",
        )
        .await
    }
}
