//! SurrealDB implementation of [`FloorRepository`].

use chrono::{DateTime, Utc};
use parkade_core::error::ParkadeResult;
use parkade_core::models::floor::{CreateFloor, Floor, UpdateFloor};
use parkade_core::repository::FloorRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{parse_id, single};
use crate::error::DbError;

const TABLE: &str = "floor";

#[derive(Debug, SurrealValue)]
struct FloorRow {
    garage_id: String,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl FloorRow {
    fn into_floor(self, id: Uuid) -> Result<Floor, DbError> {
        Ok(Floor {
            id,
            garage_id: parse_id(TABLE, "garage", &self.garage_id)?,
            name: self.name,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct FloorRowWithId {
    record_id: String,
    garage_id: String,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl FloorRowWithId {
    fn try_into_floor(self) -> Result<Floor, DbError> {
        Ok(Floor {
            id: parse_id(TABLE, "record", &self.record_id)?,
            garage_id: parse_id(TABLE, "garage", &self.garage_id)?,
            name: self.name,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Floor repository.
#[derive(Clone)]
pub struct SurrealFloorRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealFloorRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> FloorRepository for SurrealFloorRepository<C> {
    async fn create(&self, input: CreateFloor) -> ParkadeResult<Floor> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('floor', $id) SET \
                 garage_id = $garage_id, name = $name",
            )
            .bind(("id", id_str.clone()))
            .bind(("garage_id", input.garage_id.to_string()))
            .bind(("name", input.name))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;
        let rows: Vec<FloorRow> = result.take(0).map_err(DbError::from)?;

        Ok(single(rows, TABLE, &id_str)?.into_floor(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> ParkadeResult<Floor> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('floor', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<FloorRow> = result.take(0).map_err(DbError::from)?;
        Ok(single(rows, TABLE, &id_str)?.into_floor(id)?)
    }

    async fn update(&self, id: Uuid, input: UpdateFloor) -> ParkadeResult<Floor> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.garage_id.is_some() {
            sets.push("garage_id = $garage_id");
        }
        if input.name.is_some() {
            sets.push("name = $name");
        }
        sets.push("updated_at = time::now()");

        let query = format!("UPDATE type::record('floor', $id) SET {}", sets.join(", "));

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));
        if let Some(garage_id) = input.garage_id {
            builder = builder.bind(("garage_id", garage_id.to_string()));
        }
        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;
        let rows: Vec<FloorRow> = result.take(0).map_err(DbError::from)?;

        Ok(single(rows, TABLE, &id_str)?.into_floor(id)?)
    }

    async fn delete(&self, id: Uuid) -> ParkadeResult<()> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("DELETE type::record('floor', $id) RETURN BEFORE")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<FloorRow> = result.take(0).map_err(DbError::from)?;
        single(rows, TABLE, &id_str)?;
        Ok(())
    }

    async fn list_by_garage(&self, garage_id: Uuid) -> ParkadeResult<Vec<Floor>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM floor \
                 WHERE garage_id = $garage_id ORDER BY created_at ASC",
            )
            .bind(("garage_id", garage_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<FloorRowWithId> = result.take(0).map_err(DbError::from)?;
        let floors = rows
            .into_iter()
            .map(|row| row.try_into_floor())
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(floors)
    }
}
