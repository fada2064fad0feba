//! SurrealDB implementation of [`BayRepository`].

use chrono::{DateTime, Utc};
use parkade_core::error::ParkadeResult;
use parkade_core::models::bay::{Bay, CreateBay, UpdateBay};
use parkade_core::repository::BayRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{parse_id, single};
use crate::error::DbError;

const TABLE: &str = "bay";

#[derive(Debug, SurrealValue)]
struct BayRow {
    floor_id: String,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BayRow {
    fn into_bay(self, id: Uuid) -> Result<Bay, DbError> {
        Ok(Bay {
            id,
            floor_id: parse_id(TABLE, "floor", &self.floor_id)?,
            name: self.name,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct BayRowWithId {
    record_id: String,
    floor_id: String,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BayRowWithId {
    fn try_into_bay(self) -> Result<Bay, DbError> {
        Ok(Bay {
            id: parse_id(TABLE, "record", &self.record_id)?,
            floor_id: parse_id(TABLE, "floor", &self.floor_id)?,
            name: self.name,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Bay repository.
#[derive(Clone)]
pub struct SurrealBayRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealBayRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> BayRepository for SurrealBayRepository<C> {
    async fn create(&self, input: CreateBay) -> ParkadeResult<Bay> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('bay', $id) SET \
                 floor_id = $floor_id, name = $name",
            )
            .bind(("id", id_str.clone()))
            .bind(("floor_id", input.floor_id.to_string()))
            .bind(("name", input.name))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;
        let rows: Vec<BayRow> = result.take(0).map_err(DbError::from)?;

        Ok(single(rows, TABLE, &id_str)?.into_bay(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> ParkadeResult<Bay> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('bay', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<BayRow> = result.take(0).map_err(DbError::from)?;
        Ok(single(rows, TABLE, &id_str)?.into_bay(id)?)
    }

    async fn update(&self, id: Uuid, input: UpdateBay) -> ParkadeResult<Bay> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.floor_id.is_some() {
            sets.push("floor_id = $floor_id");
        }
        if input.name.is_some() {
            sets.push("name = $name");
        }
        sets.push("updated_at = time::now()");

        let query = format!("UPDATE type::record('bay', $id) SET {}", sets.join(", "));

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));
        if let Some(floor_id) = input.floor_id {
            builder = builder.bind(("floor_id", floor_id.to_string()));
        }
        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;
        let rows: Vec<BayRow> = result.take(0).map_err(DbError::from)?;

        Ok(single(rows, TABLE, &id_str)?.into_bay(id)?)
    }

    async fn delete(&self, id: Uuid) -> ParkadeResult<()> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("DELETE type::record('bay', $id) RETURN BEFORE")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<BayRow> = result.take(0).map_err(DbError::from)?;
        single(rows, TABLE, &id_str)?;
        Ok(())
    }

    async fn list_by_floor(&self, floor_id: Uuid) -> ParkadeResult<Vec<Bay>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM bay \
                 WHERE floor_id = $floor_id ORDER BY created_at ASC",
            )
            .bind(("floor_id", floor_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<BayRowWithId> = result.take(0).map_err(DbError::from)?;
        let bays = rows
            .into_iter()
            .map(|row| row.try_into_bay())
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(bays)
    }
}
