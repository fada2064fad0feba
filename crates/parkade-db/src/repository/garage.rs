//! SurrealDB implementation of [`GarageRepository`].

use chrono::{DateTime, Utc};
use parkade_core::error::ParkadeResult;
use parkade_core::models::garage::{CreateGarage, Garage, UpdateGarage};
use parkade_core::repository::GarageRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{parse_id, single};
use crate::error::DbError;

const TABLE: &str = "garage";

#[derive(Debug, SurrealValue)]
struct GarageRow {
    name: String,
    location: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl GarageRow {
    fn into_garage(self, id: Uuid) -> Garage {
        Garage {
            id,
            name: self.name,
            location: self.location,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, SurrealValue)]
struct GarageRowWithId {
    record_id: String,
    name: String,
    location: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl GarageRowWithId {
    fn try_into_garage(self) -> Result<Garage, DbError> {
        Ok(Garage {
            id: parse_id(TABLE, "record", &self.record_id)?,
            name: self.name,
            location: self.location,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Garage repository.
#[derive(Clone)]
pub struct SurrealGarageRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealGarageRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> GarageRepository for SurrealGarageRepository<C> {
    async fn create(&self, input: CreateGarage) -> ParkadeResult<Garage> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('garage', $id) SET \
                 name = $name, location = $location",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("location", input.location))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;
        let rows: Vec<GarageRow> = result.take(0).map_err(DbError::from)?;

        Ok(single(rows, TABLE, &id_str)?.into_garage(id))
    }

    async fn get_by_id(&self, id: Uuid) -> ParkadeResult<Garage> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('garage', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GarageRow> = result.take(0).map_err(DbError::from)?;
        Ok(single(rows, TABLE, &id_str)?.into_garage(id))
    }

    async fn update(&self, id: Uuid, input: UpdateGarage) -> ParkadeResult<Garage> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.location.is_some() {
            sets.push("location = $location");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('garage', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));
        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(location) = input.location {
            builder = builder.bind(("location", location));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;
        let rows: Vec<GarageRow> = result.take(0).map_err(DbError::from)?;

        Ok(single(rows, TABLE, &id_str)?.into_garage(id))
    }

    async fn delete(&self, id: Uuid) -> ParkadeResult<()> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("DELETE type::record('garage', $id) RETURN BEFORE")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GarageRow> = result.take(0).map_err(DbError::from)?;
        single(rows, TABLE, &id_str)?;
        Ok(())
    }

    async fn list(&self) -> ParkadeResult<Vec<Garage>> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM garage ORDER BY created_at DESC")
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GarageRowWithId> = result.take(0).map_err(DbError::from)?;
        let garages = rows
            .into_iter()
            .map(|row| row.try_into_garage())
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(garages)
    }
}
