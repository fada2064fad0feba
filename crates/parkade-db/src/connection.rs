//! Database handles for the garage store.
//!
//! A [`DbManager`] is only handed out once the schema is current, so every
//! repository built from it can rely on the tables and their ASSERTs.

use surrealdb::engine::local::{Db, Mem};
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use surrealdb::{Connection, Surreal};
use tracing::info;

use crate::error::DbError;
use crate::repository::{
    SurrealBayRepository, SurrealCarRepository, SurrealFloorRepository, SurrealGarageRepository,
    SurrealParkingFeeRepository, SurrealParkingSpotRepository,
};
use crate::schema::{run_migrations, schema_version};

/// Where the garage store lives and how to sign in to it.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// WebSocket address, e.g. `127.0.0.1:8000`.
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "127.0.0.1:8000".into(),
            namespace: "parkade".into(),
            database: "main".into(),
            username: "root".into(),
            password: "root".into(),
        }
    }
}

/// A migrated SurrealDB handle plus constructors for the repositories.
///
/// `DbManager` (remote, the default) is what the server runs on;
/// `DbManager<Db>` is an in-memory store for tests and local experiments.
pub struct DbManager<C: Connection = Client> {
    db: Surreal<C>,
}

impl DbManager<Client> {
    /// Connect over WebSocket as root, select the configured namespace and
    /// database, then apply pending migrations.
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        info!(
            url = %config.url,
            namespace = %config.namespace,
            database = %config.database,
            "Connecting to garage store"
        );

        let db = Surreal::new::<Ws>(&config.url).await?;
        db.signin(Root {
            username: config.username.clone(),
            password: config.password.clone(),
        })
        .await?;
        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await?;

        Self::migrated(db).await
    }
}

impl DbManager<Db> {
    /// A fresh, empty in-memory store with the current schema.
    pub async fn in_memory() -> Result<Self, DbError> {
        let db = Surreal::new::<Mem>(()).await?;
        db.use_ns("parkade").use_db("scratch").await?;
        Self::migrated(db).await
    }
}

impl<C: Connection> DbManager<C> {
    async fn migrated(db: Surreal<C>) -> Result<Self, DbError> {
        let applied = run_migrations(&db).await?;
        let version = schema_version(&db).await?;
        info!(version, applied = applied.len(), "Garage store ready");
        Ok(Self { db })
    }

    pub fn client(&self) -> &Surreal<C> {
        &self.db
    }

    pub fn garages(&self) -> SurrealGarageRepository<C> {
        SurrealGarageRepository::new(self.db.clone())
    }

    pub fn floors(&self) -> SurrealFloorRepository<C> {
        SurrealFloorRepository::new(self.db.clone())
    }

    pub fn bays(&self) -> SurrealBayRepository<C> {
        SurrealBayRepository::new(self.db.clone())
    }

    pub fn spots(&self) -> SurrealParkingSpotRepository<C> {
        SurrealParkingSpotRepository::new(self.db.clone())
    }

    pub fn cars(&self) -> SurrealCarRepository<C> {
        SurrealCarRepository::new(self.db.clone())
    }

    pub fn fees(&self) -> SurrealParkingFeeRepository<C> {
        SurrealParkingFeeRepository::new(self.db.clone())
    }
}
