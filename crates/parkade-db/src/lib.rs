//! Parkade database layer: SurrealDB connection management, schema
//! migrations and implementations of the `parkade-core` repository traits.
//!
//! This crate provides:
//! - Migrated database handles ([`DbManager`], [`DbConfig`])
//! - Schema migrations ([`run_migrations`], [`schema_version`])
//! - Error types ([`DbError`])
//! - Repositories ([`repository`])

mod connection;
mod error;
pub mod repository;
mod schema;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use schema::{run_migrations, schema_version};
