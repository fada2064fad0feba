//! SurrealDB repository implementations.

mod bay;
mod car;
mod floor;
mod garage;
mod parking_fee;
mod parking_spot;

pub use bay::SurrealBayRepository;
pub use car::SurrealCarRepository;
pub use floor::SurrealFloorRepository;
pub use garage::SurrealGarageRepository;
pub use parking_fee::SurrealParkingFeeRepository;
pub use parking_spot::SurrealParkingSpotRepository;

use uuid::Uuid;

use crate::error::DbError;

pub(crate) fn parse_id(entity: &'static str, field: &str, raw: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(raw).map_err(|e| DbError::decode(entity, format!("invalid {field} UUID: {e}")))
}

pub(crate) fn parse_opt_id(
    entity: &'static str,
    field: &str,
    raw: Option<&str>,
) -> Result<Option<Uuid>, DbError> {
    raw.map(|r| parse_id(entity, field, r)).transpose()
}

/// First row of a single-record statement, or `NotFound`.
pub(crate) fn single<T>(rows: Vec<T>, entity: &str, id: &str) -> Result<T, DbError> {
    rows.into_iter()
        .next()
        .ok_or_else(|| DbError::not_found(entity, id))
}
