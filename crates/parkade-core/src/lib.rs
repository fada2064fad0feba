//! Parkade core: domain models, error taxonomy, validators, parking spot
//! rules, listing filters and the repository traits implemented by the
//! persistence layer.

pub mod error;
pub mod models;
pub mod query;
pub mod repository;
pub mod rules;
pub mod validation;
