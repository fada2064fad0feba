//! Domain models for parkade.
//!
//! Layout entities (garage, floor, bay, parking spot) form a strict
//! ownership tree. Cars and parking fees hang off that tree through
//! optional references.

pub mod bay;
pub mod car;
pub mod floor;
pub mod garage;
pub mod parking_fee;
pub mod parking_spot;
