//! Parkade services: the occupancy coordinator that couples cars to
//! parking spots, and the administrative services for the layout, cars
//! and parking fees.
//!
//! Every service is generic over the `parkade-core` repository traits, so
//! this crate has no dependency on the database layer.

pub mod cars;
pub mod config;
pub mod error;
pub mod fees;
pub mod layout;
pub mod lock;
pub mod occupancy;

pub use cars::CarService;
pub use config::ServiceConfig;
pub use error::{AdminError, OccupancyError};
pub use fees::FeeService;
pub use layout::LayoutService;
pub use occupancy::{CheckOutReceipt, OccupancyService, SpotRelease};
