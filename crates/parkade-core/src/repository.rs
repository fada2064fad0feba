//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Implementations must return
//! [`ParkadeError::NotFound`](crate::error::ParkadeError::NotFound) for
//! ids that do not exist, and conditional writes must report a lost race
//! as a `CONCURRENT_MODIFICATION` conflict rather than silently applying.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::ParkadeResult;
use crate::models::{
    bay::{Bay, CreateBay, UpdateBay},
    car::{Car, CreateCar, UpdateCar},
    floor::{CreateFloor, Floor, UpdateFloor},
    garage::{CreateGarage, Garage, UpdateGarage},
    parking_fee::{CreateParkingFee, ParkingFee, UpdateParkingFee},
    parking_spot::{CreateParkingSpot, ParkingSpot, SpotStatus, UpdateParkingSpot},
};
use crate::query::SpotFilter;
use crate::validation::LicensePlate;

/// Conflict code reported when a conditional write finds unexpected state.
pub const CONCURRENT_MODIFICATION: &str = "CONCURRENT_MODIFICATION";

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

pub trait GarageRepository: Send + Sync {
    fn create(&self, input: CreateGarage) -> impl Future<Output = ParkadeResult<Garage>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = ParkadeResult<Garage>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateGarage,
    ) -> impl Future<Output = ParkadeResult<Garage>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = ParkadeResult<()>> + Send;
    fn list(&self) -> impl Future<Output = ParkadeResult<Vec<Garage>>> + Send;
}

pub trait FloorRepository: Send + Sync {
    fn create(&self, input: CreateFloor) -> impl Future<Output = ParkadeResult<Floor>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = ParkadeResult<Floor>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateFloor,
    ) -> impl Future<Output = ParkadeResult<Floor>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = ParkadeResult<()>> + Send;
    fn list_by_garage(
        &self,
        garage_id: Uuid,
    ) -> impl Future<Output = ParkadeResult<Vec<Floor>>> + Send;
}

pub trait BayRepository: Send + Sync {
    fn create(&self, input: CreateBay) -> impl Future<Output = ParkadeResult<Bay>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = ParkadeResult<Bay>> + Send;
    fn update(&self, id: Uuid, input: UpdateBay) -> impl Future<Output = ParkadeResult<Bay>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = ParkadeResult<()>> + Send;
    fn list_by_floor(&self, floor_id: Uuid)
    -> impl Future<Output = ParkadeResult<Vec<Bay>>> + Send;
}

// ---------------------------------------------------------------------------
// Occupancy
// ---------------------------------------------------------------------------

pub trait ParkingSpotRepository: Send + Sync {
    fn create(
        &self,
        input: CreateParkingSpot,
    ) -> impl Future<Output = ParkadeResult<ParkingSpot>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = ParkadeResult<ParkingSpot>> + Send;
    /// Updates descriptive fields only. Status is never touched here.
    fn update(
        &self,
        id: Uuid,
        input: UpdateParkingSpot,
    ) -> impl Future<Output = ParkadeResult<ParkingSpot>> + Send;
    /// Delete the spot only while it is `available`.
    ///
    /// Fails with `NotFound` when the spot does not exist and with a
    /// `CONCURRENT_MODIFICATION` conflict when it is occupied at the time
    /// of the write.
    fn delete_available(&self, id: Uuid) -> impl Future<Output = ParkadeResult<()>> + Send;
    fn list(
        &self,
        filter: &SpotFilter,
    ) -> impl Future<Output = ParkadeResult<Vec<ParkingSpot>>> + Send;
    /// Set `status` only if the stored status is still `expected`.
    ///
    /// Fails with `NotFound` when the spot does not exist and with a
    /// `CONCURRENT_MODIFICATION` conflict when the stored status differs.
    fn update_status(
        &self,
        id: Uuid,
        expected: SpotStatus,
        status: SpotStatus,
    ) -> impl Future<Output = ParkadeResult<ParkingSpot>> + Send;
}

pub trait CarRepository: Send + Sync {
    fn create(&self, input: CreateCar) -> impl Future<Output = ParkadeResult<Car>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = ParkadeResult<Car>> + Send;
    /// Exact match on the normalized plate. When several rows share the
    /// plate the checked-in one wins, otherwise the most recently updated.
    fn find_by_license_plate(
        &self,
        plate: &LicensePlate,
    ) -> impl Future<Output = ParkadeResult<Option<Car>>> + Send;
    fn update(&self, id: Uuid, input: UpdateCar) -> impl Future<Output = ParkadeResult<Car>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = ParkadeResult<()>> + Send;
    fn list(&self) -> impl Future<Output = ParkadeResult<Vec<Car>>> + Send;
    /// Change the plate only while the car is not checked in.
    ///
    /// A car that is checked in at the time of the write yields a
    /// `CONCURRENT_MODIFICATION` conflict.
    fn rename_unparked(
        &self,
        id: Uuid,
        plate: LicensePlate,
    ) -> impl Future<Output = ParkadeResult<Car>> + Send;
    /// Delete the car only while it is not checked in; same failures as
    /// [`rename_unparked`](Self::rename_unparked).
    fn delete_unparked(&self, id: Uuid) -> impl Future<Output = ParkadeResult<()>> + Send;
    /// Park the car in `spot_id`, clearing any previous check-out time.
    ///
    /// Applies only if the car is not currently checked in.
    fn record_check_in(
        &self,
        id: Uuid,
        spot_id: Uuid,
        at: DateTime<Utc>,
    ) -> impl Future<Output = ParkadeResult<Car>> + Send;
    /// Release the car from `spot_id`, stamping `checked_out_at = at`.
    ///
    /// Applies only if the car is still parked in `spot_id` and has not
    /// been checked out.
    fn record_check_out(
        &self,
        id: Uuid,
        spot_id: Uuid,
        at: DateTime<Utc>,
    ) -> impl Future<Output = ParkadeResult<Car>> + Send;
}

// ---------------------------------------------------------------------------
// Billing
// ---------------------------------------------------------------------------

pub trait ParkingFeeRepository: Send + Sync {
    fn create(
        &self,
        input: CreateParkingFee,
    ) -> impl Future<Output = ParkadeResult<ParkingFee>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = ParkadeResult<ParkingFee>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateParkingFee,
    ) -> impl Future<Output = ParkadeResult<ParkingFee>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = ParkadeResult<()>> + Send;
    /// All fees, or only those of `car_id`, newest `billed_at` first.
    fn list(
        &self,
        car_id: Option<Uuid>,
    ) -> impl Future<Output = ParkadeResult<Vec<ParkingFee>>> + Send;
}
