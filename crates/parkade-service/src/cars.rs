//! Administrative service for car records.
//!
//! Occupancy fields are not writable here; they belong to the occupancy
//! coordinator.

use parkade_core::error::ParkadeResult;
use parkade_core::models::car::{Car, CreateCar};
use parkade_core::repository::{CarRepository, ParkingFeeRepository};
use parkade_core::validation::LicensePlate;
use tracing::info;
use uuid::Uuid;

use crate::error::{AdminError, occupied_if_raced};

pub struct CarService<C: CarRepository, P: ParkingFeeRepository> {
    cars: C,
    fees: P,
}

impl<C: CarRepository, P: ParkingFeeRepository> CarService<C, P> {
    pub fn new(cars: C, fees: P) -> Self {
        Self { cars, fees }
    }

    /// Register a car that is not parked anywhere.
    pub async fn create_car(&self, license_plate: &str) -> ParkadeResult<Car> {
        let plate = LicensePlate::parse(license_plate)?;
        let car = self.cars.create(CreateCar::parked_nowhere(plate)).await?;
        info!(car_id = %car.id, license_plate = %car.license_plate, "Car registered");
        Ok(car)
    }

    pub async fn get_car(&self, id: Uuid) -> ParkadeResult<Car> {
        self.cars.get_by_id(id).await
    }

    pub async fn list_cars(&self) -> ParkadeResult<Vec<Car>> {
        self.cars.list().await
    }

    /// Correct the plate of a car that is not currently parked.
    pub async fn update_license_plate(&self, id: Uuid, license_plate: &str) -> ParkadeResult<Car> {
        let plate = LicensePlate::parse(license_plate)?;
        let car = self.cars.get_by_id(id).await?;
        if car.is_checked_in() {
            return Err(AdminError::CarCheckedIn(id).into());
        }
        self.cars
            .rename_unparked(id, plate)
            .await
            .map_err(|err| occupied_if_raced(err, AdminError::CarCheckedIn(id)))
    }

    pub async fn delete_car(&self, id: Uuid) -> ParkadeResult<()> {
        let car = self.cars.get_by_id(id).await?;
        if car.is_checked_in() {
            return Err(AdminError::CarCheckedIn(id).into());
        }
        if !self.fees.list(Some(id)).await?.is_empty() {
            return Err(AdminError::HasDependents {
                entity: "car",
                id,
                dependents: "parking fees",
            }
            .into());
        }
        self.cars
            .delete_unparked(id)
            .await
            .map_err(|err| occupied_if_raced(err, AdminError::CarCheckedIn(id)))?;
        info!(car_id = %id, "Car deleted");
        Ok(())
    }
}
