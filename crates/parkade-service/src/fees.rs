//! Administrative service for parking fees.

use parkade_core::error::{ParkadeError, ParkadeResult};
use parkade_core::models::parking_fee::{CreateParkingFee, ParkingFee, UpdateParkingFee};
use parkade_core::repository::{CarRepository, ParkingFeeRepository};
use parkade_core::validation;
use uuid::Uuid;

pub struct FeeService<P: ParkingFeeRepository, C: CarRepository> {
    fees: P,
    cars: C,
}

impl<P: ParkingFeeRepository, C: CarRepository> FeeService<P, C> {
    pub fn new(fees: P, cars: C) -> Self {
        Self { fees, cars }
    }

    /// Bill a car. `billed_at` defaults to now.
    pub async fn create_fee(&self, input: CreateParkingFee) -> ParkadeResult<ParkingFee> {
        validation::validate_parking_fee(input.car_id)?;
        self.require_car(input.car_id).await?;
        self.fees.create(input).await
    }

    pub async fn get_fee(&self, id: Uuid) -> ParkadeResult<ParkingFee> {
        self.fees.get_by_id(id).await
    }

    /// All fees, or those of one car, newest first.
    pub async fn list_fees(&self, car_id: Option<Uuid>) -> ParkadeResult<Vec<ParkingFee>> {
        self.fees.list(car_id).await
    }

    pub async fn update_fee(&self, id: Uuid, input: UpdateParkingFee) -> ParkadeResult<ParkingFee> {
        self.fees.get_by_id(id).await?;
        if let Some(car_id) = input.car_id {
            validation::validate_parking_fee(car_id)?;
            self.require_car(car_id).await?;
        }
        self.fees.update(id, input).await
    }

    pub async fn delete_fee(&self, id: Uuid) -> ParkadeResult<()> {
        self.fees.delete(id).await
    }

    async fn require_car(&self, car_id: Uuid) -> ParkadeResult<()> {
        match self.cars.get_by_id(car_id).await {
            Ok(_) => Ok(()),
            Err(ParkadeError::NotFound { .. }) => Err(ParkadeError::validation(
                "car_id",
                format!("Car {car_id} does not exist"),
            )),
            Err(e) => Err(e),
        }
    }
}
