//! Occupancy coordinator: check-in, check-out and manual status marks.
//!
//! The coordinator owns the only code paths that change a spot's status
//! or a car's occupancy fields. Every operation takes the in-process locks
//! for the spot and then for the plate, and every write is a conditional
//! one at the repository boundary. When the second of the two writes
//! fails, the first one is compensated before the error is returned.

use chrono::{DateTime, Utc};
use parkade_core::error::{ParkadeError, ParkadeResult};
use parkade_core::models::car::{Car, CreateCar, UpdateCar};
use parkade_core::models::parking_spot::{ParkingSpot, SpotStatus};
use parkade_core::query::{self, OccupancyViolation, SpotFilter};
use parkade_core::repository::{CONCURRENT_MODIFICATION, CarRepository, ParkingSpotRepository};
use parkade_core::rules;
use parkade_core::validation::LicensePlate;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::error::OccupancyError;
use crate::lock::{KeyedLocks, plate_key, spot_key};

/// How to undo the car write of a check-in.
enum CheckInUndo {
    /// The car row was created by this check-in.
    Delete,
    /// The car row existed; put its previous occupancy back.
    Restore(Car),
}

/// What happened to the spot when a car checked out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpotRelease {
    /// The spot moved from occupied to available.
    Released,
    /// The spot was already available, e.g. after a manual mark.
    AlreadyAvailable,
    /// The spot no longer exists.
    Missing,
}

/// Result of a check-out: the released car and the fate of its spot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutReceipt {
    pub car: Car,
    pub spot_id: Uuid,
    pub spot: SpotRelease,
}

/// Occupancy coordinator.
///
/// Generic over repository implementations so that the service layer has
/// no dependency on the database crate.
pub struct OccupancyService<S: ParkingSpotRepository, C: CarRepository> {
    spots: S,
    cars: C,
    config: ServiceConfig,
    locks: KeyedLocks,
}

impl<S: ParkingSpotRepository, C: CarRepository> OccupancyService<S, C> {
    pub fn new(spots: S, cars: C, config: ServiceConfig) -> Self {
        Self {
            spots,
            cars,
            config,
            locks: KeyedLocks::new(),
        }
    }

    /// Park the car with `license_plate` in `parking_spot_id`.
    ///
    /// Reuses the car row of a returning plate; creates one otherwise.
    pub async fn check_in(&self, license_plate: &str, parking_spot_id: Uuid) -> ParkadeResult<Car> {
        let plate = LicensePlate::parse(license_plate)?;

        let _spot_guard = self.locks.lock(spot_key(parking_spot_id)).await;
        let _plate_guard = self.locks.lock(plate_key(&plate)).await;

        let spot = self.spots.get_by_id(parking_spot_id).await?;
        if spot.is_occupied() {
            return Err(OccupancyError::AlreadyOccupied.into());
        }
        rules::validate_status_transition(spot.status, SpotStatus::Occupied)?;

        let existing = self.cars.find_by_license_plate(&plate).await?;
        if let Some(Car {
            license_plate,
            parking_spot_id: Some(spot_id),
            checked_in_at: Some(_),
            checked_out_at: None,
            ..
        }) = existing.as_ref()
        {
            return Err(OccupancyError::AlreadyCheckedIn {
                plate: license_plate.clone(),
                spot_id: *spot_id,
            }
            .into());
        }

        let now = Utc::now();
        let (car, undo) = match existing {
            Some(previous) => {
                let car = self.cars.record_check_in(previous.id, spot.id, now).await?;
                (car, CheckInUndo::Restore(previous))
            }
            None => {
                let car = self
                    .cars
                    .create(CreateCar {
                        license_plate: plate.clone(),
                        parking_spot_id: Some(spot.id),
                        checked_in_at: Some(now),
                    })
                    .await?;
                (car, CheckInUndo::Delete)
            }
        };

        if let Err(err) = self
            .spots
            .update_status(spot.id, SpotStatus::Available, SpotStatus::Occupied)
            .await
        {
            warn!(
                car_id = %car.id,
                spot_id = %spot.id,
                error = %err,
                "Spot update failed during check-in, reverting car"
            );
            self.undo_check_in(&car, undo).await;
            return Err(err);
        }

        info!(
            car_id = %car.id,
            spot_id = %spot.id,
            license_plate = %plate,
            "Car checked in"
        );
        Ok(car)
    }

    /// Release a checked-in car from its spot.
    ///
    /// See [`check_out_with_receipt`](Self::check_out_with_receipt) for
    /// the spot outcome.
    pub async fn check_out(&self, car_id: Uuid) -> ParkadeResult<Car> {
        Ok(self.check_out_with_receipt(car_id).await?.car)
    }

    /// Release a checked-in car and report what happened to its spot.
    ///
    /// A spot that is gone or already available does not undo the car
    /// release; the receipt says so instead.
    pub async fn check_out_with_receipt(&self, car_id: Uuid) -> ParkadeResult<CheckOutReceipt> {
        let car = self.cars.get_by_id(car_id).await?;
        let spot_id = occupied_spot(&car)?;
        let plate = LicensePlate::parse(&car.license_plate)?;

        let _spot_guard = self.locks.lock(spot_key(spot_id)).await;
        let _plate_guard = self.locks.lock(plate_key(&plate)).await;

        // Re-read under the locks; the first read only chose which to take.
        let car = self.cars.get_by_id(car_id).await?;
        if occupied_spot(&car)? != spot_id {
            return Err(OccupancyError::ConcurrentModification(format!(
                "car {car_id} moved while waiting to check out"
            ))
            .into());
        }
        rules::validate_status_transition(SpotStatus::Occupied, SpotStatus::Available)?;

        let at = check_out_time(car.checked_in_at, Utc::now());
        let released = self.cars.record_check_out(car.id, spot_id, at).await?;

        let spot = match self
            .spots
            .update_status(spot_id, SpotStatus::Occupied, SpotStatus::Available)
            .await
        {
            Ok(_) => SpotRelease::Released,
            Err(err) => match self.spot_already_released(car.id, spot_id, &err).await {
                Some(release) => release,
                None => {
                    warn!(
                        car_id = %car.id,
                        spot_id = %spot_id,
                        error = %err,
                        "Spot update failed during check-out, reverting car"
                    );
                    if let Err(undo_err) = self
                        .cars
                        .update(car.id, UpdateCar::restore_occupancy(&car))
                        .await
                    {
                        error!(
                            car_id = %car.id,
                            error = %undo_err,
                            "Failed to revert car after check-out failure"
                        );
                    }
                    return Err(err);
                }
            },
        };

        info!(
            car_id = %released.id,
            spot_id = %spot_id,
            license_plate = %released.license_plate,
            spot = ?spot,
            "Car checked out"
        );
        Ok(CheckOutReceipt {
            car: released,
            spot_id,
            spot,
        })
    }

    /// Look up a car by plate. The checked-in row wins over history rows.
    pub async fn find_by_license_plate(&self, license_plate: &str) -> ParkadeResult<Option<Car>> {
        let plate = LicensePlate::parse(license_plate)?;
        self.cars.find_by_license_plate(&plate).await
    }

    /// Manually mark an available spot as occupied.
    pub async fn mark_occupied(&self, spot_id: Uuid) -> ParkadeResult<ParkingSpot> {
        self.mark(spot_id, SpotStatus::Occupied).await
    }

    /// Manually mark an occupied spot as available.
    pub async fn mark_available(&self, spot_id: Uuid) -> ParkadeResult<ParkingSpot> {
        self.mark(spot_id, SpotStatus::Available).await
    }

    async fn mark(&self, spot_id: Uuid, target: SpotStatus) -> ParkadeResult<ParkingSpot> {
        let _spot_guard = self.locks.lock(spot_key(spot_id)).await;

        let spot = self.spots.get_by_id(spot_id).await?;
        if spot.status == target {
            return Err(match target {
                SpotStatus::Occupied => OccupancyError::AlreadyOccupied,
                SpotStatus::Available => OccupancyError::AlreadyAvailable,
            }
            .into());
        }
        rules::validate_status_transition(spot.status, target)?;

        let updated = self.spots.update_status(spot_id, spot.status, target).await?;
        info!(spot_id = %spot_id, status = %target, "Parking spot status set");
        Ok(updated)
    }

    pub async fn checked_in_cars(&self) -> ParkadeResult<Vec<Car>> {
        let cars = self.cars.list().await?;
        Ok(query::select_checked_in(&cars))
    }

    /// The most recent check-outs, newest first.
    pub async fn recent_checkouts(&self) -> ParkadeResult<Vec<Car>> {
        let cars = self.cars.list().await?;
        Ok(query::select_recent_checkouts(
            &cars,
            self.config.recent_checkout_limit,
        ))
    }

    pub async fn available_spots(&self, filter: SpotFilter) -> ParkadeResult<Vec<ParkingSpot>> {
        self.spots
            .list(&filter.with_status(SpotStatus::Available))
            .await
    }

    pub async fn occupied_spots(&self, filter: SpotFilter) -> ParkadeResult<Vec<ParkingSpot>> {
        self.spots
            .list(&filter.with_status(SpotStatus::Occupied))
            .await
    }

    /// Every disagreement between spot status and car occupancy.
    pub async fn occupancy_report(&self) -> ParkadeResult<Vec<OccupancyViolation>> {
        let spots = self.spots.list(&SpotFilter::default()).await?;
        let cars = self.cars.list().await?;
        let violations = query::find_occupancy_violations(&spots, &cars);
        if !violations.is_empty() {
            warn!(count = violations.len(), "Occupancy invariant violated");
        }
        Ok(violations)
    }

    /// Whether a failed occupied -> available write at check-out only
    /// means the spot is gone or already free, so the car release stands.
    async fn spot_already_released(
        &self,
        car_id: Uuid,
        spot_id: Uuid,
        err: &ParkadeError,
    ) -> Option<SpotRelease> {
        if matches!(err, ParkadeError::NotFound { .. }) {
            warn!(
                car_id = %car_id,
                spot_id = %spot_id,
                "Checked out of a parking spot that no longer exists"
            );
            return Some(SpotRelease::Missing);
        }
        if !err.is_conflict(CONCURRENT_MODIFICATION) {
            return None;
        }
        match self.spots.get_by_id(spot_id).await {
            Ok(spot) if spot.is_available() => {
                warn!(
                    car_id = %car_id,
                    spot_id = %spot_id,
                    "Parking spot was already available at check-out"
                );
                Some(SpotRelease::AlreadyAvailable)
            }
            _ => None,
        }
    }

    async fn undo_check_in(&self, car: &Car, undo: CheckInUndo) {
        let result = match undo {
            CheckInUndo::Delete => self.cars.delete(car.id).await,
            CheckInUndo::Restore(previous) => self
                .cars
                .update(car.id, UpdateCar::restore_occupancy(&previous))
                .await
                .map(|_| ()),
        };
        if let Err(err) = result {
            error!(
                car_id = %car.id,
                error = %err,
                "Failed to revert car after check-in failure"
            );
        }
    }
}

/// The spot a car is parked in, or why it is not parked.
fn occupied_spot(car: &Car) -> Result<Uuid, OccupancyError> {
    let spot_id = car.parking_spot_id.ok_or(OccupancyError::NotCheckedIn)?;
    if car.checked_out_at.is_some() {
        return Err(OccupancyError::AlreadyCheckedOut);
    }
    Ok(spot_id)
}

/// Check-out never precedes check-in, even under clock skew.
fn check_out_time(checked_in_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    checked_in_at.map_or(now, |t| t.max(now))
}
