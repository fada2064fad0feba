//! Administrative writes racing a check-in, using in-memory SurrealDB.
//!
//! The admin side reads through a repository that stalls after each read,
//! so a check-in always lands between the admin's check and its write.

use std::time::Duration;

use chrono::{DateTime, Utc};
use parkade_core::error::ParkadeResult;
use parkade_core::models::car::{Car, CreateCar, UpdateCar};
use parkade_core::models::parking_spot::{
    CreateParkingSpot, ParkingSpot, SpotSize, SpotStatus, UpdateParkingSpot,
};
use parkade_core::query::SpotFilter;
use parkade_core::repository::{CarRepository, ParkingSpotRepository};
use parkade_core::validation::LicensePlate;
use parkade_db::DbManager;
use parkade_db::repository::{
    SurrealCarRepository, SurrealParkingFeeRepository, SurrealParkingSpotRepository,
};
use parkade_service::cars::CarService;
use parkade_service::config::ServiceConfig;
use parkade_service::layout::LayoutService;
use parkade_service::occupancy::OccupancyService;
use rust_decimal::Decimal;
use surrealdb::engine::local::Db;
use tokio::time::sleep;
use uuid::Uuid;

const STALL: Duration = Duration::from_millis(300);
const HEAD_START: Duration = Duration::from_millis(50);

/// Returns what it read, but only after [`STALL`].
struct StaleReads<R>(R);

impl ParkingSpotRepository for StaleReads<SurrealParkingSpotRepository<Db>> {
    async fn create(&self, input: CreateParkingSpot) -> ParkadeResult<ParkingSpot> {
        self.0.create(input).await
    }

    async fn get_by_id(&self, id: Uuid) -> ParkadeResult<ParkingSpot> {
        let spot = self.0.get_by_id(id).await;
        sleep(STALL).await;
        spot
    }

    async fn update(&self, id: Uuid, input: UpdateParkingSpot) -> ParkadeResult<ParkingSpot> {
        self.0.update(id, input).await
    }

    async fn delete_available(&self, id: Uuid) -> ParkadeResult<()> {
        self.0.delete_available(id).await
    }

    async fn list(&self, filter: &SpotFilter) -> ParkadeResult<Vec<ParkingSpot>> {
        self.0.list(filter).await
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: SpotStatus,
        status: SpotStatus,
    ) -> ParkadeResult<ParkingSpot> {
        self.0.update_status(id, expected, status).await
    }
}

impl CarRepository for StaleReads<SurrealCarRepository<Db>> {
    async fn create(&self, input: CreateCar) -> ParkadeResult<Car> {
        self.0.create(input).await
    }

    async fn get_by_id(&self, id: Uuid) -> ParkadeResult<Car> {
        let car = self.0.get_by_id(id).await;
        sleep(STALL).await;
        car
    }

    async fn find_by_license_plate(&self, plate: &LicensePlate) -> ParkadeResult<Option<Car>> {
        self.0.find_by_license_plate(plate).await
    }

    async fn update(&self, id: Uuid, input: UpdateCar) -> ParkadeResult<Car> {
        self.0.update(id, input).await
    }

    async fn delete(&self, id: Uuid) -> ParkadeResult<()> {
        self.0.delete(id).await
    }

    async fn list(&self) -> ParkadeResult<Vec<Car>> {
        self.0.list().await
    }

    async fn rename_unparked(&self, id: Uuid, plate: LicensePlate) -> ParkadeResult<Car> {
        self.0.rename_unparked(id, plate).await
    }

    async fn delete_unparked(&self, id: Uuid) -> ParkadeResult<()> {
        self.0.delete_unparked(id).await
    }

    async fn record_check_in(
        &self,
        id: Uuid,
        spot_id: Uuid,
        at: DateTime<Utc>,
    ) -> ParkadeResult<Car> {
        self.0.record_check_in(id, spot_id, at).await
    }

    async fn record_check_out(
        &self,
        id: Uuid,
        spot_id: Uuid,
        at: DateTime<Utc>,
    ) -> ParkadeResult<Car> {
        self.0.record_check_out(id, spot_id, at).await
    }
}

type Coordinator = OccupancyService<SurrealParkingSpotRepository<Db>, SurrealCarRepository<Db>>;

async fn setup() -> (DbManager<Db>, Coordinator) {
    let manager = DbManager::in_memory().await.unwrap();
    let occupancy = OccupancyService::new(manager.spots(), manager.cars(), ServiceConfig::default());
    (manager, occupancy)
}

async fn free_spot(manager: &DbManager<Db>) -> ParkingSpot {
    manager
        .spots()
        .create(CreateParkingSpot {
            floor_id: Uuid::new_v4(),
            bay_id: None,
            name: "R-01".into(),
            size: SpotSize::Standard,
            status: SpotStatus::Available,
            rate: Decimal::new(300, 2),
            features: None,
        })
        .await
        .unwrap()
}

fn stale_car_admin(
    manager: &DbManager<Db>,
) -> CarService<StaleReads<SurrealCarRepository<Db>>, SurrealParkingFeeRepository<Db>> {
    CarService::new(StaleReads(manager.cars()), manager.fees())
}

/// A car with history that is parked nowhere right now.
async fn returning_car(occupancy: &Coordinator, spot_id: Uuid, plate: &str) -> Car {
    let car = occupancy.check_in(plate, spot_id).await.unwrap();
    occupancy.check_out(car.id).await.unwrap()
}

#[tokio::test]
async fn spot_delete_loses_to_a_check_in() {
    let (manager, occupancy) = setup().await;
    let spot = free_spot(&manager).await;
    let layout = LayoutService::new(
        manager.garages(),
        manager.floors(),
        manager.bays(),
        StaleReads(manager.spots()),
    );

    let (deleted, parked) = tokio::join!(layout.delete_spot(spot.id), async {
        sleep(HEAD_START).await;
        occupancy.check_in("ABC123", spot.id).await
    });

    assert!(deleted.unwrap_err().is_conflict("SPOT_OCCUPIED"));
    let car = parked.unwrap();
    assert!(manager.spots().get_by_id(spot.id).await.unwrap().is_occupied());
    assert_eq!(car.parking_spot_id, Some(spot.id));
    assert!(occupancy.occupancy_report().await.unwrap().is_empty());
}

#[tokio::test]
async fn car_delete_loses_to_a_returning_check_in() {
    let (manager, occupancy) = setup().await;
    let spot = free_spot(&manager).await;
    let car = returning_car(&occupancy, spot.id, "ABC123").await;
    let cars = stale_car_admin(&manager);

    let (deleted, parked) = tokio::join!(cars.delete_car(car.id), async {
        sleep(HEAD_START).await;
        occupancy.check_in("abc123", spot.id).await
    });

    assert!(deleted.unwrap_err().is_conflict("CAR_CHECKED_IN"));
    assert_eq!(parked.unwrap().id, car.id);
    assert!(manager.cars().get_by_id(car.id).await.unwrap().is_checked_in());
    assert!(occupancy.occupancy_report().await.unwrap().is_empty());
}

#[tokio::test]
async fn plate_change_loses_to_a_returning_check_in() {
    let (manager, occupancy) = setup().await;
    let spot = free_spot(&manager).await;
    let car = returning_car(&occupancy, spot.id, "ABC123").await;
    let cars = stale_car_admin(&manager);

    let (renamed, parked) = tokio::join!(cars.update_license_plate(car.id, "ZZZ999"), async {
        sleep(HEAD_START).await;
        occupancy.check_in("ABC123", spot.id).await
    });

    assert!(renamed.unwrap_err().is_conflict("CAR_CHECKED_IN"));
    parked.unwrap();
    let stored = manager.cars().get_by_id(car.id).await.unwrap();
    assert_eq!(stored.license_plate, "ABC123");
    assert!(stored.is_checked_in());
    assert!(
        occupancy
            .find_by_license_plate("ZZZ999")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn unraced_admin_writes_still_apply() {
    let (manager, occupancy) = setup().await;
    let spot = free_spot(&manager).await;
    let car = returning_car(&occupancy, spot.id, "CALM1").await;
    let cars = stale_car_admin(&manager);

    let renamed = cars.update_license_plate(car.id, "calm2").await.unwrap();
    assert_eq!(renamed.license_plate, "CALM2");
    cars.delete_car(car.id).await.unwrap();

    let layout = LayoutService::new(
        manager.garages(),
        manager.floors(),
        manager.bays(),
        StaleReads(manager.spots()),
    );
    layout.delete_spot(spot.id).await.unwrap();
    assert!(manager.cars().list().await.unwrap().is_empty());
}
