//! Integration tests for car and parking fee administration using
//! in-memory SurrealDB.

use chrono::{Duration, Utc};
use parkade_core::error::ParkadeError;
use parkade_core::models::parking_fee::{CreateParkingFee, UpdateParkingFee};
use parkade_core::models::parking_spot::{CreateParkingSpot, SpotSize, SpotStatus};
use parkade_core::repository::ParkingSpotRepository;
use parkade_db::DbManager;
use parkade_db::repository::{
    SurrealCarRepository, SurrealParkingFeeRepository, SurrealParkingSpotRepository,
};
use parkade_service::cars::CarService;
use parkade_service::config::ServiceConfig;
use parkade_service::fees::FeeService;
use parkade_service::occupancy::OccupancyService;
use rust_decimal::Decimal;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use uuid::Uuid;

struct Services {
    cars: CarService<SurrealCarRepository<Db>, SurrealParkingFeeRepository<Db>>,
    fees: FeeService<SurrealParkingFeeRepository<Db>, SurrealCarRepository<Db>>,
    occupancy: OccupancyService<SurrealParkingSpotRepository<Db>, SurrealCarRepository<Db>>,
    db: Surreal<Db>,
}

async fn setup() -> Services {
    let db = DbManager::in_memory().await.unwrap().client().clone();

    Services {
        cars: CarService::new(
            SurrealCarRepository::new(db.clone()),
            SurrealParkingFeeRepository::new(db.clone()),
        ),
        fees: FeeService::new(
            SurrealParkingFeeRepository::new(db.clone()),
            SurrealCarRepository::new(db.clone()),
        ),
        occupancy: OccupancyService::new(
            SurrealParkingSpotRepository::new(db.clone()),
            SurrealCarRepository::new(db.clone()),
            ServiceConfig::default(),
        ),
        db,
    }
}

async fn spot_id(db: &Surreal<Db>) -> Uuid {
    SurrealParkingSpotRepository::new(db.clone())
        .create(CreateParkingSpot {
            floor_id: Uuid::new_v4(),
            bay_id: None,
            name: "B-07".into(),
            size: SpotSize::Oversized,
            status: SpotStatus::Available,
            rate: Decimal::new(1250, 2),
            features: None,
        })
        .await
        .unwrap()
        .id
}

// -----------------------------------------------------------------------
// Cars
// -----------------------------------------------------------------------

#[tokio::test]
async fn registered_car_is_not_parked() {
    let s = setup().await;
    let car = s.cars.create_car(" ab-12 cd ").await.unwrap();

    assert_eq!(car.license_plate, "AB-12 CD");
    assert!(!car.is_checked_in());
    assert_eq!(s.cars.list_cars().await.unwrap().len(), 1);

    let err = s.cars.create_car("").await.unwrap_err();
    assert!(matches!(err, ParkadeError::Validation { .. }));
}

#[tokio::test]
async fn registered_car_is_reused_at_check_in() {
    let s = setup().await;
    let car = s.cars.create_car("PRE1").await.unwrap();
    let spot = spot_id(&s.db).await;

    let parked = s.occupancy.check_in("pre1", spot).await.unwrap();
    assert_eq!(parked.id, car.id);
}

#[tokio::test]
async fn checked_in_car_is_protected() {
    let s = setup().await;
    let spot = spot_id(&s.db).await;
    let car = s.occupancy.check_in("HELD", spot).await.unwrap();

    let err = s.cars.delete_car(car.id).await.unwrap_err();
    assert!(err.is_conflict("CAR_CHECKED_IN"));
    let err = s.cars.update_license_plate(car.id, "OTHER").await.unwrap_err();
    assert!(err.is_conflict("CAR_CHECKED_IN"));

    s.occupancy.check_out(car.id).await.unwrap();
    let renamed = s.cars.update_license_plate(car.id, "other").await.unwrap();
    assert_eq!(renamed.license_plate, "OTHER");
    s.cars.delete_car(car.id).await.unwrap();
    assert!(matches!(
        s.cars.get_car(car.id).await.unwrap_err(),
        ParkadeError::NotFound { .. }
    ));
}

// -----------------------------------------------------------------------
// Fees
// -----------------------------------------------------------------------

#[tokio::test]
async fn fee_requires_existing_car() {
    let s = setup().await;

    let err = s
        .fees
        .create_fee(CreateParkingFee {
            car_id: Uuid::new_v4(),
            billed_at: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ParkadeError::Validation { ref field, .. } if field == "car_id"));

    let err = s
        .fees
        .create_fee(CreateParkingFee {
            car_id: Uuid::nil(),
            billed_at: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ParkadeError::Validation { .. }));
}

#[tokio::test]
async fn fees_are_listed_per_car() {
    let s = setup().await;
    let a = s.cars.create_car("FEE-A").await.unwrap();
    let b = s.cars.create_car("FEE-B").await.unwrap();
    let now = Utc::now();

    let old = s
        .fees
        .create_fee(CreateParkingFee {
            car_id: a.id,
            billed_at: Some(now - Duration::days(2)),
        })
        .await
        .unwrap();
    let new = s
        .fees
        .create_fee(CreateParkingFee {
            car_id: a.id,
            billed_at: None,
        })
        .await
        .unwrap();
    s.fees
        .create_fee(CreateParkingFee {
            car_id: b.id,
            billed_at: None,
        })
        .await
        .unwrap();

    let for_a = s.fees.list_fees(Some(a.id)).await.unwrap();
    assert_eq!(
        for_a.iter().map(|f| f.id).collect::<Vec<_>>(),
        vec![new.id, old.id]
    );
    assert_eq!(s.fees.list_fees(None).await.unwrap().len(), 3);
}

#[tokio::test]
async fn car_with_fees_cannot_be_deleted() {
    let s = setup().await;
    let car = s.cars.create_car("BILLED").await.unwrap();
    let fee = s
        .fees
        .create_fee(CreateParkingFee {
            car_id: car.id,
            billed_at: None,
        })
        .await
        .unwrap();

    let err = s.cars.delete_car(car.id).await.unwrap_err();
    assert!(err.is_conflict("HAS_DEPENDENTS"));

    s.fees.delete_fee(fee.id).await.unwrap();
    s.cars.delete_car(car.id).await.unwrap();
}

#[tokio::test]
async fn fee_update_checks_new_car() {
    let s = setup().await;
    let car = s.cars.create_car("MOVE").await.unwrap();
    let fee = s
        .fees
        .create_fee(CreateParkingFee {
            car_id: car.id,
            billed_at: None,
        })
        .await
        .unwrap();

    let err = s
        .fees
        .update_fee(
            fee.id,
            UpdateParkingFee {
                car_id: Some(Uuid::new_v4()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ParkadeError::Validation { .. }));

    let later = fee.billed_at + Duration::minutes(5);
    let updated = s
        .fees
        .update_fee(
            fee.id,
            UpdateParkingFee {
                billed_at: Some(later),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.billed_at, later);
    assert_eq!(s.fees.get_fee(fee.id).await.unwrap(), updated);
}
