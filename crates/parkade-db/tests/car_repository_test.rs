//! Integration tests for the Car repository using in-memory SurrealDB.

use chrono::{Duration, Utc};
use parkade_core::error::ParkadeError;
use parkade_core::models::car::{CreateCar, UpdateCar};
use parkade_core::repository::{CONCURRENT_MODIFICATION, CarRepository};
use parkade_core::validation::LicensePlate;
use parkade_db::DbManager;
use parkade_db::repository::SurrealCarRepository;
use surrealdb::engine::local::Db;
use uuid::Uuid;

async fn setup() -> SurrealCarRepository<Db> {
    let db = DbManager::in_memory().await.unwrap().client().clone();
    SurrealCarRepository::new(db)
}

fn plate(raw: &str) -> LicensePlate {
    LicensePlate::parse(raw).unwrap()
}

#[tokio::test]
async fn create_parked_car() {
    let repo = setup().await;
    let spot_id = Uuid::new_v4();
    let now = Utc::now();

    let car = repo
        .create(CreateCar {
            license_plate: plate("abc 123"),
            parking_spot_id: Some(spot_id),
            checked_in_at: Some(now),
        })
        .await
        .unwrap();

    assert_eq!(car.license_plate, "ABC 123");
    assert_eq!(car.parking_spot_id, Some(spot_id));
    assert!(car.is_checked_in());

    let fetched = repo.get_by_id(car.id).await.unwrap();
    assert_eq!(fetched, car);
}

#[tokio::test]
async fn create_car_without_occupancy() {
    let repo = setup().await;
    let car = repo
        .create(CreateCar::parked_nowhere(plate("XYZ")))
        .await
        .unwrap();

    assert!(!car.is_checked_in());
    assert!(car.checked_in_at.is_none());
    assert!(car.checked_out_at.is_none());
}

#[tokio::test]
async fn check_in_and_out_are_conditional() {
    let repo = setup().await;
    let spot_id = Uuid::new_v4();
    let car = repo
        .create(CreateCar::parked_nowhere(plate("CAS1")))
        .await
        .unwrap();

    let at = Utc::now();
    let parked = repo.record_check_in(car.id, spot_id, at).await.unwrap();
    assert!(parked.is_checked_in());
    assert_eq!(parked.parking_spot_id, Some(spot_id));

    // Already checked in: a second check-in must not apply.
    let err = repo
        .record_check_in(car.id, Uuid::new_v4(), Utc::now())
        .await
        .unwrap_err();
    assert!(err.is_conflict(CONCURRENT_MODIFICATION));

    // Check-out against the wrong spot must not apply.
    let err = repo
        .record_check_out(car.id, Uuid::new_v4(), Utc::now())
        .await
        .unwrap_err();
    assert!(err.is_conflict(CONCURRENT_MODIFICATION));

    let out_at = at + Duration::minutes(30);
    let released = repo.record_check_out(car.id, spot_id, out_at).await.unwrap();
    assert_eq!(released.parking_spot_id, None);
    assert_eq!(released.checked_in_at, parked.checked_in_at);
    assert!(released.is_checked_out());

    // And only once.
    let err = repo
        .record_check_out(car.id, spot_id, Utc::now())
        .await
        .unwrap_err();
    assert!(err.is_conflict(CONCURRENT_MODIFICATION));

    // Re-entry clears the previous check-out.
    let again = repo
        .record_check_in(car.id, spot_id, Utc::now())
        .await
        .unwrap();
    assert!(again.is_checked_in());
    assert_eq!(again.checked_out_at, None);
}

#[tokio::test]
async fn conditional_write_on_missing_car_is_not_found() {
    let repo = setup().await;
    let err = repo
        .record_check_in(Uuid::new_v4(), Uuid::new_v4(), Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, ParkadeError::NotFound { .. }));
}

#[tokio::test]
async fn find_by_plate_prefers_checked_in_row() {
    let repo = setup().await;
    let spot_id = Uuid::new_v4();

    let parked = repo
        .create(CreateCar {
            license_plate: plate("DUP1"),
            parking_spot_id: Some(spot_id),
            checked_in_at: Some(Utc::now()),
        })
        .await
        .unwrap();
    // A newer history row with the same plate.
    let history = repo
        .create(CreateCar::parked_nowhere(plate("dup1")))
        .await
        .unwrap();
    assert!(history.updated_at >= parked.updated_at);

    let found = repo.find_by_license_plate(&plate("DUP1")).await.unwrap();
    assert_eq!(found.map(|c| c.id), Some(parked.id));

    repo.record_check_out(parked.id, spot_id, Utc::now())
        .await
        .unwrap();
    repo.update(
        history.id,
        UpdateCar {
            license_plate: Some(plate("DUP1")),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    // Nobody checked in: the most recently updated row wins.
    let found = repo.find_by_license_plate(&plate("DUP1")).await.unwrap();
    assert_eq!(found.map(|c| c.id), Some(history.id));

    assert!(repo
        .find_by_license_plate(&plate("NOPE"))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn update_can_restore_occupancy_fields() {
    let repo = setup().await;
    let spot_id = Uuid::new_v4();
    let car = repo
        .create(CreateCar {
            license_plate: plate("RESTORE"),
            parking_spot_id: Some(spot_id),
            checked_in_at: Some(Utc::now()),
        })
        .await
        .unwrap();

    repo.record_check_out(car.id, spot_id, Utc::now())
        .await
        .unwrap();
    let restored = repo
        .update(car.id, UpdateCar::restore_occupancy(&car))
        .await
        .unwrap();

    assert_eq!(restored.parking_spot_id, car.parking_spot_id);
    assert_eq!(restored.checked_in_at, car.checked_in_at);
    assert_eq!(restored.checked_out_at, None);
}

#[tokio::test]
async fn list_and_delete_cars() {
    let repo = setup().await;
    let a = repo
        .create(CreateCar::parked_nowhere(plate("A1")))
        .await
        .unwrap();
    let b = repo
        .create(CreateCar::parked_nowhere(plate("B2")))
        .await
        .unwrap();

    let cars = repo.list().await.unwrap();
    assert_eq!(cars.len(), 2);
    assert_eq!(cars[0].id, b.id);

    repo.delete(a.id).await.unwrap();
    assert_eq!(repo.list().await.unwrap().len(), 1);
    assert!(matches!(
        repo.delete(a.id).await.unwrap_err(),
        ParkadeError::NotFound { .. }
    ));
}

#[tokio::test]
async fn checked_in_car_is_neither_renamed_nor_deleted() {
    let repo = setup().await;
    let spot_id = Uuid::new_v4();
    let car = repo
        .create(CreateCar {
            license_plate: plate("HELD"),
            parking_spot_id: Some(spot_id),
            checked_in_at: Some(Utc::now()),
        })
        .await
        .unwrap();

    let err = repo.rename_unparked(car.id, plate("OTHER")).await.unwrap_err();
    assert!(err.is_conflict(CONCURRENT_MODIFICATION));
    let err = repo.delete_unparked(car.id).await.unwrap_err();
    assert!(err.is_conflict(CONCURRENT_MODIFICATION));
    assert_eq!(repo.get_by_id(car.id).await.unwrap().license_plate, "HELD");

    repo.record_check_out(car.id, spot_id, Utc::now()).await.unwrap();
    let renamed = repo.rename_unparked(car.id, plate("OTHER")).await.unwrap();
    assert_eq!(renamed.license_plate, "OTHER");
    assert!(renamed.is_checked_out());
    repo.delete_unparked(car.id).await.unwrap();
    assert!(matches!(
        repo.delete_unparked(car.id).await.unwrap_err(),
        ParkadeError::NotFound { .. }
    ));
}
