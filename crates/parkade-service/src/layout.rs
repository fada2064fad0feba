//! Administrative service for the parking layout: garages, floors, bays
//! and parking spots.
//!
//! Deletes are restrictive: a parent with children, or an occupied spot,
//! is never removed. Spot status is not writable here; new spots start
//! `available` and only the occupancy coordinator moves them.

use parkade_core::error::{ParkadeError, ParkadeResult};
use parkade_core::models::bay::{Bay, CreateBay, UpdateBay};
use parkade_core::models::floor::{CreateFloor, Floor, UpdateFloor};
use parkade_core::models::garage::{CreateGarage, Garage, UpdateGarage};
use parkade_core::models::parking_spot::{
    CreateParkingSpot, ParkingSpot, SpotStatus, UpdateParkingSpot,
};
use parkade_core::query::{BayFilter, SpotFilter};
use parkade_core::repository::{
    BayRepository, FloorRepository, GarageRepository, ParkingSpotRepository,
};
use parkade_core::{rules, validation};
use tracing::info;
use uuid::Uuid;

use crate::error::{AdminError, occupied_if_raced};

/// Turn a missing parent into a validation error on the referencing field.
fn parent<T>(result: ParkadeResult<T>, field: &str, label: &str) -> ParkadeResult<T> {
    match result {
        Err(ParkadeError::NotFound { id, .. }) => Err(ParkadeError::validation(
            field,
            format!("{label} {id} does not exist"),
        )),
        other => other,
    }
}

/// Layout administration.
pub struct LayoutService<G, F, B, S>
where
    G: GarageRepository,
    F: FloorRepository,
    B: BayRepository,
    S: ParkingSpotRepository,
{
    garages: G,
    floors: F,
    bays: B,
    spots: S,
}

impl<G, F, B, S> LayoutService<G, F, B, S>
where
    G: GarageRepository,
    F: FloorRepository,
    B: BayRepository,
    S: ParkingSpotRepository,
{
    pub fn new(garages: G, floors: F, bays: B, spots: S) -> Self {
        Self {
            garages,
            floors,
            bays,
            spots,
        }
    }

    // -------------------------------------------------------------------
    // Garages
    // -------------------------------------------------------------------

    pub async fn create_garage(&self, input: CreateGarage) -> ParkadeResult<Garage> {
        validation::validate_garage(&input.name, &input.location)?;
        let garage = self.garages.create(input).await?;
        info!(garage_id = %garage.id, "Garage created");
        Ok(garage)
    }

    pub async fn get_garage(&self, id: Uuid) -> ParkadeResult<Garage> {
        self.garages.get_by_id(id).await
    }

    pub async fn list_garages(&self) -> ParkadeResult<Vec<Garage>> {
        self.garages.list().await
    }

    pub async fn update_garage(&self, id: Uuid, input: UpdateGarage) -> ParkadeResult<Garage> {
        let current = self.garages.get_by_id(id).await?;
        validation::validate_garage(
            input.name.as_deref().unwrap_or(&current.name),
            input.location.as_deref().unwrap_or(&current.location),
        )?;
        self.garages.update(id, input).await
    }

    pub async fn delete_garage(&self, id: Uuid) -> ParkadeResult<()> {
        self.garages.get_by_id(id).await?;
        if !self.floors.list_by_garage(id).await?.is_empty() {
            return Err(AdminError::HasDependents {
                entity: "garage",
                id,
                dependents: "floors",
            }
            .into());
        }
        self.garages.delete(id).await?;
        info!(garage_id = %id, "Garage deleted");
        Ok(())
    }

    // -------------------------------------------------------------------
    // Floors
    // -------------------------------------------------------------------

    pub async fn create_floor(&self, input: CreateFloor) -> ParkadeResult<Floor> {
        validation::validate_floor(input.garage_id, &input.name)?;
        parent(self.garages.get_by_id(input.garage_id).await, "garage_id", "Garage")?;
        let floor = self.floors.create(input).await?;
        info!(floor_id = %floor.id, garage_id = %floor.garage_id, "Floor created");
        Ok(floor)
    }

    pub async fn get_floor(&self, id: Uuid) -> ParkadeResult<Floor> {
        self.floors.get_by_id(id).await
    }

    pub async fn list_floors(&self, garage_id: Uuid) -> ParkadeResult<Vec<Floor>> {
        self.floors.list_by_garage(garage_id).await
    }

    pub async fn update_floor(&self, id: Uuid, input: UpdateFloor) -> ParkadeResult<Floor> {
        let current = self.floors.get_by_id(id).await?;
        let garage_id = input.garage_id.unwrap_or(current.garage_id);
        validation::validate_floor(garage_id, input.name.as_deref().unwrap_or(&current.name))?;
        if garage_id != current.garage_id {
            parent(self.garages.get_by_id(garage_id).await, "garage_id", "Garage")?;
        }
        self.floors.update(id, input).await
    }

    pub async fn delete_floor(&self, id: Uuid) -> ParkadeResult<()> {
        self.floors.get_by_id(id).await?;
        if !self.bays.list_by_floor(id).await?.is_empty() {
            return Err(AdminError::HasDependents {
                entity: "floor",
                id,
                dependents: "bays",
            }
            .into());
        }
        if !self
            .spots
            .list(&SpotFilter::default().on_floor(id))
            .await?
            .is_empty()
        {
            return Err(AdminError::HasDependents {
                entity: "floor",
                id,
                dependents: "parking spots",
            }
            .into());
        }
        self.floors.delete(id).await?;
        info!(floor_id = %id, "Floor deleted");
        Ok(())
    }

    // -------------------------------------------------------------------
    // Bays
    // -------------------------------------------------------------------

    pub async fn create_bay(&self, input: CreateBay) -> ParkadeResult<Bay> {
        validation::validate_bay(input.floor_id, &input.name)?;
        parent(self.floors.get_by_id(input.floor_id).await, "floor_id", "Floor")?;
        let bay = self.bays.create(input).await?;
        info!(bay_id = %bay.id, floor_id = %bay.floor_id, "Bay created");
        Ok(bay)
    }

    pub async fn get_bay(&self, id: Uuid) -> ParkadeResult<Bay> {
        self.bays.get_by_id(id).await
    }

    pub async fn list_bays(&self, floor_id: Uuid) -> ParkadeResult<Vec<Bay>> {
        self.bays.list_by_floor(floor_id).await
    }

    pub async fn update_bay(&self, id: Uuid, input: UpdateBay) -> ParkadeResult<Bay> {
        let current = self.bays.get_by_id(id).await?;
        let floor_id = input.floor_id.unwrap_or(current.floor_id);
        validation::validate_bay(floor_id, input.name.as_deref().unwrap_or(&current.name))?;
        if floor_id != current.floor_id {
            parent(self.floors.get_by_id(floor_id).await, "floor_id", "Floor")?;
            // Spots keep their floor, so only an empty bay may move.
            self.ensure_bay_is_empty(id).await?;
        }
        self.bays.update(id, input).await
    }

    pub async fn delete_bay(&self, id: Uuid) -> ParkadeResult<()> {
        self.bays.get_by_id(id).await?;
        self.ensure_bay_is_empty(id).await?;
        self.bays.delete(id).await?;
        info!(bay_id = %id, "Bay deleted");
        Ok(())
    }

    async fn ensure_bay_is_empty(&self, id: Uuid) -> ParkadeResult<()> {
        let in_bay = SpotFilter::default().in_bay(BayFilter::In(id));
        if self.spots.list(&in_bay).await?.is_empty() {
            return Ok(());
        }
        Err(AdminError::HasDependents {
            entity: "bay",
            id,
            dependents: "parking spots",
        }
        .into())
    }

    // -------------------------------------------------------------------
    // Parking spots
    // -------------------------------------------------------------------

    pub async fn create_spot(&self, input: CreateParkingSpot) -> ParkadeResult<ParkingSpot> {
        validation::validate_parking_spot(&input)?;
        if input.status != SpotStatus::Available {
            return Err(ParkadeError::validation(
                "status",
                "new parking spots must be available",
            ));
        }
        self.check_placement(input.floor_id, input.bay_id).await?;

        let spot = self.spots.create(input).await?;
        info!(spot_id = %spot.id, floor_id = %spot.floor_id, "Parking spot created");
        Ok(spot)
    }

    pub async fn get_spot(&self, id: Uuid) -> ParkadeResult<ParkingSpot> {
        self.spots.get_by_id(id).await
    }

    pub async fn list_spots(&self, filter: &SpotFilter) -> ParkadeResult<Vec<ParkingSpot>> {
        self.spots.list(filter).await
    }

    pub async fn update_spot(
        &self,
        id: Uuid,
        input: UpdateParkingSpot,
    ) -> ParkadeResult<ParkingSpot> {
        let current = self.spots.get_by_id(id).await?;

        if let Some(name) = &input.name {
            if name.trim().is_empty() {
                return Err(ParkadeError::validation(
                    "name",
                    "Parking spot name is required",
                ));
            }
        }
        if let Some(rate) = input.rate {
            rules::validate_rate(rate)?;
        }
        if let Some(features) = &input.features {
            rules::validate_features(features.as_ref())?;
        }

        let floor_id = input.floor_id.unwrap_or(current.floor_id);
        let bay_id = input.bay_id.unwrap_or(current.bay_id);
        if floor_id != current.floor_id || bay_id != current.bay_id {
            self.check_placement(floor_id, bay_id).await?;
        }

        self.spots.update(id, input).await
    }

    pub async fn delete_spot(&self, id: Uuid) -> ParkadeResult<()> {
        let spot = self.spots.get_by_id(id).await?;
        if spot.is_occupied() {
            return Err(AdminError::SpotOccupied(id).into());
        }
        // A check-in may land after the read; the guarded delete catches it.
        self.spots
            .delete_available(id)
            .await
            .map_err(|err| occupied_if_raced(err, AdminError::SpotOccupied(id)))?;
        info!(spot_id = %id, "Parking spot deleted");
        Ok(())
    }

    /// The floor must exist, and a bay, when given, must be on that floor.
    async fn check_placement(&self, floor_id: Uuid, bay_id: Option<Uuid>) -> ParkadeResult<()> {
        parent(self.floors.get_by_id(floor_id).await, "floor_id", "Floor")?;
        if let Some(bay_id) = bay_id {
            let bay = parent(self.bays.get_by_id(bay_id).await, "bay_id", "Bay")?;
            if bay.floor_id != floor_id {
                return Err(ParkadeError::validation(
                    "bay_id",
                    format!("Bay {bay_id} is not on floor {floor_id}"),
                ));
            }
        }
        Ok(())
    }
}
