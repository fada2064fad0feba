//! Service-level conflict types.
//!
//! Each variant carries a stable code and converts into
//! [`ParkadeError::Conflict`].

use parkade_core::error::ParkadeError;
use parkade_core::repository::CONCURRENT_MODIFICATION;
use thiserror::Error;
use uuid::Uuid;

/// Occupancy protocol rejections.
#[derive(Debug, Error)]
pub enum OccupancyError {
    #[error("parking spot is already occupied")]
    AlreadyOccupied,

    #[error("parking spot is already available")]
    AlreadyAvailable,

    #[error("car is not checked in to any parking spot")]
    NotCheckedIn,

    #[error("car is already checked out")]
    AlreadyCheckedOut,

    #[error("car {plate} is already checked in to parking spot {spot_id}")]
    AlreadyCheckedIn { plate: String, spot_id: Uuid },

    #[error("{0}")]
    ConcurrentModification(String),
}

impl OccupancyError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::AlreadyOccupied => "ALREADY_OCCUPIED",
            Self::AlreadyAvailable => "ALREADY_AVAILABLE",
            Self::NotCheckedIn => "NOT_CHECKED_IN",
            Self::AlreadyCheckedOut => "ALREADY_CHECKED_OUT",
            Self::AlreadyCheckedIn { .. } => "ALREADY_CHECKED_IN",
            Self::ConcurrentModification(_) => CONCURRENT_MODIFICATION,
        }
    }
}

impl From<OccupancyError> for ParkadeError {
    fn from(err: OccupancyError) -> Self {
        ParkadeError::conflict(err.code(), err.to_string())
    }
}

/// Administrative rejections (restrict-delete and protected fields).
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("{entity} {id} still has {dependents}")]
    HasDependents {
        entity: &'static str,
        id: Uuid,
        dependents: &'static str,
    },

    #[error("parking spot {0} is occupied")]
    SpotOccupied(Uuid),

    #[error("car {0} is checked in")]
    CarCheckedIn(Uuid),
}

impl AdminError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::HasDependents { .. } => "HAS_DEPENDENTS",
            Self::SpotOccupied(_) => "SPOT_OCCUPIED",
            Self::CarCheckedIn(_) => "CAR_CHECKED_IN",
        }
    }
}

impl From<AdminError> for ParkadeError {
    fn from(err: AdminError) -> Self {
        ParkadeError::conflict(err.code(), err.to_string())
    }
}

/// A guarded admin write that lost to an occupancy change reports the
/// same conflict as the up-front check would have.
pub(crate) fn occupied_if_raced(err: ParkadeError, occupied: AdminError) -> ParkadeError {
    if err.is_conflict(CONCURRENT_MODIFICATION) {
        occupied.into()
    } else {
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lost_guard_maps_to_the_admin_conflict() {
        let id = Uuid::new_v4();
        let raced = ParkadeError::conflict(CONCURRENT_MODIFICATION, "moved");
        assert!(occupied_if_raced(raced, AdminError::SpotOccupied(id)).is_conflict("SPOT_OCCUPIED"));

        let missing = ParkadeError::NotFound {
            entity: "car".into(),
            id: id.to_string(),
        };
        let err = occupied_if_raced(missing, AdminError::CarCheckedIn(id));
        assert!(matches!(err, ParkadeError::NotFound { .. }));
    }

    #[test]
    fn occupancy_errors_become_conflicts_with_their_code() {
        let err: ParkadeError = OccupancyError::AlreadyOccupied.into();
        assert!(err.is_conflict("ALREADY_OCCUPIED"));
        assert_eq!(err.status_code(), 409);
        assert!(err.to_string().contains("already occupied"));

        let err: ParkadeError = OccupancyError::NotCheckedIn.into();
        assert_eq!(err.code(), "NOT_CHECKED_IN");
    }

    #[test]
    fn admin_errors_become_conflicts_with_their_code() {
        let id = Uuid::new_v4();
        let err: ParkadeError = AdminError::HasDependents {
            entity: "garage",
            id,
            dependents: "floors",
        }
        .into();
        assert!(err.is_conflict("HAS_DEPENDENTS"));
        assert!(err.to_string().contains(&id.to_string()));
    }
}
