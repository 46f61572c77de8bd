use async_trait::async_trait;
use rideway_core::identity::VehicleType;
use uuid::Uuid;

use crate::model::{Ride, RideStatus};

pub type RepoError = Box<dyn std::error::Error + Send + Sync>;

/// Everything needed to persist a ride in `requested` state.
#[derive(Debug, Clone)]
pub struct NewRide {
    pub user_id: Uuid,
    pub pickup: String,
    pub destination: String,
    pub vehicle_type: VehicleType,
    pub fare_minor: i32,
    pub otp: String,
    pub distance_meters: i32,
    pub duration_seconds: i32,
}

/// Ride persistence. Every state change is a single conditional update so
/// concurrent actors race on the store, not in application code: the write
/// succeeds for exactly one of them, and `None` tells the loser to re-read
/// and report why.
#[async_trait]
pub trait RideRepository: Send + Sync {
    async fn create(&self, ride: NewRide) -> Result<Ride, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Ride>, RepoError>;

    /// Bind `captain_id` and move `requested -> accepted` in one atomic
    /// step. `None` when the ride is missing, already bound, or no longer
    /// in `requested`.
    async fn assign_captain(
        &self,
        ride_id: Uuid,
        captain_id: Uuid,
    ) -> Result<Option<Ride>, RepoError>;

    /// Move `from -> to` for the ride bound to `captain_id`. `None` when no
    /// row matches all three conditions.
    async fn transition(
        &self,
        ride_id: Uuid,
        captain_id: Uuid,
        from: RideStatus,
        to: RideStatus,
    ) -> Result<Option<Ride>, RepoError>;

    /// Rider-initiated cancel, allowed from `requested` or `accepted`,
    /// checked against the requesting user. `None` when no row matches.
    async fn cancel_by_user(&self, ride_id: Uuid, user_id: Uuid)
        -> Result<Option<Ride>, RepoError>;

    /// The captain's ride currently in `accepted` or `ongoing`, if any.
    async fn active_for_captain(&self, captain_id: Uuid) -> Result<Option<Ride>, RepoError>;
}
