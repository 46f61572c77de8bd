use std::sync::Arc;

use rideway_core::geo::{GeoError, Geocoder};
use rideway_core::identity::{Captain, VehicleType};
use rideway_core::repository::{CaptainRepository, UserRepository};
use rideway_fare::{FareEngine, FareQuote};
use tracing::{debug, info};
use uuid::Uuid;

use crate::model::{generate_otp, Ride, RideStatus};
use crate::notification::{Notification, Party, RideEvent, RideOffer, RideUpdate};
use crate::repository::{NewRide, RepoError, RideRepository};

#[derive(Debug, thiserror::Error)]
pub enum RideError {
    #[error("ride not found")]
    NotFound,

    #[error("ride is not in a state that allows this transition")]
    InvalidState,

    #[error("not authorized for this ride")]
    Unauthorized,

    #[error(transparent)]
    Geo(#[from] GeoError),

    #[error("storage failure: {0}")]
    Repo(String),
}

impl RideError {
    fn repo(err: RepoError) -> Self {
        RideError::Repo(err.to_string())
    }
}

/// Sequences the ride lifecycle and produces notification intents. Nothing
/// here touches a socket; delivery belongs to the realtime layer.
pub struct RideService {
    rides: Arc<dyn RideRepository>,
    users: Arc<dyn UserRepository>,
    captains: Arc<dyn CaptainRepository>,
    geocoder: Arc<dyn Geocoder>,
    fares: FareEngine,
    search_radius_km: f64,
}

impl RideService {
    pub fn new(
        rides: Arc<dyn RideRepository>,
        users: Arc<dyn UserRepository>,
        captains: Arc<dyn CaptainRepository>,
        geocoder: Arc<dyn Geocoder>,
        fares: FareEngine,
        search_radius_km: f64,
    ) -> Self {
        Self {
            rides,
            users,
            captains,
            geocoder,
            fares,
            search_radius_km,
        }
    }

    /// Fares for every vehicle class over the given route.
    pub async fn quote(&self, pickup: &str, destination: &str) -> Result<FareQuote, RideError> {
        let metrics = self.geocoder.route_metrics(pickup, destination).await?;
        Ok(self.fares.quote(&metrics))
    }

    /// Persist a new ride in `requested`. Offering it to captains is a
    /// separate step so the creation response never waits on dispatch.
    pub async fn create(
        &self,
        user_id: Uuid,
        pickup: String,
        destination: String,
        vehicle_type: VehicleType,
    ) -> Result<Ride, RideError> {
        let metrics = self.geocoder.route_metrics(&pickup, &destination).await?;
        let quote = self.fares.quote(&metrics);

        let ride = self
            .rides
            .create(NewRide {
                user_id,
                pickup,
                destination,
                vehicle_type,
                fare_minor: quote.fare_for(vehicle_type),
                otp: generate_otp(),
                distance_meters: metrics.distance_meters.round() as i32,
                duration_seconds: metrics.duration_seconds.round() as i32,
            })
            .await
            .map_err(RideError::repo)?;

        info!(ride_id = %ride.id, user_id = %user_id, "ride requested");
        Ok(ride)
    }

    /// One `new-ride` intent per captain near the pickup point. The offer
    /// is built from an OTP-free view of the ride.
    pub async fn dispatch_nearby(&self, ride: &Ride) -> Result<Vec<Notification>, RideError> {
        let pickup = self.geocoder.coordinates_of(&ride.pickup).await?;
        let nearby = self
            .captains
            .find_within_radius(pickup.lng, pickup.lat, self.search_radius_km)
            .await
            .map_err(RideError::repo)?;

        let rider = self
            .users
            .find_by_id(ride.user_id)
            .await
            .map_err(RideError::repo)?
            .ok_or(RideError::NotFound)?;

        let offer = RideOffer::from_ride(ride, &rider);
        debug!(ride_id = %ride.id, captains = nearby.len(), "dispatching ride offer");

        Ok(nearby
            .into_iter()
            .map(|captain| Notification {
                to: Party::captain(captain.id),
                event: RideEvent::NewRide(offer.clone()),
            })
            .collect())
    }

    /// Captain accepts: `requested -> accepted`, binding the captain. The
    /// conditional update decides races; the loser gets a precise error
    /// from a follow-up read.
    pub async fn confirm(
        &self,
        ride_id: Uuid,
        captain: &Captain,
    ) -> Result<(Ride, Notification), RideError> {
        match self
            .rides
            .assign_captain(ride_id, captain.id)
            .await
            .map_err(RideError::repo)?
        {
            Some(ride) => {
                info!(ride_id = %ride.id, captain_id = %captain.id, "ride confirmed");
                let update = RideUpdate::from_ride(&ride, Some(captain));
                let note = Notification {
                    to: Party::user(ride.user_id),
                    event: RideEvent::RideConfirmed(update),
                };
                Ok((ride, note))
            }
            None => Err(self.explain_failure(ride_id, captain.id).await),
        }
    }

    /// Captain starts: requires `accepted`, the bound captain, and the
    /// exact OTP the rider was issued. A wrong OTP leaves the ride
    /// untouched.
    pub async fn start(
        &self,
        ride_id: Uuid,
        otp: &str,
        captain: &Captain,
    ) -> Result<(Ride, Notification), RideError> {
        let current = self
            .rides
            .find_by_id(ride_id)
            .await
            .map_err(RideError::repo)?
            .ok_or(RideError::NotFound)?;

        if current.captain_id != Some(captain.id) {
            return Err(RideError::Unauthorized);
        }
        if current.otp != otp {
            return Err(RideError::Unauthorized);
        }
        if current.status != RideStatus::Accepted {
            return Err(RideError::InvalidState);
        }

        match self
            .rides
            .transition(ride_id, captain.id, RideStatus::Accepted, RideStatus::Ongoing)
            .await
            .map_err(RideError::repo)?
        {
            Some(ride) => {
                info!(ride_id = %ride.id, "ride started");
                let update = RideUpdate::from_ride(&ride, Some(captain));
                let note = Notification {
                    to: Party::user(ride.user_id),
                    event: RideEvent::RideStarted(update),
                };
                Ok((ride, note))
            }
            None => Err(self.explain_failure(ride_id, captain.id).await),
        }
    }

    /// Captain completes an ongoing ride.
    pub async fn end(
        &self,
        ride_id: Uuid,
        captain: &Captain,
    ) -> Result<(Ride, Notification), RideError> {
        match self
            .rides
            .transition(ride_id, captain.id, RideStatus::Ongoing, RideStatus::Completed)
            .await
            .map_err(RideError::repo)?
        {
            Some(ride) => {
                info!(ride_id = %ride.id, "ride ended");
                let update = RideUpdate::from_ride(&ride, Some(captain));
                let note = Notification {
                    to: Party::user(ride.user_id),
                    event: RideEvent::RideEnded(update),
                };
                Ok((ride, note))
            }
            None => Err(self.explain_failure(ride_id, captain.id).await),
        }
    }

    /// Rider cancel, allowed while `requested` or `accepted`. The bound
    /// captain, when there is one, hears about it.
    pub async fn cancel(
        &self,
        ride_id: Uuid,
        user_id: Uuid,
    ) -> Result<(Ride, Option<Notification>), RideError> {
        match self
            .rides
            .cancel_by_user(ride_id, user_id)
            .await
            .map_err(RideError::repo)?
        {
            Some(ride) => {
                info!(ride_id = %ride.id, "ride cancelled");
                let note = ride.captain_id.map(|captain_id| Notification {
                    to: Party::captain(captain_id),
                    event: RideEvent::RideCancelled(RideUpdate::from_ride(&ride, None)),
                });
                Ok((ride, note))
            }
            None => match self.rides.find_by_id(ride_id).await.map_err(RideError::repo)? {
                None => Err(RideError::NotFound),
                Some(ride) if ride.user_id != user_id => Err(RideError::Unauthorized),
                Some(_) => Err(RideError::InvalidState),
            },
        }
    }

    /// The captain's current `accepted`/`ongoing` ride, for live location
    /// forwarding.
    pub async fn active_ride_for_captain(
        &self,
        captain_id: Uuid,
    ) -> Result<Option<Ride>, RideError> {
        self.rides
            .active_for_captain(captain_id)
            .await
            .map_err(RideError::repo)
    }

    /// A conditional update matched no row. Re-read once to say why.
    async fn explain_failure(&self, ride_id: Uuid, captain_id: Uuid) -> RideError {
        match self.rides.find_by_id(ride_id).await {
            Ok(None) => RideError::NotFound,
            Ok(Some(ride)) => match ride.captain_id {
                Some(bound) if bound != captain_id => RideError::Unauthorized,
                _ => RideError::InvalidState,
            },
            Err(err) => RideError::repo(err),
        }
    }
}
