use rideway_core::geo::Coordinate;
use rideway_core::identity::{Captain, User, Vehicle, VehicleType};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Ride, RideStatus};

/// Who a notification is addressed to. The realtime layer resolves this to
/// a live connection; nothing about connections leaks into the domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Party {
    pub role: PartyRole,
    pub id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartyRole {
    User,
    Captain,
}

impl Party {
    pub fn user(id: Uuid) -> Self {
        Self {
            role: PartyRole::User,
            id,
        }
    }

    pub fn captain(id: Uuid) -> Self {
        Self {
            role: PartyRole::Captain,
            id,
        }
    }

    /// Group a party joins on connect; delivery falls back to it when the
    /// direct binding is gone.
    pub fn group_name(&self) -> String {
        match self.role {
            PartyRole::User => format!("user:{}", self.id),
            PartyRole::Captain => format!("captain:{}", self.id),
        }
    }
}

/// A delivery intent produced by the ride orchestrator.
#[derive(Debug, Clone)]
pub struct Notification {
    pub to: Party,
    pub event: RideEvent,
}

/// Server-pushed events, tagged with their wire names.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum RideEvent {
    NewRide(RideOffer),
    RideConfirmed(RideUpdate),
    RideStarted(RideUpdate),
    RideEnded(RideUpdate),
    RideCancelled(RideUpdate),
    CaptainLocationUpdate { location: Coordinate },
}

/// Captain-facing offer. Built without the OTP field so it cannot leak.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RideOffer {
    pub id: Uuid,
    pub pickup: String,
    pub destination: String,
    pub vehicle_type: VehicleType,
    pub fare_minor: i32,
    pub status: RideStatus,
    pub distance_meters: i32,
    pub duration_seconds: i32,
    pub rider: RiderSummary,
}

impl RideOffer {
    pub fn from_ride(ride: &Ride, rider: &User) -> Self {
        Self {
            id: ride.id,
            pickup: ride.pickup.clone(),
            destination: ride.destination.clone(),
            vehicle_type: ride.vehicle_type,
            fare_minor: ride.fare_minor,
            status: ride.status,
            distance_meters: ride.distance_meters,
            duration_seconds: ride.duration_seconds,
            rider: RiderSummary {
                id: rider.id,
                first_name: rider.first_name.clone(),
                last_name: rider.last_name.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiderSummary {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
}

/// Transition payload pushed to whichever side did not act.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RideUpdate {
    pub id: Uuid,
    pub status: RideStatus,
    pub pickup: String,
    pub destination: String,
    pub fare_minor: i32,
    pub captain: Option<CaptainSummary>,
}

impl RideUpdate {
    pub fn from_ride(ride: &Ride, captain: Option<&Captain>) -> Self {
        Self {
            id: ride.id,
            status: ride.status,
            pickup: ride.pickup.clone(),
            destination: ride.destination.clone(),
            fare_minor: ride.fare_minor,
            captain: captain.map(CaptainSummary::from),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptainSummary {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub vehicle: Vehicle,
}

impl From<&Captain> for CaptainSummary {
    fn from(captain: &Captain) -> Self {
        Self {
            id: captain.id,
            first_name: captain.first_name.clone(),
            last_name: captain.last_name.clone(),
            vehicle: captain.vehicle.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_carry_their_wire_names() {
        let event = RideEvent::CaptainLocationUpdate {
            location: Coordinate::new(12.97, 77.59),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "captain-location-update");
        assert_eq!(json["data"]["location"]["lat"], 12.97);
    }

    #[test]
    fn group_names_follow_role_and_id() {
        let id = Uuid::new_v4();
        assert_eq!(Party::user(id).group_name(), format!("user:{id}"));
        assert_eq!(Party::captain(id).group_name(), format!("captain:{id}"));
    }
}
