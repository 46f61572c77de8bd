use chrono::{DateTime, Utc};
use rand::Rng;
use rideway_core::identity::VehicleType;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A ride through its lifecycle: requested by a rider, accepted by a
/// captain, ongoing after OTP verification, then completed. Rows are never
/// deleted; terminal rides stay as history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ride {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Bound at confirmation; null while `requested`.
    pub captain_id: Option<Uuid>,
    pub pickup: String,
    pub destination: String,
    pub vehicle_type: VehicleType,
    /// Currency minor units.
    pub fare_minor: i32,
    pub status: RideStatus,
    /// Never serialized. The rider receives it once, in the creation
    /// response, and relays it to the captain in person.
    #[serde(skip_serializing, default)]
    pub otp: String,
    pub distance_meters: i32,
    pub duration_seconds: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RideStatus {
    Requested,
    Accepted,
    Ongoing,
    Completed,
    Cancelled,
}

impl RideStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RideStatus::Requested => "requested",
            RideStatus::Accepted => "accepted",
            RideStatus::Ongoing => "ongoing",
            RideStatus::Completed => "completed",
            RideStatus::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for RideStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "requested" => Ok(RideStatus::Requested),
            "accepted" => Ok(RideStatus::Accepted),
            "ongoing" => Ok(RideStatus::Ongoing),
            "completed" => Ok(RideStatus::Completed),
            "cancelled" => Ok(RideStatus::Cancelled),
            other => Err(format!("unknown ride status: {other}")),
        }
    }
}

impl std::fmt::Display for RideStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Six decimal digits, no leading zero.
pub fn generate_otp() -> String {
    rand::thread_rng().gen_range(100_000..1_000_000).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_storage_form() {
        for status in [
            RideStatus::Requested,
            RideStatus::Accepted,
            RideStatus::Ongoing,
            RideStatus::Completed,
            RideStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<RideStatus>().unwrap(), status);
        }
        assert!("pending".parse::<RideStatus>().is_err());
    }

    #[test]
    fn otp_is_six_digits_without_leading_zero() {
        for _ in 0..100 {
            let otp = generate_otp();
            assert_eq!(otp.len(), 6);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
            assert_ne!(otp.chars().next(), Some('0'));
        }
    }

    #[test]
    fn otp_never_serializes() {
        let ride = Ride {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            captain_id: None,
            pickup: "123 Main St".into(),
            destination: "456 Oak Ave".into(),
            vehicle_type: VehicleType::Car,
            fare_minor: 15500,
            status: RideStatus::Requested,
            otp: "482913".into(),
            distance_meters: 5000,
            duration_seconds: 600,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&ride).unwrap();
        assert!(json.get("otp").is_none());
        assert_eq!(json["status"], "requested");
        assert_eq!(json["vehicleType"], "car");
    }
}
