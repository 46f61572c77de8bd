use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::Coordinate;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A driver. The live socket handle is deliberately not a field here; the
/// realtime layer tracks connections in-process and rebinds on reconnect.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Captain {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub status: CaptainStatus,
    pub vehicle: Vehicle,
    /// Last position reported over the socket, if any.
    pub location: Option<Coordinate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptainStatus {
    Active,
    Inactive,
}

impl CaptainStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CaptainStatus::Active => "active",
            CaptainStatus::Inactive => "inactive",
        }
    }
}

impl std::str::FromStr for CaptainStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(CaptainStatus::Active),
            "inactive" => Ok(CaptainStatus::Inactive),
            other => Err(format!("unknown captain status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub color: String,
    pub plate: String,
    pub capacity: i32,
    pub vehicle_type: VehicleType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleType {
    Auto,
    Car,
    Motorcycle,
}

impl VehicleType {
    pub fn as_str(self) -> &'static str {
        match self {
            VehicleType::Auto => "auto",
            VehicleType::Car => "car",
            VehicleType::Motorcycle => "motorcycle",
        }
    }
}

impl std::str::FromStr for VehicleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(VehicleType::Auto),
            "car" => Ok(VehicleType::Car),
            "motorcycle" => Ok(VehicleType::Motorcycle),
            other => Err(format!("unknown vehicle type: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vehicle_type_round_trips_through_storage_form() {
        for vehicle in [VehicleType::Auto, VehicleType::Car, VehicleType::Motorcycle] {
            assert_eq!(vehicle.as_str().parse::<VehicleType>().unwrap(), vehicle);
        }
        assert!("rickshaw".parse::<VehicleType>().is_err());
    }

    #[test]
    fn password_hash_never_serializes() {
        let user = User {
            id: Uuid::new_v4(),
            first_name: "Asha".into(),
            last_name: "Verma".into(),
            email: "asha@example.com".into(),
            password_hash: "$argon2id$secret".into(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "asha@example.com");
    }
}
