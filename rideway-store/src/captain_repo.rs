use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use rideway_core::geo::{Coordinate, EARTH_RADIUS_KM};
use rideway_core::identity::{Captain, CaptainStatus, Vehicle, VehicleType};
use rideway_core::repository::{CaptainRepository, NewCaptain, RepoError};

pub struct PgCaptainRepository {
    pool: PgPool,
}

impl PgCaptainRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const CAPTAIN_COLUMNS: &str = "id, first_name, last_name, email, password_hash, status, \
     vehicle_color, vehicle_plate, vehicle_capacity, vehicle_type, \
     location_lng, location_lat, created_at";

#[derive(sqlx::FromRow)]
struct CaptainRow {
    id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    password_hash: String,
    status: String,
    vehicle_color: String,
    vehicle_plate: String,
    vehicle_capacity: i32,
    vehicle_type: String,
    location_lng: Option<f64>,
    location_lat: Option<f64>,
    created_at: DateTime<Utc>,
}

impl TryFrom<CaptainRow> for Captain {
    type Error = RepoError;

    fn try_from(row: CaptainRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<CaptainStatus>()?;
        let vehicle_type = row.vehicle_type.parse::<VehicleType>()?;

        let location = match (row.location_lng, row.location_lat) {
            (Some(lng), Some(lat)) => Some(Coordinate::new(lat, lng)),
            _ => None,
        };

        Ok(Captain {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            password_hash: row.password_hash,
            status,
            vehicle: Vehicle {
                color: row.vehicle_color,
                plate: row.vehicle_plate,
                capacity: row.vehicle_capacity,
                vehicle_type,
            },
            location,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl CaptainRepository for PgCaptainRepository {
    async fn create(&self, captain: NewCaptain) -> Result<Captain, RepoError> {
        let row = sqlx::query_as::<_, CaptainRow>(
            r#"
            INSERT INTO captains (id, first_name, last_name, email, password_hash,
                                  vehicle_color, vehicle_plate, vehicle_capacity, vehicle_type)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, first_name, last_name, email, password_hash, status,
                      vehicle_color, vehicle_plate, vehicle_capacity, vehicle_type,
                      location_lng, location_lat, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&captain.first_name)
        .bind(&captain.last_name)
        .bind(&captain.email)
        .bind(&captain.password_hash)
        .bind(&captain.vehicle.color)
        .bind(&captain.vehicle.plate)
        .bind(captain.vehicle.capacity)
        .bind(captain.vehicle.vehicle_type.as_str())
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Captain>, RepoError> {
        let row = sqlx::query_as::<_, CaptainRow>(&format!(
            "SELECT {CAPTAIN_COLUMNS} FROM captains WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Captain::try_from).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Captain>, RepoError> {
        let row = sqlx::query_as::<_, CaptainRow>(&format!(
            "SELECT {CAPTAIN_COLUMNS} FROM captains WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Captain::try_from).transpose()
    }

    async fn update_location(&self, id: Uuid, location: Coordinate) -> Result<(), RepoError> {
        sqlx::query("UPDATE captains SET location_lng = $2, location_lat = $3 WHERE id = $1")
            .bind(id)
            .bind(location.lng)
            .bind(location.lat)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn find_within_radius(
        &self,
        lng: f64,
        lat: f64,
        radius_km: f64,
    ) -> Result<Vec<Captain>, RepoError> {
        // Spherical cap test evaluated by Postgres: central angle between
        // the stored point and the query point must not exceed
        // radius / earth radius. $1/$2 follow the GeoJSON axis order
        // (longitude first); the boundary is inclusive.
        let rows = sqlx::query_as::<_, CaptainRow>(&format!(
            r#"
            SELECT {CAPTAIN_COLUMNS}
            FROM captains
            WHERE location_lng IS NOT NULL
              AND location_lat IS NOT NULL
              AND acos(LEAST(1.0, GREATEST(-1.0,
                    sin(radians($2)) * sin(radians(location_lat))
                  + cos(radians($2)) * cos(radians(location_lat))
                  * cos(radians(location_lng) - radians($1))
                  ))) <= $3
            "#
        ))
        .bind(lng)
        .bind(lat)
        .bind(radius_km / EARTH_RADIUS_KM)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Captain::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(status: &str, vehicle_type: &str) -> CaptainRow {
        CaptainRow {
            id: Uuid::new_v4(),
            first_name: "Ravi".into(),
            last_name: "Kumar".into(),
            email: "ravi@example.com".into(),
            password_hash: "hash".into(),
            status: status.into(),
            vehicle_color: "white".into(),
            vehicle_plate: "DL 01 AB 1234".into(),
            vehicle_capacity: 4,
            vehicle_type: vehicle_type.into(),
            location_lng: Some(77.2090),
            location_lat: Some(28.6139),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn row_maps_to_captain() {
        let captain = Captain::try_from(row("inactive", "car")).unwrap();
        assert_eq!(captain.status, CaptainStatus::Inactive);
        assert_eq!(captain.vehicle.vehicle_type, VehicleType::Car);
        let location = captain.location.unwrap();
        assert_eq!(location.lng, 77.2090);
        assert_eq!(location.lat, 28.6139);
    }

    #[test]
    fn row_without_both_coordinates_has_no_location() {
        let mut partial = row("active", "auto");
        partial.location_lat = None;
        let captain = Captain::try_from(partial).unwrap();
        assert!(captain.location.is_none());
    }

    #[test]
    fn unknown_storage_values_are_rejected() {
        assert!(Captain::try_from(row("parked", "car")).is_err());
        assert!(Captain::try_from(row("active", "rickshaw")).is_err());
    }
}
