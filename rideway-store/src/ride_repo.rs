use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use rideway_core::identity::VehicleType;
use rideway_rides::model::{Ride, RideStatus};
use rideway_rides::repository::{NewRide, RepoError, RideRepository};

pub struct PgRideRepository {
    pool: PgPool,
}

impl PgRideRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const RIDE_COLUMNS: &str = "id, user_id, captain_id, pickup, destination, vehicle_type, \
     fare_minor, status, otp, distance_meters, duration_seconds, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct RideRow {
    id: Uuid,
    user_id: Uuid,
    captain_id: Option<Uuid>,
    pickup: String,
    destination: String,
    vehicle_type: String,
    fare_minor: i32,
    status: String,
    otp: String,
    distance_meters: i32,
    duration_seconds: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RideRow> for Ride {
    type Error = RepoError;

    fn try_from(row: RideRow) -> Result<Self, Self::Error> {
        Ok(Ride {
            id: row.id,
            user_id: row.user_id,
            captain_id: row.captain_id,
            pickup: row.pickup,
            destination: row.destination,
            vehicle_type: row.vehicle_type.parse::<VehicleType>()?,
            fare_minor: row.fare_minor,
            status: row.status.parse::<RideStatus>()?,
            otp: row.otp,
            distance_meters: row.distance_meters,
            duration_seconds: row.duration_seconds,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl RideRepository for PgRideRepository {
    async fn create(&self, ride: NewRide) -> Result<Ride, RepoError> {
        let row = sqlx::query_as::<_, RideRow>(
            r#"
            INSERT INTO rides (id, user_id, pickup, destination, vehicle_type,
                               fare_minor, otp, distance_meters, duration_seconds)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, user_id, captain_id, pickup, destination, vehicle_type,
                      fare_minor, status, otp, distance_meters, duration_seconds,
                      created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(ride.user_id)
        .bind(&ride.pickup)
        .bind(&ride.destination)
        .bind(ride.vehicle_type.as_str())
        .bind(ride.fare_minor)
        .bind(&ride.otp)
        .bind(ride.distance_meters)
        .bind(ride.duration_seconds)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Ride>, RepoError> {
        let row = sqlx::query_as::<_, RideRow>(&format!(
            "SELECT {RIDE_COLUMNS} FROM rides WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Ride::try_from).transpose()
    }

    async fn assign_captain(
        &self,
        ride_id: Uuid,
        captain_id: Uuid,
    ) -> Result<Option<Ride>, RepoError> {
        // Conditional update: exactly one concurrent caller can match the
        // `requested`, unbound row.
        let row = sqlx::query_as::<_, RideRow>(&format!(
            r#"
            UPDATE rides
            SET captain_id = $2, status = 'accepted', updated_at = NOW()
            WHERE id = $1 AND status = 'requested' AND captain_id IS NULL
            RETURNING {RIDE_COLUMNS}
            "#
        ))
        .bind(ride_id)
        .bind(captain_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Ride::try_from).transpose()
    }

    async fn transition(
        &self,
        ride_id: Uuid,
        captain_id: Uuid,
        from: RideStatus,
        to: RideStatus,
    ) -> Result<Option<Ride>, RepoError> {
        let row = sqlx::query_as::<_, RideRow>(&format!(
            r#"
            UPDATE rides
            SET status = $4, updated_at = NOW()
            WHERE id = $1 AND captain_id = $2 AND status = $3
            RETURNING {RIDE_COLUMNS}
            "#
        ))
        .bind(ride_id)
        .bind(captain_id)
        .bind(from.as_str())
        .bind(to.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Ride::try_from).transpose()
    }

    async fn cancel_by_user(
        &self,
        ride_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Ride>, RepoError> {
        let row = sqlx::query_as::<_, RideRow>(&format!(
            r#"
            UPDATE rides
            SET status = 'cancelled', updated_at = NOW()
            WHERE id = $1 AND user_id = $2 AND status IN ('requested', 'accepted')
            RETURNING {RIDE_COLUMNS}
            "#
        ))
        .bind(ride_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Ride::try_from).transpose()
    }

    async fn active_for_captain(&self, captain_id: Uuid) -> Result<Option<Ride>, RepoError> {
        let row = sqlx::query_as::<_, RideRow>(&format!(
            r#"
            SELECT {RIDE_COLUMNS}
            FROM rides
            WHERE captain_id = $1 AND status IN ('accepted', 'ongoing')
            ORDER BY updated_at DESC
            LIMIT 1
            "#
        ))
        .bind(captain_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Ride::try_from).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(status: &str, vehicle_type: &str) -> RideRow {
        let now = Utc::now();
        RideRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            captain_id: None,
            pickup: "123 Main St".into(),
            destination: "456 Oak Ave".into(),
            vehicle_type: vehicle_type.into(),
            fare_minor: 15500,
            status: status.into(),
            otp: "482913".into(),
            distance_meters: 5000,
            duration_seconds: 600,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn row_maps_to_ride() {
        let ride = Ride::try_from(row("requested", "car")).unwrap();
        assert_eq!(ride.status, RideStatus::Requested);
        assert_eq!(ride.vehicle_type, VehicleType::Car);
        assert_eq!(ride.otp, "482913");
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(Ride::try_from(row("boarding", "car")).is_err());
    }
}
