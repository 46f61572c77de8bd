use async_trait::async_trait;
use uuid::Uuid;

use crate::geo::Coordinate;
use crate::identity::{Captain, User, Vehicle};

pub type RepoError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewCaptain {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub vehicle: Vehicle,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: NewUser) -> Result<User, RepoError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError>;
}

#[async_trait]
pub trait CaptainRepository: Send + Sync {
    async fn create(&self, captain: NewCaptain) -> Result<Captain, RepoError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Captain>, RepoError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Captain>, RepoError>;

    /// Overwrite the captain's last known position.
    async fn update_location(&self, id: Uuid, location: Coordinate) -> Result<(), RepoError>;

    /// Captains whose stored position lies within `radius_km` of the query
    /// point, boundary inclusive. Parameters follow the GeoJSON axis order:
    /// longitude first. Captains without a position never match.
    async fn find_within_radius(
        &self,
        lng: f64,
        lat: f64,
        radius_km: f64,
    ) -> Result<Vec<Captain>, RepoError>;
}
