use std::sync::Arc;

use rideway_core::geo::Geocoder;
use rideway_core::repository::{CaptainRepository, UserRepository};
use rideway_rides::service::RideService;
use rideway_store::RedisClient;

use crate::realtime::{Dispatcher, SocketRegistry};

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub captains: Arc<dyn CaptainRepository>,
    pub rides: Arc<RideService>,
    pub geocoder: Arc<dyn Geocoder>,
    pub redis: Arc<RedisClient>,
    pub registry: Arc<SocketRegistry>,
    pub dispatcher: Arc<Dispatcher>,
    pub auth: AuthConfig,
}
