pub mod geo;
pub mod identity;
pub mod repository;

pub use geo::{Coordinate, GeoError, Geocoder, RouteMetrics};
pub use identity::{Captain, CaptainStatus, User, Vehicle, VehicleType};
pub use repository::{CaptainRepository, NewCaptain, NewUser, RepoError, UserRepository};
