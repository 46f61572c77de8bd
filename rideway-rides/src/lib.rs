pub mod model;
pub mod notification;
pub mod repository;
pub mod service;

pub use model::{Ride, RideStatus};
pub use notification::{Notification, Party, PartyRole, RideEvent};
pub use repository::{NewRide, RideRepository};
pub use service::{RideError, RideService};
