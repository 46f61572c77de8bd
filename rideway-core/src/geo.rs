use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometres, shared by every spherical calculation.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A point on the globe. Fields are named so the GeoJSON longitude-first
/// convention can never be confused with latitude-first APIs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Driving distance and time between two points, as reported by the
/// routing provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteMetrics {
    pub distance_meters: f64,
    pub duration_seconds: f64,
}

/// Central angle between two points, in radians (haversine form).
pub fn central_angle(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);

    2.0 * h.sqrt().min(1.0).asin()
}

/// Great-circle distance in kilometres.
pub fn distance_km(a: &Coordinate, b: &Coordinate) -> f64 {
    central_angle(a, b) * EARTH_RADIUS_KM
}

#[derive(Debug, thiserror::Error)]
pub enum GeoError {
    #[error("no results for {0}")]
    NotFound(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("upstream geocoding failure: {0}")]
    Upstream(String),
}

/// Seam to the external geocoding/routing provider.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolve a free-form address to a point.
    async fn coordinates_of(&self, address: &str) -> Result<Coordinate, GeoError>;

    /// Driving distance and time between two addresses.
    async fn route_metrics(&self, origin: &str, destination: &str)
        -> Result<RouteMetrics, GeoError>;

    /// Address completions for a partial input.
    async fn suggestions_for(&self, partial: &str) -> Result<Vec<String>, GeoError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_to_self_is_zero() {
        let point = Coordinate::new(28.6139, 77.2090);
        assert_eq!(distance_km(&point, &point), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Coordinate::new(28.6139, 77.2090);
        let b = Coordinate::new(19.0760, 72.8777);
        assert!((distance_km(&a, &b) - distance_km(&b, &a)).abs() < 1e-9);
    }

    #[test]
    fn one_degree_of_longitude_at_equator() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(0.0, 1.0);
        // 2 * pi * 6371 / 360
        assert!((distance_km(&a, &b) - 111.195).abs() < 0.01);
    }

    #[test]
    fn coordinate_bounds() {
        assert!(Coordinate::new(90.0, 180.0).is_valid());
        assert!(Coordinate::new(-90.0, -180.0).is_valid());
        assert!(!Coordinate::new(90.1, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, 180.5).is_valid());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
    }
}
