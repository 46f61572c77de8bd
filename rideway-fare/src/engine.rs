use rideway_core::geo::RouteMetrics;
use rideway_core::identity::VehicleType;
use serde::{Deserialize, Serialize};

/// Rates for one vehicle class, in currency minor units (paise).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleRates {
    pub base_minor: i32,
    pub per_km_minor: i32,
    pub per_minute_minor: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FareConfig {
    pub auto: VehicleRates,
    pub car: VehicleRates,
    pub motorcycle: VehicleRates,
}

impl Default for FareConfig {
    fn default() -> Self {
        Self {
            auto: VehicleRates {
                base_minor: 3000,
                per_km_minor: 1000,
                per_minute_minor: 200,
            },
            car: VehicleRates {
                base_minor: 5000,
                per_km_minor: 1500,
                per_minute_minor: 300,
            },
            motorcycle: VehicleRates {
                base_minor: 2000,
                per_km_minor: 800,
                per_minute_minor: 150,
            },
        }
    }
}

impl FareConfig {
    pub fn rates_for(&self, vehicle: VehicleType) -> &VehicleRates {
        match vehicle {
            VehicleType::Auto => &self.auto,
            VehicleType::Car => &self.car,
            VehicleType::Motorcycle => &self.motorcycle,
        }
    }
}

/// One fare per vehicle class over the same route. Riders see all three;
/// ride creation picks the one matching the requested class.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FareQuote {
    pub distance_meters: f64,
    pub duration_seconds: f64,
    pub auto: i32,
    pub car: i32,
    pub motorcycle: i32,
}

impl FareQuote {
    pub fn fare_for(&self, vehicle: VehicleType) -> i32 {
        match vehicle {
            VehicleType::Auto => self.auto,
            VehicleType::Car => self.car,
            VehicleType::Motorcycle => self.motorcycle,
        }
    }
}

/// Deterministic fare computation: base plus distance and time components.
pub struct FareEngine {
    config: FareConfig,
}

impl FareEngine {
    pub fn new(config: FareConfig) -> Self {
        Self { config }
    }

    pub fn quote(&self, metrics: &RouteMetrics) -> FareQuote {
        FareQuote {
            distance_meters: metrics.distance_meters,
            duration_seconds: metrics.duration_seconds,
            auto: self.fare_for(VehicleType::Auto, metrics),
            car: self.fare_for(VehicleType::Car, metrics),
            motorcycle: self.fare_for(VehicleType::Motorcycle, metrics),
        }
    }

    /// base + km * per_km + minutes * per_minute, rounded to the nearest
    /// minor unit.
    pub fn fare_for(&self, vehicle: VehicleType, metrics: &RouteMetrics) -> i32 {
        let rates = self.config.rates_for(vehicle);
        let km = metrics.distance_meters / 1000.0;
        let minutes = metrics.duration_seconds / 60.0;

        let fare = rates.base_minor as f64
            + km * rates.per_km_minor as f64
            + minutes * rates.per_minute_minor as f64;

        fare.round() as i32
    }
}

impl Default for FareEngine {
    fn default() -> Self {
        Self::new(FareConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn car_fare_over_five_km() {
        let engine = FareEngine::default();
        let metrics = RouteMetrics {
            distance_meters: 5000.0,
            duration_seconds: 600.0,
        };

        // 5000 base + 5 km * 1500 + 10 min * 300
        assert_eq!(engine.fare_for(VehicleType::Car, &metrics), 15500);
    }

    #[test]
    fn zero_route_charges_base_only() {
        let engine = FareEngine::default();
        let metrics = RouteMetrics {
            distance_meters: 0.0,
            duration_seconds: 0.0,
        };

        let quote = engine.quote(&metrics);
        assert_eq!(quote.auto, 3000);
        assert_eq!(quote.car, 5000);
        assert_eq!(quote.motorcycle, 2000);
    }

    #[test]
    fn quotes_are_deterministic() {
        let engine = FareEngine::default();
        let metrics = RouteMetrics {
            distance_meters: 7321.0,
            duration_seconds: 913.0,
        };

        let first = engine.quote(&metrics);
        let second = engine.quote(&metrics);
        assert_eq!(first.auto, second.auto);
        assert_eq!(first.car, second.car);
        assert_eq!(first.motorcycle, second.motorcycle);
    }

    #[test]
    fn fractional_components_round_to_minor_units() {
        let engine = FareEngine::default();
        let metrics = RouteMetrics {
            distance_meters: 1234.0,
            duration_seconds: 90.0,
        };

        // 3000 + 1.234 * 1000 + 1.5 * 200 = 4534
        assert_eq!(engine.fare_for(VehicleType::Auto, &metrics), 4534);
    }
}
