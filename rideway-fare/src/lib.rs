pub mod engine;

pub use engine::{FareConfig, FareEngine, FareQuote, VehicleRates};
