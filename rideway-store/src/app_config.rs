use serde::Deserialize;
use std::env;

/// Process configuration, layered from `config/*.toml` and `RIDEWAY_` env vars.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub auth: AuthConfig,
    pub geocoding: GeocodingConfig,
    pub dispatch: DispatchConfig,
    pub fare: rideway_fare::FareConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_pool_size")]
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Token lifetime; doubles as the blacklist TTL on logout.
    pub jwt_expiration_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeocodingConfig {
    pub base_url: String,
    pub api_key: String,
    /// Per-request cap on the upstream geocoder; expiry is an upstream failure.
    #[serde(default = "default_geocode_timeout")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DispatchConfig {
    /// Captain search radius around the pickup point, in kilometres.
    #[serde(default = "default_search_radius")]
    pub search_radius_km: f64,
}

fn default_pool_size() -> u32 {
    5
}

fn default_geocode_timeout() -> u64 {
    10
}

fn default_search_radius() -> f64 {
    2.0
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let settings = config::Config::builder()
            // config/default.toml carries every committed setting
            .add_source(config::File::with_name("config/default"))
            // per-environment overrides, config/<RUN_MODE>.toml, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // config/local.toml for untracked developer overrides
            .add_source(config::File::with_name("config/local").required(false))
            // RIDEWAY_SERVER__PORT=8080 overrides server.port, and so on
            .add_source(config::Environment::with_prefix("RIDEWAY").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}
