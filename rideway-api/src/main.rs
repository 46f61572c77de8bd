use std::net::SocketAddr;
use std::sync::Arc;

use rideway_api::{
    app,
    realtime::{dispatcher::Dispatcher, registry::SocketRegistry},
    state::{AppState, AuthConfig},
};
use rideway_fare::FareEngine;
use rideway_geo::{GeoapifyClient, GeoapifyConfig};
use rideway_rides::service::RideService;
use rideway_store::{DbClient, PgCaptainRepository, PgRideRepository, PgUserRepository, RedisClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rideway_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = rideway_store::Config::load().expect("Failed to load config");
    tracing::info!("Starting Rideway API on port {}", config.server.port);

    // Postgres
    let db = DbClient::new(&config.database)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    // Redis
    let redis_client = RedisClient::new(&config.redis.url)
        .await
        .expect("Failed to connect to Redis");
    let redis = Arc::new(redis_client);

    // Geoapify
    let geocoder = Arc::new(
        GeoapifyClient::new(&GeoapifyConfig {
            base_url: config.geocoding.base_url.clone(),
            api_key: config.geocoding.api_key.clone(),
            timeout_seconds: config.geocoding.timeout_seconds,
        })
        .expect("Failed to build geocoding client"),
    );

    let users = Arc::new(PgUserRepository::new(db.pool.clone()));
    let captains = Arc::new(PgCaptainRepository::new(db.pool.clone()));
    let rides = Arc::new(PgRideRepository::new(db.pool.clone()));

    let ride_service = Arc::new(RideService::new(
        rides,
        users.clone(),
        captains.clone(),
        geocoder.clone(),
        FareEngine::new(config.fare.clone()),
        config.dispatch.search_radius_km,
    ));

    let registry = Arc::new(SocketRegistry::new());
    let dispatcher = Arc::new(Dispatcher::new(registry.clone()));

    let app_state = AppState {
        users,
        captains,
        rides: ride_service,
        geocoder,
        redis,
        registry,
        dispatcher,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();
}
