use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod captains;
pub mod error;
pub mod maps;
pub mod middleware;
pub mod password;
pub mod realtime;
pub mod rides;
pub mod state;
pub mod tokens;
pub mod users;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    Router::new()
        .route("/", get(root))
        .merge(users::routes(state.clone()))
        .merge(captains::routes(state.clone()))
        .merge(maps::routes(state.clone()))
        .merge(rides::routes(state.clone()))
        .merge(realtime::routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn_with_state(state.clone(), rate_limit_middleware))
        .with_state(state)
}

async fn root() -> &'static str {
    "rideway api"
}

async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    // In-process requests carry no peer address; only served connections
    // are limited.
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);
    let Some(addr) = peer else {
        return next.run(req).await;
    };

    let key = format!("ratelimit:{}", addr.ip());
    match state.redis.check_rate_limit(&key, 100, 60).await {
        Ok(false) => (StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded").into_response(),
        // Fail open: a degraded Redis must not take the API down with it.
        _ => next.run(req).await,
    }
}
