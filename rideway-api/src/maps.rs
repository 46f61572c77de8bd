use axum::{
    extract::{Query, State},
    middleware::from_fn_with_state,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use rideway_core::geo::{Coordinate, RouteMetrics};

use crate::error::AppError;
use crate::middleware::require_user;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/maps/get-coordinates", get(get_coordinates))
        .route("/maps/get-distance-time", get(get_distance_time))
        .route("/maps/get-suggestions", get(get_suggestions))
        .route_layer(from_fn_with_state(state, require_user))
}

#[derive(Debug, Deserialize)]
pub struct CoordinatesQuery {
    pub address: String,
}

#[derive(Debug, Deserialize)]
pub struct RouteQuery {
    pub origin: String,
    pub destination: String,
}

#[derive(Debug, Deserialize)]
pub struct SuggestionsQuery {
    pub input: String,
}

/// GET /maps/get-coordinates?address=
async fn get_coordinates(
    State(state): State<AppState>,
    Query(query): Query<CoordinatesQuery>,
) -> Result<Json<Coordinate>, AppError> {
    let point = state.geocoder.coordinates_of(&query.address).await?;
    Ok(Json(point))
}

/// GET /maps/get-distance-time?origin=&destination=
async fn get_distance_time(
    State(state): State<AppState>,
    Query(query): Query<RouteQuery>,
) -> Result<Json<RouteMetrics>, AppError> {
    let metrics = state
        .geocoder
        .route_metrics(&query.origin, &query.destination)
        .await?;
    Ok(Json(metrics))
}

/// GET /maps/get-suggestions?input=
async fn get_suggestions(
    State(state): State<AppState>,
    Query(query): Query<SuggestionsQuery>,
) -> Result<Json<Vec<String>>, AppError> {
    let suggestions = state.geocoder.suggestions_for(&query.input).await?;
    Ok(Json(suggestions))
}
