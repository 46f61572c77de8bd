use axum::{
    extract::{Query, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use rideway_core::identity::{Captain, User, VehicleType};
use rideway_fare::FareQuote;
use rideway_rides::model::Ride;

use crate::error::AppError;
use crate::middleware::{require_captain, require_user};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let user_routes = Router::new()
        .route("/rides/create", post(create_ride))
        .route("/rides/get-fare", get(get_fare))
        .route("/rides/cancel", post(cancel_ride))
        .route_layer(from_fn_with_state(state.clone(), require_user));

    let captain_routes = Router::new()
        .route("/rides/confirm", post(confirm_ride))
        .route("/rides/start-ride", get(start_ride))
        .route("/rides/end-ride", post(end_ride))
        .route_layer(from_fn_with_state(state, require_captain));

    user_routes.merge(captain_routes)
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRideRequest {
    #[validate(length(min = 3, message = "pickup must be at least 3 characters"))]
    pub pickup: String,
    #[validate(length(min = 3, message = "destination must be at least 3 characters"))]
    pub destination: String,
    #[serde(rename = "vehicleType")]
    pub vehicle_type: VehicleType,
}

/// The one response that carries the OTP: the rider needs it to hand to
/// the captain at pickup.
#[derive(Debug, Serialize)]
pub struct CreatedRideResponse {
    #[serde(flatten)]
    pub ride: Ride,
    pub otp: String,
}

#[derive(Debug, Deserialize)]
pub struct FareQueryParams {
    pub pickup: String,
    pub destination: String,
}

#[derive(Debug, Deserialize)]
pub struct RideIdRequest {
    #[serde(rename = "rideId")]
    pub ride_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct StartRideQuery {
    #[serde(rename = "rideId")]
    pub ride_id: Uuid,
    pub otp: String,
}

/// POST /rides/create
async fn create_ride(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<CreateRideRequest>,
) -> Result<(StatusCode, Json<CreatedRideResponse>), AppError> {
    payload.validate()?;

    let ride = state
        .rides
        .create(user.id, payload.pickup, payload.destination, payload.vehicle_type)
        .await?;

    let response = CreatedRideResponse {
        otp: ride.otp.clone(),
        ride: ride.clone(),
    };

    // Dispatch happens after the response is on its way; failures here are
    // logged, never surfaced to the rider.
    let dispatch_state = state.clone();
    tokio::spawn(async move {
        match dispatch_state.rides.dispatch_nearby(&ride).await {
            Ok(offers) => dispatch_state.dispatcher.deliver_all(offers),
            Err(e) => tracing::error!(ride_id = %ride.id, "dispatch failed: {}", e),
        }
    });

    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /rides/get-fare?pickup=&destination=
async fn get_fare(
    State(state): State<AppState>,
    Query(query): Query<FareQueryParams>,
) -> Result<Json<FareQuote>, AppError> {
    let quote = state.rides.quote(&query.pickup, &query.destination).await?;
    Ok(Json(quote))
}

/// POST /rides/confirm
async fn confirm_ride(
    State(state): State<AppState>,
    Extension(captain): Extension<Captain>,
    Json(payload): Json<RideIdRequest>,
) -> Result<Json<Ride>, AppError> {
    let (ride, note) = state.rides.confirm(payload.ride_id, &captain).await?;
    state.dispatcher.deliver(note);
    Ok(Json(ride))
}

/// GET /rides/start-ride?rideId=&otp=
async fn start_ride(
    State(state): State<AppState>,
    Extension(captain): Extension<Captain>,
    Query(query): Query<StartRideQuery>,
) -> Result<Json<Ride>, AppError> {
    let (ride, note) = state.rides.start(query.ride_id, &query.otp, &captain).await?;
    state.dispatcher.deliver(note);
    Ok(Json(ride))
}

/// POST /rides/end-ride
async fn end_ride(
    State(state): State<AppState>,
    Extension(captain): Extension<Captain>,
    Json(payload): Json<RideIdRequest>,
) -> Result<Json<Ride>, AppError> {
    let (ride, note) = state.rides.end(payload.ride_id, &captain).await?;
    state.dispatcher.deliver(note);
    Ok(Json(ride))
}

/// POST /rides/cancel
async fn cancel_ride(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<RideIdRequest>,
) -> Result<Json<Ride>, AppError> {
    let (ride, note) = state.rides.cancel(payload.ride_id, user.id).await?;
    if let Some(note) = note {
        state.dispatcher.deliver(note);
    }
    Ok(Json(ride))
}
