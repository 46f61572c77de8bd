use axum::{
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use rideway_core::identity::{Captain, Vehicle, VehicleType};
use rideway_core::repository::NewCaptain;

use crate::error::{internal, AppError};
use crate::middleware::{require_captain, AuthToken};
use crate::password;
use crate::state::AppState;
use crate::tokens::{self, ROLE_CAPTAIN};

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/captains/profile", get(profile))
        .route("/captains/logout", get(logout))
        .route_layer(from_fn_with_state(state, require_captain));

    Router::new()
        .route("/captains/register", post(register))
        .route("/captains/login", post(login))
        .merge(protected)
}

#[derive(Debug, Deserialize, Validate)]
pub struct VehicleRequest {
    #[validate(length(min = 3, message = "vehicle color must be at least 3 characters"))]
    pub color: String,
    #[validate(length(min = 3, message = "plate must be at least 3 characters"))]
    pub plate: String,
    #[validate(range(min = 1, message = "capacity must be at least 1"))]
    pub capacity: i32,
    #[serde(rename = "vehicleType")]
    pub vehicle_type: VehicleType,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterCaptainRequest {
    #[validate(length(min = 3, message = "first name must be at least 3 characters"))]
    pub firstname: String,
    #[validate(length(min = 3, message = "last name must be at least 3 characters"))]
    pub lastname: String,
    #[validate(email(message = "invalid email"))]
    pub email: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
    #[validate(nested)]
    pub vehicle: VehicleRequest,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "invalid email"))]
    pub email: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub captain: Captain,
}

/// POST /captains/register
async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterCaptainRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    payload.validate()?;

    if state
        .captains
        .find_by_email(&payload.email)
        .await
        .map_err(internal)?
        .is_some()
    {
        return Err(AppError::ConflictError("captain already exists".into()));
    }

    let password_hash = password::hash_password(&payload.password)?;

    let captain = state
        .captains
        .create(NewCaptain {
            first_name: payload.firstname,
            last_name: payload.lastname,
            email: payload.email,
            password_hash,
            vehicle: Vehicle {
                color: payload.vehicle.color,
                plate: payload.vehicle.plate,
                capacity: payload.vehicle.capacity,
                vehicle_type: payload.vehicle.vehicle_type,
            },
        })
        .await
        .map_err(internal)?;

    let token = tokens::issue(&state.auth, captain.id, ROLE_CAPTAIN)?;
    tracing::info!("Registered captain {}", captain.id);

    Ok((StatusCode::CREATED, Json(AuthResponse { token, captain })))
}

/// POST /captains/login
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    payload.validate()?;

    let captain = state
        .captains
        .find_by_email(&payload.email)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::AuthenticationError("invalid email or password".into()))?;

    if !password::verify_password(&payload.password, &captain.password_hash)? {
        return Err(AppError::AuthenticationError("invalid email or password".into()));
    }

    let token = tokens::issue(&state.auth, captain.id, ROLE_CAPTAIN)?;
    let jar = jar.add(Cookie::new("token", token.clone()));

    Ok((jar, Json(AuthResponse { token, captain })))
}

/// GET /captains/profile
async fn profile(Extension(captain): Extension<Captain>) -> Json<Captain> {
    Json(captain)
}

/// GET /captains/logout
async fn logout(
    State(state): State<AppState>,
    Extension(AuthToken(token)): Extension<AuthToken>,
    jar: CookieJar,
) -> (CookieJar, Json<serde_json::Value>) {
    if let Err(e) = state.redis.blacklist_token(&token, state.auth.expiration).await {
        tracing::warn!("Failed to blacklist token: {}", e);
    }

    let jar = jar.remove(Cookie::from("token"));
    (jar, Json(json!({ "message": "logged out" })))
}
