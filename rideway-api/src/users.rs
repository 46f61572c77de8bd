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

use rideway_core::identity::User;
use rideway_core::repository::NewUser;

use crate::error::{internal, AppError};
use crate::middleware::{require_user, AuthToken};
use crate::password;
use crate::state::AppState;
use crate::tokens::{self, ROLE_USER};

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/users/profile", get(profile))
        .route("/users/logout", get(logout))
        .route_layer(from_fn_with_state(state, require_user));

    Router::new()
        .route("/users/register", post(register))
        .route("/users/login", post(login))
        .merge(protected)
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterUserRequest {
    #[validate(length(min = 3, message = "first name must be at least 3 characters"))]
    pub firstname: String,
    #[validate(length(min = 3, message = "last name must be at least 3 characters"))]
    pub lastname: String,
    #[validate(email(message = "invalid email"))]
    pub email: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
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
    pub user: User,
}

/// POST /users/register
async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    payload.validate()?;

    if state
        .users
        .find_by_email(&payload.email)
        .await
        .map_err(internal)?
        .is_some()
    {
        return Err(AppError::ConflictError("user already exists".into()));
    }

    let password_hash = password::hash_password(&payload.password)?;

    let user = state
        .users
        .create(NewUser {
            first_name: payload.firstname,
            last_name: payload.lastname,
            email: payload.email,
            password_hash,
        })
        .await
        .map_err(internal)?;

    let token = tokens::issue(&state.auth, user.id, ROLE_USER)?;
    tracing::info!("Registered user {}", user.id);

    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

/// POST /users/login
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    payload.validate()?;

    let user = state
        .users
        .find_by_email(&payload.email)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::AuthenticationError("invalid email or password".into()))?;

    if !password::verify_password(&payload.password, &user.password_hash)? {
        return Err(AppError::AuthenticationError("invalid email or password".into()));
    }

    let token = tokens::issue(&state.auth, user.id, ROLE_USER)?;
    let jar = jar.add(Cookie::new("token", token.clone()));

    Ok((jar, Json(AuthResponse { token, user })))
}

/// GET /users/profile
async fn profile(Extension(user): Extension<User>) -> Json<User> {
    Json(user)
}

/// GET /users/logout
async fn logout(
    State(state): State<AppState>,
    Extension(AuthToken(token)): Extension<AuthToken>,
    jar: CookieJar,
) -> (CookieJar, Json<serde_json::Value>) {
    // Best effort: a failed blacklist write still logs the client out,
    // the token just stays valid until it expires.
    if let Err(e) = state.redis.blacklist_token(&token, state.auth.expiration).await {
        tracing::warn!("Failed to blacklist token: {}", e);
    }

    let jar = jar.remove(Cookie::from("token"));
    (jar, Json(json!({ "message": "logged out" })))
}
