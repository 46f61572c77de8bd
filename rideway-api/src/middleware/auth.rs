use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;
use crate::tokens::{self, Claims, ROLE_CAPTAIN, ROLE_USER};

/// The raw bearer token, kept around so logout can blacklist it.
#[derive(Clone)]
pub struct AuthToken(pub String);

fn bearer_or_cookie_token(headers: &HeaderMap) -> Option<String> {
    let from_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.to_string());

    if from_header.is_some() {
        return from_header;
    }

    CookieJar::from_headers(headers)
        .get("token")
        .map(|cookie| cookie.value().to_string())
}

// `&Request` can't cross this future's awaits (axum's Body is not `Sync`),
// so the middleware must be `Send`-safe by borrowing only the headers.
async fn authenticate(
    state: &AppState,
    headers: &HeaderMap,
    expected_role: &str,
) -> Result<(Claims, String), AppError> {
    let token = bearer_or_cookie_token(headers)
        .ok_or_else(|| AppError::AuthenticationError("missing token".into()))?;

    // Blacklist read errors fail open: a degraded Redis must not lock
    // everyone out.
    match state.redis.is_token_blacklisted(&token).await {
        Ok(true) => return Err(AppError::AuthenticationError("token revoked".into())),
        Ok(false) => {}
        Err(e) => tracing::warn!("Blacklist lookup failed: {}", e),
    }

    let claims = tokens::verify(&state.auth, &token)?;

    if claims.role != expected_role {
        return Err(AppError::AuthenticationError("wrong role for this route".into()));
    }

    Ok((claims, token))
}

pub async fn require_user(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (claims, token) = authenticate(&state, req.headers(), ROLE_USER).await?;

    let id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::AuthenticationError("invalid token".into()))?;

    let user = state
        .users
        .find_by_id(id)
        .await
        .map_err(crate::error::internal)?
        .ok_or_else(|| AppError::AuthenticationError("unknown user".into()))?;

    req.extensions_mut().insert(user);
    req.extensions_mut().insert(AuthToken(token));

    Ok(next.run(req).await)
}

pub async fn require_captain(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (claims, token) = authenticate(&state, req.headers(), ROLE_CAPTAIN).await?;

    let id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::AuthenticationError("invalid token".into()))?;

    let captain = state
        .captains
        .find_by_id(id)
        .await
        .map_err(crate::error::internal)?
        .ok_or_else(|| AppError::AuthenticationError("unknown captain".into()))?;

    req.extensions_mut().insert(captain);
    req.extensions_mut().insert(AuthToken(token));

    Ok(next.run(req).await)
}
