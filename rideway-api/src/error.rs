use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use rideway_core::geo::GeoError;
use rideway_rides::service::RideError;

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    AuthorizationError(String),
    ValidationError(String),
    FieldValidation(validator::ValidationErrors),
    NotFoundError(String),
    ConflictError(String),
    UpstreamError(String),
    InternalServerError(String),
    Anyhow(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, json!({ "error": msg })),
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, json!({ "error": msg })),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::FieldValidation(errors) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "validation failed", "fields": errors }),
            ),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, json!({ "error": msg })),
            AppError::UpstreamError(msg) => {
                tracing::warn!("Upstream failure: {}", msg);
                (StatusCode::BAD_GATEWAY, json!({ "error": "upstream service failure" }))
            }
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "Internal Server Error" }))
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "Internal Server Error" }))
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Anyhow(err)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::FieldValidation(errors)
    }
}

impl From<GeoError> for AppError {
    fn from(err: GeoError) -> Self {
        match err {
            GeoError::NotFound(what) => AppError::NotFoundError(format!("no results for {}", what)),
            GeoError::InvalidArgument(msg) => AppError::ValidationError(msg),
            GeoError::Upstream(msg) => AppError::UpstreamError(msg),
        }
    }
}

impl From<RideError> for AppError {
    fn from(err: RideError) -> Self {
        match err {
            RideError::NotFound => AppError::NotFoundError("ride not found".into()),
            RideError::InvalidState => {
                AppError::ConflictError("ride is not in a state that allows this".into())
            }
            RideError::Unauthorized => {
                AppError::AuthenticationError("not authorized for this ride".into())
            }
            RideError::Geo(e) => e.into(),
            RideError::Repo(msg) => AppError::InternalServerError(msg),
        }
    }
}

/// For repository and other infrastructure errors with no HTTP meaning of
/// their own.
pub(crate) fn internal<E: std::fmt::Display>(err: E) -> AppError {
    AppError::InternalServerError(err.to_string())
}
