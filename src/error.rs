use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::external::FetchError;
use crate::store::StoreError;

/// Errors surfaced at the service boundary. Raw sqlx/reqwest errors never cross it.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("product not found: {0}")]
    ProductNotFound(String),
    #[error("external food source failed: {0}")]
    ExternalFetch(String),
    #[error("food entry not found")]
    NotFoundOrForbidden,
    #[error("persistence failed: {0}")]
    Persistence(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::ProductNotFound(_) | AppError::NotFoundOrForbidden => StatusCode::NOT_FOUND,
            AppError::ExternalFetch(_) => StatusCode::BAD_GATEWAY,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Persistence(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        // storage details stay in the logs
        let message = match &self {
            AppError::Persistence(_) => "internal storage error".to_string(),
            other => other.to_string(),
        };
        let body = Json(serde_json::json!({ "error": message }));
        if status == StatusCode::UNAUTHORIZED {
            return (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response();
        }
        (status, body).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Persistence(err.to_string())
    }
}

// Malformed request input is a client error, reported in the usual error shape.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        AppError::ExternalFetch(err.to_string())
    }
}
