use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use miette::Diagnostic;
use serde_json::json;
use thiserror::Error;

/// Failure of the backing entity store. Never retried inside the crate.
#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("Database error: {0}")]
    #[diagnostic(code(routekeeper::store::db))]
    Db(#[from] sea_orm::DbErr),

    #[error("Entity store unavailable: {0}")]
    #[diagnostic(code(routekeeper::store::unavailable))]
    Unavailable(String),

    #[error("{entity} `{key}` not found")]
    #[diagnostic(code(routekeeper::store::not_found))]
    NotFound { entity: &'static str, key: String },
}

impl StoreError {
    pub fn status(&self) -> StatusCode {
        match self {
            StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let body = json!({ "error": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}

/// Failures of the command-line entry points.
#[derive(Debug, Error, Diagnostic)]
pub enum KeeperError {
    #[error("Serialization error: {0}")]
    #[diagnostic(code(routekeeper::serde))]
    Serde(#[from] serde_json::Error),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error("{0}")]
    #[diagnostic(code(routekeeper::other))]
    Other(String),
}
