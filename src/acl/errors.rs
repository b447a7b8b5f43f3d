use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use miette::Diagnostic;
use serde_json::json;
use thiserror::Error;

use crate::errors::StoreError;

#[derive(Debug, Error, Diagnostic)]
pub enum AclError {
    #[error("Role `{0}` not found")]
    #[diagnostic(
        code(routekeeper::acl::role_not_found),
        help("Seed the role (set access.seed_roles = true) or create it in the roles table")
    )]
    RoleNotFound(String),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for AclError {
    fn into_response(self) -> Response {
        let status = match &self {
            AclError::RoleNotFound(_) => StatusCode::FORBIDDEN,
            AclError::Store(e) => e.status(),
        };
        let body = json!({ "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}
