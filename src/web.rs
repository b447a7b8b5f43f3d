use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use miette::IntoDiagnostic;

use crate::acl::types::CheckRequest;
use crate::gatekeeper::Gatekeeper;
use crate::routes::mount::mount_table;
use crate::settings::Settings;

pub fn router(keeper: Arc<Gatekeeper>) -> Router {
    Router::new()
        .route("/v1/check", post(handle_check))
        .route("/v1/routes", get(handle_routes))
        .route("/v1/mount", get(handle_mount))
        .route("/v1/reconcile", post(handle_reconcile))
        .route("/v1/invalidate", post(handle_invalidate))
        .route("/healthz", get(health))
        .with_state(keeper)
}

pub async fn serve(settings: &Settings, keeper: Arc<Gatekeeper>) -> miette::Result<()> {
    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .map_err(|e| miette::miette!("bad listen addr: {e}"))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .into_diagnostic()?;
    tracing::info!(%addr, "Access API listening");

    axum::serve(listener, router(keeper))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .into_diagnostic()?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("Shutting down");
}

async fn handle_check(
    State(keeper): State<Arc<Gatekeeper>>,
    Json(req): Json<CheckRequest>,
) -> impl IntoResponse {
    match keeper
        .check_roles(&req.roles, &req.component, &req.resource)
        .await
    {
        Ok(res) => Json(res).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn handle_routes(State(keeper): State<Arc<Gatekeeper>>) -> impl IntoResponse {
    Json(keeper.route_tree())
}

async fn handle_mount(State(keeper): State<Arc<Gatekeeper>>) -> impl IntoResponse {
    Json(mount_table(&keeper.route_tree()))
}

async fn handle_reconcile(State(keeper): State<Arc<Gatekeeper>>) -> impl IntoResponse {
    match keeper.reconcile_now().await {
        Ok(report) if report.is_clean() => Json(report).into_response(),
        Ok(report) => (StatusCode::UNPROCESSABLE_ENTITY, Json(report)).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn handle_invalidate(State(keeper): State<Arc<Gatekeeper>>) -> impl IntoResponse {
    keeper.invalidate().await;
    StatusCode::NO_CONTENT
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
