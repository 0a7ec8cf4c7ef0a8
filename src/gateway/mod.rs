//! HTTP gateway (Axum) exposing scoring and the telemetry dashboard.
//!
//! This module is primarily used by the `committee` server binary.

pub mod error;
pub mod handler;
pub mod state;


use axum::{
    Json, Router,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

pub use error::{ErrorResponse, FailureSummary, GatewayError};
pub use handler::{ScoreRequest, TelemetryQuery, score_handler, telemetry_handler};
pub use state::HandlerState;

/// Response header naming how a request ended (`scored`, `invalid_request`, ...).
pub const COMMITTEE_STATUS_HEADER: &str = "x-committee-status";

pub fn create_router_with_state(state: HandlerState) -> Router {
    Router::new()
        .route("/healthz", get(health_handler))
        .route("/v1/score", post(score_handler))
        .route("/v1/telemetry", get(telemetry_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(serde::Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[tracing::instrument]
pub async fn health_handler() -> Response {
    Json(HealthResponse { status: "ok" }).into_response()
}
