use std::time::Duration;

use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::COMMITTEE_STATUS_HEADER;
use super::error::GatewayError;
use super::state::HandlerState;
use crate::model::{Attempt, CommitteeConfig, Rubric};

/// Body of `POST /v1/score`.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoreRequest {
    pub attempt: Attempt,
    pub committee: CommitteeConfig,
    /// Inline rubric. Resolved through the rubric source when absent.
    #[serde(default)]
    pub rubric: Option<Rubric>,
}

#[instrument(
    skip(state, request),
    fields(request_id = %Uuid::new_v4(), attempt_id = tracing::field::Empty)
)]
pub async fn score_handler(
    State(state): State<HandlerState>,
    Json(request): Json<serde_json::Value>,
) -> Result<Response, GatewayError> {
    let request: ScoreRequest = serde_json::from_value(request)
        .map_err(|e| GatewayError::InvalidRequest(format!("Invalid request schema: {}", e)))?;
    tracing::Span::current().record("attempt_id", tracing::field::display(&request.attempt.id));

    let attempt = &request.attempt;
    let rubric = match request.rubric {
        Some(rubric) => rubric,
        None => {
            debug!(provider = %attempt.provider, level = %attempt.level, "resolving rubric");
            state
                .rubrics
                .get_rubric(&attempt.provider, &attempt.level, attempt.task_type)
                .await?
        }
    };

    let outcome = state
        .engine
        .score(attempt, &rubric, &request.committee)
        .await?;

    let mut headers = HeaderMap::new();
    headers.insert(COMMITTEE_STATUS_HEADER, HeaderValue::from_static("scored"));
    Ok((headers, Json(outcome)).into_response())
}

/// Query of `GET /v1/telemetry`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TelemetryQuery {
    /// Only include measurements from the last `window_secs` seconds.
    pub window_secs: Option<u64>,
}

#[instrument(skip(state))]
pub async fn telemetry_handler(
    State(state): State<HandlerState>,
    Query(query): Query<TelemetryQuery>,
) -> Response {
    let window = query.window_secs.map(Duration::from_secs);
    Json(state.engine.recorder().dashboard(window)).into_response()
}
