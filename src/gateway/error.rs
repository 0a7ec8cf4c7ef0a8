use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use super::COMMITTEE_STATUS_HEADER;
use crate::pipeline::{PipelineError, ScorerFailure};
use crate::rubric::RubricError;

/// Client-facing view of one failed committee member.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureSummary {
    pub index: usize,
    pub model: String,
    pub provider: String,
    pub kind: &'static str,
    pub message: String,
}

impl From<&ScorerFailure> for FailureSummary {
    fn from(failure: &ScorerFailure) -> Self {
        Self {
            index: failure.index,
            model: failure.model.clone(),
            provider: failure.provider.clone(),
            kind: failure.error.kind(),
            message: failure.error.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unsupported task: {0}")]
    UnsupportedTask(String),

    #[error("rubric not found: {0}")]
    RubricNotFound(String),

    #[error("rubric source failed: {0}")]
    RubricUnavailable(String),

    #[error("all scorers failed")]
    ScorersUnavailable { failures: Vec<FailureSummary> },

    #[error("internal error: {0}")]
    InternalError(String),
}

impl From<PipelineError> for GatewayError {
    fn from(error: PipelineError) -> Self {
        match error {
            PipelineError::InvalidPayload { reason } => GatewayError::InvalidRequest(reason),
            e @ PipelineError::UnsupportedTask { .. } => GatewayError::UnsupportedTask(e.to_string()),
            PipelineError::AllScorersFailed { failures } => GatewayError::ScorersUnavailable {
                failures: failures.iter().map(FailureSummary::from).collect(),
            },
            e @ PipelineError::Consensus(_) => GatewayError::InternalError(e.to_string()),
        }
    }
}

impl From<RubricError> for GatewayError {
    fn from(error: RubricError) -> Self {
        if error.is_not_found() {
            GatewayError::RubricNotFound(error.to_string())
        } else {
            GatewayError::RubricUnavailable(error.to_string())
        }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FailureSummary>,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, committee_status) = match &self {
            GatewayError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            GatewayError::UnsupportedTask(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "unsupported_task")
            }
            GatewayError::RubricNotFound(_) => (StatusCode::NOT_FOUND, "rubric_not_found"),
            GatewayError::RubricUnavailable(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "rubric_error")
            }
            GatewayError::ScorersUnavailable { .. } => {
                (StatusCode::BAD_GATEWAY, "all_scorers_failed")
            }
            GatewayError::InternalError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };

        let mut headers = HeaderMap::new();
        headers.insert(
            COMMITTEE_STATUS_HEADER,
            HeaderValue::from_static(committee_status),
        );

        let error = self.to_string();
        let failures = match self {
            GatewayError::ScorersUnavailable { failures } => failures,
            _ => Vec::new(),
        };

        let body = Json(ErrorResponse {
            error,
            code: status.as_u16(),
            failures,
        });

        (status, headers, body).into_response()
    }
}
