//! REST handlers. Thin translation layer: parse the request, call the
//! engine, map the domain error onto an HTTP status.

pub mod notifications;
pub mod reports;
pub mod staff;
pub mod track;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::warn;

use civicpulse_common::CivicPulseError;

pub(crate) fn error_response(err: CivicPulseError) -> Response {
    match &err {
        CivicPulseError::Validation(_) | CivicPulseError::InvalidCoordinate { .. } => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": err.to_string()})),
        )
            .into_response(),
        CivicPulseError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": err.to_string()})),
        )
            .into_response(),
        CivicPulseError::InvalidTransition { .. } => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({"error": err.to_string()})),
        )
            .into_response(),
        CivicPulseError::LowConfidenceRejection {
            confidence,
            reasoning,
        } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({
                "errorType": "LOW_CONFIDENCE",
                "confidence": confidence,
                "reasoning": reasoning,
            })),
        )
            .into_response(),
        _ => {
            warn!(error = %err, "request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "internal error"})),
            )
                .into_response()
        }
    }
}
