use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json},
};
use serde::Deserialize;

use crate::rest::error_response;
use crate::AppState;

/// `GET /track/{report_id}`. The public tracker page behind notification
/// links; looks a report up by id alone.
pub async fn track_report(
    State(state): State<Arc<AppState>>,
    Path(report_id): Path<String>,
) -> impl IntoResponse {
    match state.intake.track(&report_id).await {
        Ok((_, report)) => {
            let display = report.status.display_status();
            let mut body = serde_json::to_value(&report).unwrap_or_default();
            if let Some(obj) = body.as_object_mut() {
                obj.insert("displayStatus".to_string(), display.into());
            }
            Json(body).into_response()
        }
        Err(e) => error_response(e),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmRequest {
    pub task_id: String,
}

/// `POST /track/confirm`: the reporter accepts the staff proof.
pub async fn confirm_resolution(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ConfirmRequest>,
) -> impl IntoResponse {
    match state.coordinator.confirm_resolution(&body.task_id).await {
        Ok(()) => Json(serde_json::json!({"status": "RESOLVED"})).into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectRequest {
    pub task_id: String,
    #[serde(default)]
    pub reason: String,
}

/// `POST /track/reject`: the reporter sends the task back with a reason.
pub async fn reject_resolution(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RejectRequest>,
) -> impl IntoResponse {
    match state
        .coordinator
        .reject_resolution(&body.task_id, &body.reason)
        .await
    {
        Ok(()) => Json(serde_json::json!({"status": "REJECTED"})).into_response(),
        Err(e) => error_response(e),
    }
}
