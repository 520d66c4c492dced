use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use civicpulse_common::{Category, ReportKey, TaskPriority};
use civicpulse_engine::TaskMeta;

use crate::rest::error_response;
use crate::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    pub category: Category,
    pub geohash: String,
    pub reporter_id: String,
    pub report_id: String,
    pub staff_id: String,
    pub assigned_by: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: TaskPriority,
    pub deadline: Option<DateTime<Utc>>,
}

/// `POST /staff/tasks/assign`
pub async fn assign_task(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AssignRequest>,
) -> impl IntoResponse {
    let key = ReportKey {
        category: body.category,
        geohash: body.geohash,
        reporter_id: body.reporter_id,
        report_id: body.report_id,
    };
    let meta = TaskMeta {
        title: body.title,
        description: body.description,
        priority: body.priority,
        deadline: body.deadline,
    };

    match state
        .coordinator
        .assign_task(&key, &body.staff_id, &body.assigned_by, meta)
        .await
    {
        Ok(task) => (
            StatusCode::CREATED,
            Json(serde_json::json!({"taskId": task.id})),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRequest {
    pub task_id: String,
}

/// `POST /staff/tasks/start`
pub async fn start_task(
    State(state): State<Arc<AppState>>,
    Json(body): Json<StartRequest>,
) -> impl IntoResponse {
    match state.coordinator.start_task(&body.task_id).await {
        Ok(()) => Json(serde_json::json!({"status": "IN_PROGRESS"})).into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRequest {
    pub task_id: String,
    pub proof_image_url: String,
    /// When set, the confidence oracle compares the proof against the
    /// original report photo and gates the resolution on the result.
    #[serde(default)]
    pub ai_verification: bool,
}

/// `POST /staff/tasks/resolve`. Without the verification flag the proof
/// goes to the reporter for manual confirmation; with it, a confident
/// oracle verdict resolves the report directly.
pub async fn resolve_task(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ResolveRequest>,
) -> impl IntoResponse {
    if body.ai_verification {
        match state
            .coordinator
            .resolve_with_verification(&body.task_id, &body.proof_image_url)
            .await
        {
            Ok(result) => Json(serde_json::json!({
                "status": "RESOLVED",
                "verified": true,
                "confidence": result.confidence,
                "reasoning": result.reasoning,
            }))
            .into_response(),
            Err(e) => error_response(e),
        }
    } else {
        match state
            .coordinator
            .resolve_task(&body.task_id, &body.proof_image_url)
            .await
        {
            Ok(()) => Json(serde_json::json!({"status": "WAITING_APPROVAL"})).into_response(),
            Err(e) => error_response(e),
        }
    }
}

/// `GET /staff/tasks/{staff_id}`: tasks currently on the staff member's
/// plate (PENDING or IN_PROGRESS).
pub async fn active_tasks(
    State(state): State<Arc<AppState>>,
    Path(staff_id): Path<String>,
) -> impl IntoResponse {
    match state.coordinator.active_tasks(&staff_id).await {
        Ok(tasks) => Json(serde_json::json!({"tasks": tasks})).into_response(),
        Err(e) => error_response(e),
    }
}

/// `GET /staff/tasks/{staff_id}/history`: closed-out tasks.
pub async fn past_tasks(
    State(state): State<Arc<AppState>>,
    Path(staff_id): Path<String>,
) -> impl IntoResponse {
    match state.coordinator.past_tasks(&staff_id).await {
        Ok(tasks) => Json(serde_json::json!({"tasks": tasks})).into_response(),
        Err(e) => error_response(e),
    }
}
