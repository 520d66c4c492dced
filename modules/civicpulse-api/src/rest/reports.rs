use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use tracing::info;

use civicpulse_common::{Category, GeoPoint, Severity};
use civicpulse_engine::{NewReport, SubmissionOutcome};

use crate::rest::error_response;
use crate::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub lat: f64,
    pub lng: f64,
    pub severity: Option<Severity>,
    #[serde(default)]
    pub description: String,
    pub image_url: Option<String>,
    pub reporter_id: String,
    pub reporter_email: String,
    #[serde(default)]
    pub verified: bool,
}

/// `POST /reports/{category}`
pub async fn submit_report(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
    Json(body): Json<SubmitRequest>,
) -> impl IntoResponse {
    let Some(category) = Category::from_str_loose(&category) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": format!("unknown category '{category}'")})),
        )
            .into_response();
    };

    let new = NewReport {
        category,
        location: GeoPoint {
            lat: body.lat,
            lng: body.lng,
        },
        severity: body.severity.unwrap_or(Severity::Medium),
        description: body.description,
        image_url: body.image_url,
        reporter_id: body.reporter_id,
        reporter_email: body.reporter_email,
        content_verified: body.verified,
    };

    match state.intake.submit(new).await {
        Ok(SubmissionOutcome::Created { key, status }) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "status": status,
                "reportId": key.report_id,
            })),
        )
            .into_response(),
        Ok(SubmissionOutcome::Duplicate {
            key,
            distance_meters,
            upvotes,
        }) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "DUPLICATE",
                "reportId": key.report_id,
                "distance": distance_meters,
                "upvotes": upvotes,
            })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalityCheckRequest {
    pub lat: f64,
    pub lng: f64,
}

/// `POST /locality/{category}Check`, e.g. `/locality/wasteCheck`. Probe
/// only: reports nearby duplicates without creating or mutating anything.
pub async fn locality_check(
    State(state): State<Arc<AppState>>,
    Path(check): Path<String>,
    Json(body): Json<LocalityCheckRequest>,
) -> impl IntoResponse {
    let Some(category) = check
        .strip_suffix("Check")
        .and_then(Category::from_str_loose)
    else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": format!("unknown locality check '{check}'")})),
        )
            .into_response();
    };

    let location = GeoPoint {
        lat: body.lat,
        lng: body.lng,
    };
    match state.intake.check_duplicate(category, location).await {
        Ok(Some(m)) => Json(serde_json::json!({
            "duplicateFound": true,
            "data": {
                "reportId": m.key.report_id,
                "userId": m.report.reporter_id,
                "imageUrl": m.report.image_url,
                "distance": m.distance_meters,
            },
        }))
        .into_response(),
        Ok(None) => Json(serde_json::json!({"duplicateFound": false})).into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelfResolveRequest {
    pub report_id: String,
    pub user_id: String,
}

/// `PUT /report/resolve`
pub async fn self_resolve(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SelfResolveRequest>,
) -> impl IntoResponse {
    match state
        .coordinator
        .self_resolve(&body.report_id, &body.user_id)
        .await
    {
        Ok(()) => {
            info!(report_id = %body.report_id, "report self-resolved by reporter");
            Json(serde_json::json!({"status": "RESOLVED"})).into_response()
        }
        Err(e) => error_response(e),
    }
}
