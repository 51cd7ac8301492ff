use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::api_state::ApiState;

/// Readiness probe: returns 200 if the job store answers, else 503.
pub async fn ready(State(state): State<ApiState>) -> impl IntoResponse {
    match state.manager.store().len().await {
        Ok(total_jobs) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "checks": { "job_store": "ok" },
                "total_jobs": total_jobs,
                "running_tasks": state.manager.running_tasks().await,
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "error",
                "checks": { "job_store": "fail" },
                "reason": e.to_string()
            })),
        ),
    }
}
