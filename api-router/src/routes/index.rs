use axum::{response::IntoResponse, Json};
use serde_json::json;

pub async fn home() -> impl IntoResponse {
    Json(json!({
        "message": "Welcome to AetherAI",
        "status": "running",
        "description": "Simulated model training for students without GPUs",
        "api": "/api/v1",
    }))
}
