use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::IntoResponse,
    Json,
};
use common::storage::types::training_job::TrainingConfig;
use serde_json::json;
use tracing::info;
use training_simulator::catalog::{PRELOADED_DATASETS, SIMULATED_DEVICE, SUPPORTED_MODELS};

use crate::{api_state::ApiState, error::ApiError};

pub async fn start_training(
    State(state): State<ApiState>,
    payload: Result<Json<TrainingConfig>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(config) = payload?;
    info!(
        model = %config.model,
        dataset = %config.dataset,
        epochs = config.epochs,
        "Received training request"
    );

    let estimated = state.manager.estimated_duration(config.epochs);
    let job_id = state.manager.start(config).await?;

    Ok(Json(json!({
        "message": "Training started successfully",
        "job_id": job_id,
        "status": "running",
        "estimated_duration": format!("{:.1} seconds", estimated.as_secs_f64()),
        "device": SIMULATED_DEVICE,
    })))
}

pub async fn get_training_status(
    State(state): State<ApiState>,
    Path(job_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let job = state.manager.status(&job_id).await?;
    Ok(Json(job))
}

pub async fn list_active_training_jobs(
    State(state): State<ApiState>,
) -> Result<impl IntoResponse, ApiError> {
    let jobs = state.manager.list_active().await?;
    Ok(Json(json!({
        "active_jobs": jobs.len(),
        "jobs": jobs,
    })))
}

pub async fn cancel_training_job(
    State(state): State<ApiState>,
    Path(job_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let job = state.manager.cancel(&job_id).await?;
    Ok(Json(json!({
        "message": format!("Training job {job_id} cancelled successfully"),
        "job_id": job.id,
        "status": job.status,
        "current_epoch": job.current_epoch,
    })))
}

pub async fn list_models() -> impl IntoResponse {
    Json(json!({
        "models": SUPPORTED_MODELS,
        "datasets": PRELOADED_DATASETS,
    }))
}
