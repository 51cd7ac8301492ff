use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use common::storage::types::training_job::{EpochMetrics, JobResult};
use serde::Serialize;
use serde_json::json;
use training_simulator::{catalog::model_summary, insights::generate_insights};

use crate::{api_state::ApiState, error::ApiError};

/// Per-epoch curves in the column layout the visualisation expects.
#[derive(Debug, Serialize)]
pub struct MetricCurves {
    pub accuracy: Vec<f64>,
    pub loss: Vec<f64>,
}

impl MetricCurves {
    fn from_history(history: &[EpochMetrics]) -> Self {
        Self {
            accuracy: history.iter().map(|m| m.accuracy).collect(),
            loss: history.iter().map(|m| m.loss).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ResultResponse {
    pub experiment_id: String,
    pub model: String,
    pub dataset: String,
    pub final_accuracy: f64,
    pub final_loss: f64,
    pub epochs: u32,
    pub learning_rate: f64,
    pub batch_size: u32,
    pub training_time_seconds: i64,
    pub metrics: MetricCurves,
    pub metrics_history: Vec<EpochMetrics>,
    pub insights: Vec<String>,
    pub completed_at: DateTime<Utc>,
    pub generated_at: DateTime<Utc>,
    pub status: &'static str,
}

impl From<JobResult> for ResultResponse {
    fn from(result: JobResult) -> Self {
        let insights = generate_insights(&result);
        let training_time_seconds = result.training_time_seconds();
        Self {
            experiment_id: result.job_id,
            model: result.config.model,
            dataset: result.config.dataset,
            final_accuracy: result.final_accuracy,
            final_loss: result.final_loss,
            epochs: result.total_epochs,
            learning_rate: result.config.learning_rate,
            batch_size: result.config.batch_size,
            training_time_seconds,
            metrics: MetricCurves::from_history(&result.metrics_history),
            metrics_history: result.metrics_history,
            insights,
            completed_at: result.ended_at,
            generated_at: Utc::now(),
            status: "success",
        }
    }
}

pub async fn get_training_results(
    State(state): State<ApiState>,
    Path(job_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state.manager.result(&job_id).await?;
    Ok(Json(ResultResponse::from(result)))
}

pub async fn get_model_insights(
    State(state): State<ApiState>,
    Path(job_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state.manager.result(&job_id).await?;
    Ok(Json(json!({ "insights": generate_insights(&result) })))
}

pub async fn get_model_performance_summary(
    Path(model_type): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = model_summary(&model_type).ok_or_else(|| {
        ApiError::NotFound(format!("No summary available for model: {model_type}"))
    })?;
    Ok(Json(summary))
}
