use api_state::ApiState;
use axum::{
    extract::FromRef,
    routing::{get, post},
    Router,
};
use routes::{
    liveness::live,
    readiness::ready,
    results::{get_model_insights, get_model_performance_summary, get_training_results},
    training::{
        cancel_training_job, get_training_status, list_active_training_jobs, list_models,
        start_training,
    },
};

pub mod api_state;
pub mod error;
mod routes;

pub use routes::index::home;

/// Router for API functionality, version 1
pub fn api_routes_v1<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    ApiState: FromRef<S>,
{
    // Probes for k8s/systemd
    let probes = Router::new()
        .route("/ready", get(ready))
        .route("/live", get(live));

    let training = Router::new()
        .route("/training/start", post(start_training))
        .route("/training/status/{job_id}", get(get_training_status))
        .route("/training/active", get(list_active_training_jobs))
        .route("/training/cancel/{job_id}", post(cancel_training_job))
        .route("/training/models", get(list_models));

    let results = Router::new()
        .route("/results/summary/{model_type}", get(get_model_performance_summary))
        .route("/results/{job_id}", get(get_training_results))
        .route("/results/{job_id}/insights", get(get_model_insights));

    probes.merge(training).merge(results)
}
