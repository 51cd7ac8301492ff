use std::sync::Arc;

use api_router::{api_routes_v1, api_state::ApiState, home};
use axum::{extract::FromRef, routing::get, Router};
use common::{
    storage::job_store::MemoryJobStore,
    utils::config::{get_config, AppConfig},
};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use training_simulator::JobLifecycleManager;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set up tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    // Get config
    let config = get_config()?;
    info!(
        epoch_duration_ms = config.epoch_duration_ms,
        max_concurrent_jobs = config.max_concurrent_jobs,
        max_job_runtime_secs = config.max_job_runtime_secs,
        "Configuration loaded"
    );

    let manager = Arc::new(JobLifecycleManager::from_config(
        Arc::new(MemoryJobStore::new()),
        &config,
    ));
    let app = build_app(&config, Arc::clone(&manager));

    info!("Starting server listening on 0.0.0.0:{}", config.http_port);
    let serve_address = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(serve_address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped, cancelling running simulations");
    manager.shutdown().await;

    Ok(())
}

fn build_app(config: &AppConfig, manager: Arc<JobLifecycleManager>) -> Router {
    let api_state = ApiState::new(config, manager);
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(home))
        .nest("/api/v1", api_routes_v1())
        .layer(cors)
        .with_state(AppState { api_state })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}

#[derive(Clone, FromRef)]
struct AppState {
    api_state: ApiState,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    fn smoke_test_config() -> AppConfig {
        AppConfig {
            http_port: 0,
            epoch_duration_ms: 5,
            ..Default::default()
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn smoke_startup_with_in_memory_store() {
        let config = smoke_test_config();
        let manager = Arc::new(JobLifecycleManager::from_config(
            Arc::new(MemoryJobStore::new()),
            &config,
        ));
        let app = build_app(&config, Arc::clone(&manager));

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/").body(Body::empty()).expect("request"))
            .await
            .expect("router response");
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/live")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/training/start")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        serde_json::json!({ "dataset": "mnist", "model": "cnn", "epochs": 200 })
                            .to_string(),
                    ))
                    .expect("request"),
            )
            .await
            .expect("start response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body: serde_json::Value = serde_json::from_slice(&body).expect("json");
        let job_id = body["job_id"].as_str().expect("job id").to_string();

        let ready_response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/ready")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("ready response");
        assert_eq!(ready_response.status(), StatusCode::OK);

        manager.shutdown().await;
        let job = manager.status(&job_id).await.expect("job");
        assert_eq!(job.status.as_str(), "cancelled");
        assert_eq!(manager.running_tasks().await, 0);
    }
}
