mod config;
mod registry;

pub use config::SimulationSettings;

use std::{panic::AssertUnwindSafe, sync::Arc, time::Duration};

use chrono::Utc;
use common::{
    error::AppError,
    storage::{
        job_store::{JobMutation, JobStore},
        types::training_job::{JobResult, JobStatus, TrainingConfig, TrainingJob},
    },
    utils::config::AppConfig,
};
use futures::{future::join_all, FutureExt};
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    catalog::{is_supported_model, SUPPORTED_MODELS},
    metrics::{next_metric, MetricsProfile, NoiseSource, RandomNoise},
};

use self::registry::{TaskRegistry, TrackedTask};

/// Rejects configs the simulator cannot run.
pub fn validate_config(config: &TrainingConfig) -> Result<(), AppError> {
    if !is_supported_model(&config.model) {
        return Err(AppError::InvalidConfig(format!(
            "Model '{}' not supported. Supported: {}",
            config.model,
            SUPPORTED_MODELS.join(", ")
        )));
    }
    if config.dataset.trim().is_empty() {
        return Err(AppError::InvalidConfig("Dataset is required".to_string()));
    }
    if config.epochs == 0 {
        return Err(AppError::InvalidConfig(
            "epochs must be at least 1".to_string(),
        ));
    }
    if !(config.learning_rate.is_finite() && config.learning_rate > 0.0) {
        return Err(AppError::InvalidConfig(
            "learning_rate must be a positive number".to_string(),
        ));
    }
    if config.batch_size == 0 {
        return Err(AppError::InvalidConfig(
            "batch_size must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Owns every simulated training job from creation to its terminal state.
///
/// Each started job gets its own tokio task that advances one epoch per
/// `epoch_duration`. The task is tracked by job id together with a
/// cancellation token so `cancel` and `shutdown` never depend on an
/// unsupervised background future.
pub struct JobLifecycleManager {
    store: Arc<dyn JobStore>,
    noise: Arc<dyn NoiseSource>,
    settings: SimulationSettings,
    registry: Arc<TaskRegistry>,
}

impl JobLifecycleManager {
    pub fn new(
        store: Arc<dyn JobStore>,
        noise: Arc<dyn NoiseSource>,
        settings: SimulationSettings,
    ) -> Self {
        Self {
            store,
            noise,
            settings,
            registry: Arc::new(TaskRegistry::default()),
        }
    }

    pub fn from_config(store: Arc<dyn JobStore>, config: &AppConfig) -> Self {
        Self::new(
            store,
            Arc::new(RandomNoise::from_seed(config.rng_seed)),
            SimulationSettings::from_app_config(config),
        )
    }

    pub fn store(&self) -> &Arc<dyn JobStore> {
        &self.store
    }

    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    pub fn estimated_duration(&self, epochs: u32) -> Duration {
        self.settings.epoch_duration.saturating_mul(epochs)
    }

    /// Number of simulations that have not yet written their final state.
    pub async fn running_tasks(&self) -> usize {
        self.registry.len().await
    }

    #[tracing::instrument(
        skip_all,
        fields(model = %config.model, dataset = %config.dataset, epochs = config.epochs)
    )]
    pub async fn start(&self, config: TrainingConfig) -> Result<String, AppError> {
        validate_config(&config)?;

        let mut tasks = self.registry.lock().await;
        if let Some(limit) = self.settings.max_concurrent_jobs {
            if tasks.len() >= limit {
                warn!(limit, "refusing training job, concurrency cap reached");
                return Err(AppError::CapacityExhausted(format!(
                    "{limit} training jobs already running"
                )));
            }
        }

        let job_id = self.store.create(config).await?;
        let started = self
            .store
            .update(
                &job_id,
                Box::new(|job: &mut TrainingJob| job.mark_running(Utc::now())),
            )
            .await;
        match started {
            Ok(Some(_)) => {}
            Ok(None) => return Err(AppError::NotFound(format!("training job {job_id}"))),
            Err(err) => {
                self.abandon(&job_id, &err).await;
                return Err(err);
            }
        }

        let token = CancellationToken::new();
        let run = SimulationRun {
            job_id: job_id.clone(),
            store: Arc::clone(&self.store),
            noise: Arc::clone(&self.noise),
            epoch_duration: self.settings.epoch_duration,
            max_runtime: self.settings.max_runtime,
            token: token.clone(),
        };
        let registry = Arc::clone(&self.registry);
        let handle = tokio::spawn(async move {
            run.supervise().await;
            registry.remove(&run.job_id).await;
        });
        tasks.insert(job_id.clone(), TrackedTask { handle, token });

        info!(%job_id, "training job started");
        Ok(job_id)
    }

    /// Marks a job that never reached `running` as failed so it does not
    /// linger as `pending`.
    async fn abandon(&self, job_id: &str, cause: &AppError) {
        let reason = format!("could not start simulation: {cause}");
        let outcome = self
            .store
            .update(
                job_id,
                Box::new(move |job: &mut TrainingJob| job.mark_failed(reason, Utc::now())),
            )
            .await;
        match outcome {
            Ok(_) => warn!(%job_id, error = %cause, "training job failed to start"),
            Err(err) => error!(%job_id, error = %err, "could not record failed start"),
        }
    }

    pub async fn status(&self, job_id: &str) -> Result<TrainingJob, AppError> {
        self.store
            .get(job_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("training job {job_id}")))
    }

    pub async fn list_active(&self) -> Result<Vec<TrainingJob>, AppError> {
        self.store.list_by_status(JobStatus::Running).await
    }

    pub async fn result(&self, job_id: &str) -> Result<JobResult, AppError> {
        self.status(job_id).await?.to_result()
    }

    /// Moves a pending or running job to `cancelled` and wakes its simulation
    /// so it exits at the next checkpoint.
    pub async fn cancel(&self, job_id: &str) -> Result<TrainingJob, AppError> {
        let cancelled = self
            .store
            .update(
                job_id,
                Box::new(|job: &mut TrainingJob| job.mark_cancelled(Utc::now())),
            )
            .await?
            .ok_or_else(|| AppError::NotFound(format!("training job {job_id}")))?;

        let signalled = self.registry.cancel(job_id).await;
        info!(
            %job_id,
            epoch = cancelled.current_epoch,
            signalled,
            "training job cancelled"
        );
        Ok(cancelled)
    }

    /// Cancels every tracked simulation and waits for the tasks to exit.
    pub async fn shutdown(&self) {
        let tasks = self.registry.drain().await;
        if tasks.is_empty() {
            return;
        }
        info!(count = tasks.len(), "stopping training simulations");

        let mut handles = Vec::with_capacity(tasks.len());
        for (job_id, task) in tasks {
            task.token.cancel();
            match self
                .store
                .update(
                    &job_id,
                    Box::new(|job: &mut TrainingJob| job.mark_cancelled(Utc::now())),
                )
                .await
            {
                Ok(_) | Err(AppError::AlreadyTerminal(_)) => {}
                Err(err) => warn!(%job_id, error = %err, "failed to cancel job during shutdown"),
            }
            handles.push(task.handle);
        }

        for joined in join_all(handles).await {
            if let Err(err) = joined {
                error!(error = %err, "training simulation task did not exit cleanly");
            }
        }
    }
}

struct SimulationRun {
    job_id: String,
    store: Arc<dyn JobStore>,
    noise: Arc<dyn NoiseSource>,
    epoch_duration: Duration,
    max_runtime: Option<Duration>,
    token: CancellationToken,
}

impl SimulationRun {
    /// Runs the simulation and records any fault on the job itself, since no
    /// caller is left waiting for this task.
    async fn supervise(&self) {
        let outcome = match self.max_runtime {
            Some(limit) => {
                match timeout(limit, AssertUnwindSafe(self.execute()).catch_unwind()).await {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        warn!(job_id = %self.job_id, limit = ?limit, "training job timed out");
                        self.fail(format!("exceeded maximum runtime of {limit:?}"))
                            .await;
                        return;
                    }
                }
            }
            None => AssertUnwindSafe(self.execute()).catch_unwind().await,
        };

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                error!(job_id = %self.job_id, error = %err, "training simulation failed");
                self.fail(err.to_string()).await;
            }
            Err(_) => {
                error!(job_id = %self.job_id, "training simulation panicked");
                self.fail("simulation task panicked".to_string()).await;
            }
        }
    }

    #[tracing::instrument(skip_all, fields(job_id = %self.job_id))]
    async fn execute(&self) -> Result<(), AppError> {
        let job = self
            .store
            .get(&self.job_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("training job {}", self.job_id)))?;
        if job.is_terminal() {
            debug!(status = job.status.as_str(), "job already finished before simulation");
            return Ok(());
        }
        let total = job.total_epochs;
        if total == 0 {
            return Err(AppError::InternalFault(
                "job has no epochs to simulate".to_string(),
            ));
        }
        let profile = MetricsProfile::for_model(&job.config.model);

        for epoch in job.current_epoch.saturating_add(1)..=total {
            tokio::select! {
                _ = self.token.cancelled() => {
                    info!(epoch, "simulation stopped by cancellation");
                    return Ok(());
                }
                _ = sleep(self.epoch_duration) => {}
            }

            let metrics = next_metric(&profile, epoch, total, self.noise.as_ref());
            let is_final = epoch == total;
            let mutation: JobMutation = Box::new(move |job: &mut TrainingJob| {
                job.record_epoch(metrics)?;
                if is_final {
                    job.mark_completed(Utc::now())?;
                }
                Ok(())
            });

            match self.store.update(&self.job_id, mutation).await {
                Ok(Some(job)) => debug!(
                    epoch,
                    progress = job.progress,
                    accuracy = metrics.accuracy,
                    loss = metrics.loss,
                    "epoch recorded"
                ),
                Ok(None) => {
                    return Err(AppError::NotFound(format!(
                        "training job {}",
                        self.job_id
                    )))
                }
                Err(AppError::AlreadyTerminal(reason)) => {
                    info!(epoch, %reason, "job left running state, stopping simulation");
                    return Ok(());
                }
                Err(err) => return Err(err),
            }
        }

        info!(total_epochs = total, "training simulation completed");
        Ok(())
    }

    async fn fail(&self, reason: String) {
        let outcome = self
            .store
            .update(
                &self.job_id,
                Box::new(move |job: &mut TrainingJob| job.mark_failed(reason, Utc::now())),
            )
            .await;
        match outcome {
            Ok(Some(job)) => warn!(
                job_id = %self.job_id,
                reason = job.error_message.as_deref().unwrap_or_default(),
                "training job marked failed"
            ),
            Ok(None) | Err(AppError::AlreadyTerminal(_)) => {}
            Err(err) => error!(job_id = %self.job_id, error = %err, "could not record job failure"),
        }
    }
}
