use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use state_machines::state_machine;
use uuid::Uuid;

use crate::error::AppError;

pub const DEFAULT_EPOCHS: u32 = 10;
pub const DEFAULT_LEARNING_RATE: f64 = 0.001;
pub const DEFAULT_BATCH_SIZE: u32 = 32;

fn default_epochs() -> u32 {
    DEFAULT_EPOCHS
}

fn default_learning_rate() -> f64 {
    DEFAULT_LEARNING_RATE
}

fn default_batch_size() -> u32 {
    DEFAULT_BATCH_SIZE
}

/// Parameters requested for a simulated training run. Captured once at
/// creation and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainingConfig {
    #[serde(default)]
    pub dataset: String,
    #[serde(default)]
    pub model: String,
    #[serde(default = "default_epochs")]
    pub epochs: u32,
    #[serde(default = "default_learning_rate", alias = "learningRate")]
    pub learning_rate: f64,
    #[serde(default = "default_batch_size", alias = "batchSize")]
    pub batch_size: u32,
}

impl TrainingConfig {
    pub fn new(dataset: impl Into<String>, model: impl Into<String>, epochs: u32) -> Self {
        Self {
            dataset: dataset.into(),
            model: model.into(),
            epochs,
            learning_rate: DEFAULT_LEARNING_RATE,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Cancelled => "cancelled",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Cancelled | JobStatus::Failed
        )
    }
}

#[derive(Debug, Clone, Copy)]
enum JobTransition {
    Start,
    Complete,
    Fail,
    Cancel,
}

impl JobTransition {
    fn as_str(&self) -> &'static str {
        match self {
            JobTransition::Start => "start",
            JobTransition::Complete => "complete",
            JobTransition::Fail => "fail",
            JobTransition::Cancel => "cancel",
        }
    }
}

mod lifecycle {
    use super::state_machine;

    state_machine! {
        name: JobLifecycleMachine,
        initial: Pending,
        states: [Pending, Running, Completed, Cancelled, Failed],
        events {
            start {
                transition: { from: Pending, to: Running }
            }
            complete {
                transition: { from: Running, to: Completed }
            }
            fail {
                transition: { from: Pending, to: Failed }
                transition: { from: Running, to: Failed }
            }
            cancel {
                transition: { from: Pending, to: Cancelled }
                transition: { from: Running, to: Cancelled }
            }
        }
    }

    pub(super) fn pending() -> JobLifecycleMachine<(), Pending> {
        JobLifecycleMachine::new(())
    }

    pub(super) fn running() -> JobLifecycleMachine<(), Running> {
        pending()
            .start()
            .expect("start transition from Pending should exist")
    }
}

fn invalid_transition(state: JobStatus, event: JobTransition) -> AppError {
    AppError::InvalidTransition(format!("{} -> {}", state.as_str(), event.as_str()))
}

fn compute_next_state(state: JobStatus, event: JobTransition) -> Result<JobStatus, AppError> {
    use lifecycle::{pending, running};
    match (state, event) {
        (JobStatus::Pending, JobTransition::Start) => pending()
            .start()
            .map(|_| JobStatus::Running)
            .map_err(|_| invalid_transition(state, event)),
        (JobStatus::Running, JobTransition::Complete) => running()
            .complete()
            .map(|_| JobStatus::Completed)
            .map_err(|_| invalid_transition(state, event)),
        (JobStatus::Pending, JobTransition::Fail) => pending()
            .fail()
            .map(|_| JobStatus::Failed)
            .map_err(|_| invalid_transition(state, event)),
        (JobStatus::Running, JobTransition::Fail) => running()
            .fail()
            .map(|_| JobStatus::Failed)
            .map_err(|_| invalid_transition(state, event)),
        (JobStatus::Pending, JobTransition::Cancel) => pending()
            .cancel()
            .map(|_| JobStatus::Cancelled)
            .map_err(|_| invalid_transition(state, event)),
        (JobStatus::Running, JobTransition::Cancel) => running()
            .cancel()
            .map(|_| JobStatus::Cancelled)
            .map_err(|_| invalid_transition(state, event)),
        _ => Err(invalid_transition(state, event)),
    }
}

/// One sample of the simulated training curve.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct EpochMetrics {
    pub epoch: u32,
    pub accuracy: f64,
    pub loss: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainingJob {
    pub id: String,
    pub status: JobStatus,
    pub config: TrainingConfig,
    pub progress: u8,
    pub current_epoch: u32,
    pub total_epochs: u32,
    pub metrics_history: Vec<EpochMetrics>,
    pub final_accuracy: Option<f64>,
    pub final_loss: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

/// Materialised outcome of a completed job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobResult {
    pub job_id: String,
    pub config: TrainingConfig,
    pub final_accuracy: f64,
    pub final_loss: f64,
    pub total_epochs: u32,
    pub metrics_history: Vec<EpochMetrics>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: DateTime<Utc>,
}

impl JobResult {
    pub fn training_time_seconds(&self) -> i64 {
        self.started_at
            .map_or(0, |started| (self.ended_at - started).num_seconds().max(0))
    }
}

/// Integer percentage of `epoch` over `total`, floored.
pub fn progress_for(epoch: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let percent = u64::from(epoch.min(total)) * 100 / u64::from(total);
    u8::try_from(percent).unwrap_or(100)
}

impl TrainingJob {
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            status: JobStatus::Pending,
            total_epochs: config.epochs,
            config,
            progress: 0,
            current_epoch: 0,
            metrics_history: Vec::new(),
            final_accuracy: None,
            final_loss: None,
            created_at: Utc::now(),
            started_at: None,
            ended_at: None,
            error_message: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    fn ensure_not_terminal(&self) -> Result<(), AppError> {
        if self.is_terminal() {
            return Err(AppError::AlreadyTerminal(format!(
                "job {} is already {}",
                self.id,
                self.status.as_str()
            )));
        }
        Ok(())
    }

    pub fn mark_running(&mut self, now: DateTime<Utc>) -> Result<(), AppError> {
        self.ensure_not_terminal()?;
        self.status = compute_next_state(self.status, JobTransition::Start)?;
        self.started_at = Some(now);
        Ok(())
    }

    /// Appends the sample for the next epoch and advances progress with it.
    pub fn record_epoch(&mut self, metrics: EpochMetrics) -> Result<(), AppError> {
        self.ensure_not_terminal()?;
        if self.status != JobStatus::Running {
            return Err(AppError::InvalidTransition(format!(
                "cannot record epoch while {}",
                self.status.as_str()
            )));
        }
        let expected = self.current_epoch.saturating_add(1);
        if metrics.epoch != expected || metrics.epoch > self.total_epochs {
            return Err(AppError::InternalFault(format!(
                "out of order epoch {} (expected {} of {})",
                metrics.epoch, expected, self.total_epochs
            )));
        }

        self.metrics_history.push(metrics);
        self.current_epoch = metrics.epoch;
        self.progress = progress_for(self.current_epoch, self.total_epochs);
        Ok(())
    }

    pub fn mark_completed(&mut self, now: DateTime<Utc>) -> Result<(), AppError> {
        self.ensure_not_terminal()?;
        if self.current_epoch != self.total_epochs {
            return Err(AppError::InternalFault(format!(
                "cannot complete at epoch {} of {}",
                self.current_epoch, self.total_epochs
            )));
        }
        let last = self
            .metrics_history
            .last()
            .copied()
            .ok_or_else(|| AppError::InternalFault("no metrics recorded".to_string()))?;

        self.status = compute_next_state(self.status, JobTransition::Complete)?;
        self.final_accuracy = Some(last.accuracy);
        self.final_loss = Some(last.loss);
        self.ended_at = Some(now);
        Ok(())
    }

    pub fn mark_cancelled(&mut self, now: DateTime<Utc>) -> Result<(), AppError> {
        self.ensure_not_terminal()?;
        self.status = compute_next_state(self.status, JobTransition::Cancel)?;
        self.ended_at = Some(now);
        Ok(())
    }

    pub fn mark_failed(&mut self, reason: String, now: DateTime<Utc>) -> Result<(), AppError> {
        self.ensure_not_terminal()?;
        self.status = compute_next_state(self.status, JobTransition::Fail)?;
        self.error_message = Some(reason);
        self.ended_at = Some(now);
        Ok(())
    }

    pub fn to_result(&self) -> Result<JobResult, AppError> {
        match (
            self.status,
            self.final_accuracy,
            self.final_loss,
            self.ended_at,
        ) {
            (JobStatus::Completed, Some(final_accuracy), Some(final_loss), Some(ended_at)) => {
                Ok(JobResult {
                    job_id: self.id.clone(),
                    config: self.config.clone(),
                    final_accuracy,
                    final_loss,
                    total_epochs: self.total_epochs,
                    metrics_history: self.metrics_history.clone(),
                    started_at: self.started_at,
                    ended_at,
                })
            }
            (status, ..) => Err(AppError::NotReady(format!(
                "job {} not completed yet, current status: {}",
                self.id,
                status.as_str()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(epoch: u32) -> EpochMetrics {
        EpochMetrics {
            epoch,
            accuracy: 0.5,
            loss: 1.0,
        }
    }

    fn running_job(epochs: u32) -> TrainingJob {
        let mut job = TrainingJob::new(TrainingConfig::new("mnist", "cnn", epochs));
        job.mark_running(Utc::now()).expect("start");
        job
    }

    #[test]
    fn test_new_job_defaults() {
        let job = TrainingJob::new(TrainingConfig::new("mnist", "cnn", 5));
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.progress, 0);
        assert_eq!(job.current_epoch, 0);
        assert_eq!(job.total_epochs, 5);
        assert!(job.metrics_history.is_empty());
        assert!(job.started_at.is_none());
        assert!(job.ended_at.is_none());
    }

    #[test]
    fn test_ids_are_unique() {
        let a = TrainingJob::new(TrainingConfig::new("mnist", "cnn", 1));
        let b = TrainingJob::new(TrainingConfig::new("mnist", "cnn", 1));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_config_defaults_from_json() {
        let config: TrainingConfig =
            serde_json::from_str(r#"{"dataset":"mnist","model":"cnn"}"#).expect("parse");
        assert_eq!(config.epochs, DEFAULT_EPOCHS);
        assert!((config.learning_rate - DEFAULT_LEARNING_RATE).abs() < f64::EPSILON);
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);

        let camel: TrainingConfig = serde_json::from_str(
            r#"{"dataset":"mnist","model":"cnn","learningRate":0.01,"batchSize":64}"#,
        )
        .expect("parse camel case");
        assert!((camel.learning_rate - 0.01).abs() < f64::EPSILON);
        assert_eq!(camel.batch_size, 64);
    }

    #[test]
    fn test_record_epoch_keeps_progress_in_step() {
        let mut job = running_job(3);
        for epoch in 1..=3 {
            job.record_epoch(sample(epoch)).expect("record");
            assert_eq!(job.metrics_history.len(), job.current_epoch as usize);
            assert_eq!(job.progress, progress_for(epoch, 3));
        }
        assert_eq!(job.progress, 100);
    }

    #[test]
    fn test_progress_is_floored() {
        assert_eq!(progress_for(1, 3), 33);
        assert_eq!(progress_for(2, 3), 66);
        assert_eq!(progress_for(1, 100), 1);
        assert_eq!(progress_for(0, 0), 0);
    }

    #[test]
    fn test_record_epoch_rejects_gaps() {
        let mut job = running_job(3);
        let err = job.record_epoch(sample(2)).expect_err("gap rejected");
        assert!(matches!(err, AppError::InternalFault(_)));
        assert!(job.metrics_history.is_empty());
    }

    #[test]
    fn test_record_epoch_requires_running() {
        let mut job = TrainingJob::new(TrainingConfig::new("mnist", "cnn", 3));
        let err = job.record_epoch(sample(1)).expect_err("pending rejected");
        assert!(matches!(err, AppError::InvalidTransition(_)));
    }

    #[test]
    fn test_complete_sets_finals_once() {
        let mut job = running_job(2);
        job.record_epoch(sample(1)).expect("epoch 1");
        assert!(job.mark_completed(Utc::now()).is_err());
        job.record_epoch(EpochMetrics {
            epoch: 2,
            accuracy: 0.9,
            loss: 0.1,
        })
        .expect("epoch 2");
        job.mark_completed(Utc::now()).expect("complete");

        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.final_accuracy, Some(0.9));
        assert_eq!(job.final_loss, Some(0.1));
        assert!(job.ended_at.is_some());

        let err = job.mark_completed(Utc::now()).expect_err("second completion");
        assert!(matches!(err, AppError::AlreadyTerminal(_)));
    }

    #[test]
    fn test_terminal_jobs_reject_every_mutation() {
        let mut job = running_job(4);
        job.mark_cancelled(Utc::now()).expect("cancel");
        let ended_at = job.ended_at;

        assert!(matches!(
            job.record_epoch(sample(1)),
            Err(AppError::AlreadyTerminal(_))
        ));
        assert!(matches!(
            job.mark_cancelled(Utc::now()),
            Err(AppError::AlreadyTerminal(_))
        ));
        assert!(matches!(
            job.mark_failed("boom".into(), Utc::now()),
            Err(AppError::AlreadyTerminal(_))
        ));
        assert_eq!(job.status, JobStatus::Cancelled);
        assert_eq!(job.ended_at, ended_at);
    }

    #[test]
    fn test_pending_can_be_cancelled_or_failed() {
        let mut cancelled = TrainingJob::new(TrainingConfig::new("mnist", "cnn", 1));
        cancelled.mark_cancelled(Utc::now()).expect("cancel pending");
        assert_eq!(cancelled.status, JobStatus::Cancelled);

        let mut failed = TrainingJob::new(TrainingConfig::new("mnist", "cnn", 1));
        failed
            .mark_failed("simulator crashed".into(), Utc::now())
            .expect("fail pending");
        assert_eq!(failed.status, JobStatus::Failed);
        assert_eq!(failed.error_message.as_deref(), Some("simulator crashed"));
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(compute_next_state(JobStatus::Pending, JobTransition::Complete).is_err());
        assert!(compute_next_state(JobStatus::Running, JobTransition::Start).is_err());
        assert!(compute_next_state(JobStatus::Completed, JobTransition::Cancel).is_err());
        assert_eq!(
            compute_next_state(JobStatus::Running, JobTransition::Cancel).expect("cancel"),
            JobStatus::Cancelled
        );
    }

    #[test]
    fn test_result_requires_completion() {
        let mut job = running_job(1);
        assert!(matches!(job.to_result(), Err(AppError::NotReady(_))));

        job.record_epoch(sample(1)).expect("record");
        job.mark_completed(Utc::now()).expect("complete");

        let first = job.to_result().expect("result");
        let second = job.to_result().expect("result again");
        assert_eq!(first, second);
        assert_eq!(first.metrics_history.len(), 1);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&JobStatus::Running).expect("serialize");
        assert_eq!(json, "\"running\"");
    }
}
