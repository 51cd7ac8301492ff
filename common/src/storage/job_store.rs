use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::warn;

use crate::{
    error::AppError,
    storage::types::training_job::{JobStatus, TrainingConfig, TrainingJob},
};

/// A mutation applied to a single job record. Returning an error discards the
/// mutation and leaves the stored job untouched.
pub type JobMutation = Box<dyn FnOnce(&mut TrainingJob) -> Result<(), AppError> + Send>;

/// Keyed storage for training jobs. Readers always receive owned snapshots.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn insert(&self, job: TrainingJob) -> Result<(), AppError>;

    async fn get(&self, id: &str) -> Result<Option<TrainingJob>, AppError>;

    /// Atomically applies `mutation` to the job with `id`. Returns `Ok(None)`
    /// when the id is unknown.
    async fn update(
        &self,
        id: &str,
        mutation: JobMutation,
    ) -> Result<Option<TrainingJob>, AppError>;

    /// Jobs in insertion order.
    async fn list(&self) -> Result<Vec<TrainingJob>, AppError>;

    async fn len(&self) -> Result<usize, AppError>;

    async fn create(&self, config: TrainingConfig) -> Result<String, AppError> {
        let job = TrainingJob::new(config);
        let id = job.id.clone();
        self.insert(job).await?;
        Ok(id)
    }

    async fn list_by_status(&self, status: JobStatus) -> Result<Vec<TrainingJob>, AppError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|job| job.status == status)
            .collect())
    }
}

#[derive(Default)]
struct Slots {
    jobs: HashMap<String, TrainingJob>,
    order: Vec<String>,
}

/// Process-lifetime job store guarded by a single reader/writer lock.
#[derive(Default)]
pub struct MemoryJobStore {
    inner: RwLock<Slots>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn insert(&self, job: TrainingJob) -> Result<(), AppError> {
        let mut slots = self.inner.write().await;
        if slots.jobs.contains_key(&job.id) {
            return Err(AppError::InternalFault(format!(
                "job id {} already issued",
                job.id
            )));
        }
        slots.order.push(job.id.clone());
        slots.jobs.insert(job.id.clone(), job);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<TrainingJob>, AppError> {
        Ok(self.inner.read().await.jobs.get(id).cloned())
    }

    async fn update(
        &self,
        id: &str,
        mutation: JobMutation,
    ) -> Result<Option<TrainingJob>, AppError> {
        let mut slots = self.inner.write().await;
        let Some(stored) = slots.jobs.get_mut(id) else {
            warn!(job_id = %id, "update for unknown job ignored");
            return Ok(None);
        };

        let mut draft = stored.clone();
        mutation(&mut draft)?;
        *stored = draft.clone();
        Ok(Some(draft))
    }

    async fn list(&self) -> Result<Vec<TrainingJob>, AppError> {
        let slots = self.inner.read().await;
        Ok(slots
            .order
            .iter()
            .filter_map(|id| slots.jobs.get(id).cloned())
            .collect())
    }

    async fn len(&self) -> Result<usize, AppError> {
        Ok(self.inner.read().await.jobs.len())
    }
}
