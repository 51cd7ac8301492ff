use std::collections::HashMap;

use tokio::{sync::Mutex, task::JoinHandle};
use tokio_util::sync::CancellationToken;

pub(crate) struct TrackedTask {
    pub(crate) handle: JoinHandle<()>,
    pub(crate) token: CancellationToken,
}

/// Background simulations keyed by job id. An entry lives until its task
/// has written the job's final state.
#[derive(Default)]
pub(crate) struct TaskRegistry {
    tasks: Mutex<HashMap<String, TrackedTask>>,
}

impl TaskRegistry {
    pub(crate) async fn lock(&self) -> tokio::sync::MutexGuard<'_, HashMap<String, TrackedTask>> {
        self.tasks.lock().await
    }

    pub(crate) async fn remove(&self, job_id: &str) {
        self.tasks.lock().await.remove(job_id);
    }

    /// Fires the cancellation token of a tracked job. Returns `false` when the
    /// job has no live task.
    pub(crate) async fn cancel(&self, job_id: &str) -> bool {
        self.tasks
            .lock()
            .await
            .get(job_id)
            .map(|task| task.token.cancel())
            .is_some()
    }

    pub(crate) async fn len(&self) -> usize {
        self.tasks.lock().await.len()
    }

    pub(crate) async fn drain(&self) -> Vec<(String, TrackedTask)> {
        self.tasks.lock().await.drain().collect()
    }
}
