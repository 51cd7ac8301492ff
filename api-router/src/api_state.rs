use std::sync::Arc;

use common::{storage::job_store::MemoryJobStore, utils::config::AppConfig};
use training_simulator::JobLifecycleManager;

#[derive(Clone)]
pub struct ApiState {
    pub manager: Arc<JobLifecycleManager>,
    pub config: AppConfig,
}

impl ApiState {
    pub fn new(config: &AppConfig, manager: Arc<JobLifecycleManager>) -> Self {
        Self {
            manager,
            config: config.clone(),
        }
    }

    /// State backed by a fresh in-memory job store.
    pub fn in_memory(config: &AppConfig) -> Self {
        let manager = JobLifecycleManager::from_config(Arc::new(MemoryJobStore::new()), config);
        Self::new(config, Arc::new(manager))
    }
}
