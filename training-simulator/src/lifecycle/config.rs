use std::time::Duration;

use common::utils::config::AppConfig;

#[derive(Debug, Clone)]
pub struct SimulationSettings {
    pub epoch_duration: Duration,
    pub max_concurrent_jobs: Option<usize>,
    pub max_runtime: Option<Duration>,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            epoch_duration: Duration::from_millis(800),
            max_concurrent_jobs: None,
            max_runtime: None,
        }
    }
}

impl SimulationSettings {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            epoch_duration: Duration::from_millis(config.epoch_duration_ms),
            max_concurrent_jobs: (config.max_concurrent_jobs > 0)
                .then_some(config.max_concurrent_jobs),
            max_runtime: (config.max_job_runtime_secs > 0)
                .then(|| Duration::from_secs(config.max_job_runtime_secs)),
        }
    }

    pub fn with_epoch_duration(mut self, epoch_duration: Duration) -> Self {
        self.epoch_duration = epoch_duration;
        self
    }
}
