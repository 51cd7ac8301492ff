use config::{builder::DefaultState, Config, ConfigBuilder, Environment, File};
use serde::Deserialize;

use crate::error::AppError;

#[derive(Clone, Deserialize, Debug)]
pub struct AppConfig {
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    /// Simulated wall time of a single training epoch.
    #[serde(default = "default_epoch_duration_ms")]
    pub epoch_duration_ms: u64,
    /// Upper bound on simultaneously running jobs; `0` disables the cap.
    #[serde(default)]
    pub max_concurrent_jobs: usize,
    /// Per-job runtime budget; `0` disables the guard.
    #[serde(default)]
    pub max_job_runtime_secs: u64,
    /// Seeds the metric noise generator so runs can be replayed.
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

fn default_http_port() -> u16 {
    8000
}

fn default_epoch_duration_ms() -> u64 {
    800
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http_port: default_http_port(),
            epoch_duration_ms: default_epoch_duration_ms(),
            max_concurrent_jobs: 0,
            max_job_runtime_secs: 0,
            rng_seed: None,
        }
    }
}

pub fn get_config() -> Result<AppConfig, AppError> {
    load(
        Config::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(Environment::default()),
    )
}

fn load(builder: ConfigBuilder<DefaultState>) -> Result<AppConfig, AppError> {
    Ok(builder.build()?.try_deserialize()?)
}
