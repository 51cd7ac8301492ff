use config::ConfigError;
use thiserror::Error;

// Core internal errors
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid training config: {0}")]
    InvalidConfig(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Job already terminal: {0}")]
    AlreadyTerminal(String),
    #[error("Job not ready: {0}")]
    NotReady(String),
    #[error("Invalid job transition: {0}")]
    InvalidTransition(String),
    #[error("Capacity exhausted: {0}")]
    CapacityExhausted(String),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Internal fault: {0}")]
    InternalFault(String),
}
