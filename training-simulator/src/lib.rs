#![allow(clippy::missing_docs_in_private_items)]

pub mod catalog;
pub mod insights;
pub mod lifecycle;
pub mod metrics;

pub use lifecycle::{validate_config, JobLifecycleManager, SimulationSettings};
pub use metrics::{next_metric, FixedNoise, MetricsProfile, NoiseSource, RandomNoise};
