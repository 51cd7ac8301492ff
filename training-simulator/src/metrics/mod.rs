mod noise;

pub use noise::{FixedNoise, NoiseSource, RandomNoise};

use common::storage::types::training_job::EpochMetrics;
use serde::Serialize;

pub const ACCURACY_NOISE: f64 = 0.02;
pub const LOSS_NOISE: f64 = 0.05;
pub const MIN_LOSS: f64 = 0.01;

/// Start and end points of a synthetic training curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricsProfile {
    pub acc_start: f64,
    pub acc_end: f64,
    pub loss_start: f64,
    pub loss_end: f64,
}

pub const CNN_PROFILE: MetricsProfile = MetricsProfile {
    acc_start: 0.1,
    acc_end: 0.98,
    loss_start: 2.3,
    loss_end: 0.05,
};

pub const TRANSFORMER_PROFILE: MetricsProfile = MetricsProfile {
    acc_start: 0.15,
    acc_end: 0.92,
    loss_start: 2.1,
    loss_end: 0.1,
};

pub const MLP_PROFILE: MetricsProfile = MetricsProfile {
    acc_start: 0.1,
    acc_end: 0.9,
    loss_start: 2.3,
    loss_end: 0.1,
};

pub const DEFAULT_PROFILE: MetricsProfile = MetricsProfile {
    acc_start: 0.1,
    acc_end: 0.9,
    loss_start: 2.3,
    loss_end: 0.1,
};

impl MetricsProfile {
    /// Profile for a model kind; unknown kinds get [`DEFAULT_PROFILE`].
    pub fn for_model(model: &str) -> Self {
        match model.trim().to_ascii_lowercase().as_str() {
            "cnn" => CNN_PROFILE,
            "transformer" => TRANSFORMER_PROFILE,
            "mlp" => MLP_PROFILE,
            _ => DEFAULT_PROFILE,
        }
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Computes the noisy accuracy/loss sample for `epoch` out of `total_epochs`.
///
/// Accuracy moves linearly from `acc_start` to `acc_end`. Loss is
/// `loss_start + (loss_end - loss_start) * (1 - t)`, so the final epoch
/// lands on `loss_start`. Noise is drawn independently for each value, then
/// accuracy is clamped into `[0, 1]` and loss floored at [`MIN_LOSS`].
pub fn next_metric(
    profile: &MetricsProfile,
    epoch: u32,
    total_epochs: u32,
    noise: &dyn NoiseSource,
) -> EpochMetrics {
    let t = if total_epochs == 0 {
        1.0
    } else {
        f64::from(epoch.min(total_epochs)) / f64::from(total_epochs)
    };

    let accuracy = profile.acc_start + (profile.acc_end - profile.acc_start) * t;
    let loss = profile.loss_start + (profile.loss_end - profile.loss_start) * (1.0 - t);

    let accuracy = (accuracy + noise.sample(ACCURACY_NOISE)).clamp(0.0, 1.0);
    let loss = (loss + noise.sample(LOSS_NOISE)).max(MIN_LOSS);

    EpochMetrics {
        epoch,
        accuracy: round4(accuracy),
        loss: round4(loss),
    }
}
