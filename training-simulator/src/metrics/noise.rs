use std::sync::{Mutex, PoisonError};

use rand::{rngs::StdRng, Rng, SeedableRng};

/// Source of bounded perturbations added to simulated metrics.
pub trait NoiseSource: Send + Sync {
    /// Returns a value in `[-bound, bound]`.
    fn sample(&self, bound: f64) -> f64;
}

/// Uniform noise drawn from a seedable RNG shared by every running job.
pub struct RandomNoise {
    rng: Mutex<StdRng>,
}

impl RandomNoise {
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn from_seed(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_entropy, Self::seeded)
    }
}

impl NoiseSource for RandomNoise {
    fn sample(&self, bound: f64) -> f64 {
        if bound <= 0.0 {
            return 0.0;
        }
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.gen_range(-bound..=bound)
    }
}

/// Always returns the same fraction of the bound. `FixedNoise(0.0)` disables
/// noise entirely, `FixedNoise(1.0)` pins every sample to the upper edge.
#[derive(Debug, Clone, Copy)]
pub struct FixedNoise(pub f64);

impl NoiseSource for FixedNoise {
    fn sample(&self, bound: f64) -> f64 {
        bound * self.0.clamp(-1.0, 1.0)
    }
}
