//! Randomness port for the order simulator

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Source of the simulator's random draws
pub trait RandomSource: Send + Sync {
    /// Value drawn uniformly from `[min, max]`
    fn uniform(&self, min: f64, max: f64) -> f64;

    /// `true` with probability `p`
    fn bernoulli(&self, p: f64) -> bool;

    /// Index drawn uniformly from `0..len`; `len` must be non-zero
    fn pick(&self, len: usize) -> usize {
        let index = self.uniform(0.0, len as f64).floor() as usize;
        index.min(len.saturating_sub(1))
    }
}

/// PRNG-backed source, seedable for reproducible runs
#[derive(Debug)]
pub struct RngSource {
    rng: Mutex<StdRng>,
}

impl RngSource {
    /// Seeded from the operating system
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RngSource {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for RngSource {
    fn uniform(&self, min: f64, max: f64) -> f64 {
        // Empty, NaN or unbounded ranges have nothing to draw from
        if !min.is_finite() || !max.is_finite() || min >= max {
            return min;
        }
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        rng.random_range(min..=max)
    }

    fn bernoulli(&self, p: f64) -> bool {
        if p.is_nan() {
            return false;
        }
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        rng.random_bool(p.clamp(0.0, 1.0))
    }
}

/// Replays queued draws in order, for tests that need to force outcomes
///
/// Queued uniform values are clamped into the requested range. Once a queue runs dry,
/// `uniform` returns the midpoint of the range and `bernoulli` returns `p >= 0.5`.
#[derive(Debug, Default)]
pub struct ScriptedRandom {
    uniforms: Mutex<VecDeque<f64>>,
    bernoullis: Mutex<VecDeque<bool>>,
}

impl ScriptedRandom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_uniforms(self, values: impl IntoIterator<Item = f64>) -> Self {
        self.push_uniforms(values);
        self
    }

    pub fn with_bernoullis(self, values: impl IntoIterator<Item = bool>) -> Self {
        self.push_bernoullis(values);
        self
    }

    pub fn push_uniforms(&self, values: impl IntoIterator<Item = f64>) {
        self.uniforms
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .extend(values);
    }

    pub fn push_bernoullis(&self, values: impl IntoIterator<Item = bool>) {
        self.bernoullis
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .extend(values);
    }
}

impl RandomSource for ScriptedRandom {
    fn uniform(&self, min: f64, max: f64) -> f64 {
        let next = self
            .uniforms
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front();
        match next {
            Some(value) => value.max(min).min(max),
            None => (min + max) / 2.0,
        }
    }

    fn bernoulli(&self, p: f64) -> bool {
        let next = self
            .bernoullis
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front();
        next.unwrap_or(p >= 0.5)
    }
}
