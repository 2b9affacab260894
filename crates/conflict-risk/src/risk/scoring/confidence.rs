use std::sync::Mutex;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::weights::round2;

pub const CONFIDENCE_MIN: f64 = 3.0;
pub const CONFIDENCE_MAX: f64 = 8.0;

/// Source of the bounded confidence-interval scalar attached to each assessment.
///
/// Implementations must return a value inside `[CONFIDENCE_MIN, CONFIDENCE_MAX]` rounded to two
/// decimals. The draw never influences the composite score or the tier.
pub trait ConfidenceSource: Send + Sync {
    fn draw(&self) -> f64;
}

/// Unseeded draws from the thread-local generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngConfidence;

impl ConfidenceSource for ThreadRngConfidence {
    fn draw(&self) -> f64 {
        round2(rand::thread_rng().gen_range(CONFIDENCE_MIN..=CONFIDENCE_MAX))
    }
}

/// Reproducible draws for tests and replayable runs.
#[derive(Debug)]
pub struct SeededConfidence {
    rng: Mutex<ChaCha8Rng>,
}

impl SeededConfidence {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }
}

impl ConfidenceSource for SeededConfidence {
    fn draw(&self) -> f64 {
        let mut rng = self
            .rng
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        round2(rng.gen_range(CONFIDENCE_MIN..=CONFIDENCE_MAX))
    }
}

/// Always returns the same value, clamped into range.
#[derive(Debug, Clone, Copy)]
pub struct FixedConfidence(pub f64);

impl ConfidenceSource for FixedConfidence {
    fn draw(&self) -> f64 {
        round2(self.0.clamp(CONFIDENCE_MIN, CONFIDENCE_MAX))
    }
}
