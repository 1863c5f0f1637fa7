//! The single source of randomness the core consumes.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub trait RandomSource {
    /// Uniform sample in `[0, 1)`.
    fn unit(&mut self) -> f32;

    /// Uniform index in `0..len`. `len` is never zero.
    fn index(&mut self, len: usize) -> usize;

    fn chance(&mut self, probability: f32) -> bool {
        self.unit() < probability
    }
}

/// `StdRng` behind the [`RandomSource`] seam; the same seed replays the same
/// session.
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl RandomSource for SeededRandom {
    fn unit(&mut self) -> f32 {
        self.rng.gen::<f32>()
    }

    fn index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }
}

/// Replays a fixed script of draws. Once the script runs dry it answers
/// `fallback_unit` and index 0, so a harness never panics on an extra draw.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    units: VecDeque<f32>,
    indices: VecDeque<usize>,
    fallback_unit: f32,
}

impl ScriptedRandom {
    pub fn new(units: impl IntoIterator<Item = f32>, indices: impl IntoIterator<Item = usize>) -> Self {
        Self {
            units: units.into_iter().collect(),
            indices: indices.into_iter().collect(),
            fallback_unit: 0.99,
        }
    }

    /// Every decision wanders and always takes the first candidate.
    pub fn wander() -> Self {
        Self {
            fallback_unit: 0.99,
            ..Self::default()
        }
    }

    /// Every decision pursues.
    pub fn pursue() -> Self {
        Self {
            fallback_unit: 0.0,
            ..Self::default()
        }
    }
}

impl RandomSource for ScriptedRandom {
    fn unit(&mut self) -> f32 {
        self.units.pop_front().unwrap_or(self.fallback_unit)
    }

    fn index(&mut self, len: usize) -> usize {
        self.indices.pop_front().unwrap_or(0).min(len - 1)
    }
}
