//! Random sources for leader election and vote-abort draws.
//!
//! Drivers never touch a process-global RNG; they own a boxed
//! [`RandomSource`] so tests can supply a seeded or fully scripted sequence.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub trait RandomSource: Send {
    /// Generate a value in the range [0, 1).
    fn next_f64(&mut self) -> f64;

    /// Pick an index uniformly in `0..len`. `len` must be non-zero.
    fn pick(&mut self, len: usize) -> usize;
}

/// `StdRng`-backed source, reproducible when built from a seed.
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn seeded(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }

    pub fn from_entropy() -> Self {
        Self { rng: StdRng::from_entropy() }
    }

    /// Seeded when `seed` is given, entropy-backed otherwise.
    pub fn from_option(seed: Option<u64>) -> Self {
        seed.map(Self::seeded).unwrap_or_else(Self::from_entropy)
    }
}

impl RandomSource for SeededRandom {
    fn next_f64(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    fn pick(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }
}

/// Replays a fixed list of draws.
///
/// `next_f64` pops the next scripted value (falling back to `fallback` when the
/// script runs out); `pick` maps the same draw onto an index.
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    draws: VecDeque<f64>,
    fallback: f64,
}

impl ScriptedRandom {
    pub fn new(draws: impl IntoIterator<Item = f64>) -> Self {
        Self { draws: draws.into_iter().collect(), fallback: 0.999 }
    }

    /// Every draw returns `value`.
    pub fn constant(value: f64) -> Self {
        Self { draws: VecDeque::new(), fallback: value }
    }

    pub fn with_fallback(mut self, fallback: f64) -> Self {
        self.fallback = fallback;
        self
    }
}

impl RandomSource for ScriptedRandom {
    fn next_f64(&mut self) -> f64 {
        self.draws.pop_front().unwrap_or(self.fallback)
    }

    fn pick(&mut self, len: usize) -> usize {
        let draw = self.next_f64().clamp(0.0, 1.0);
        ((draw * len as f64) as usize).min(len.saturating_sub(1))
    }
}
