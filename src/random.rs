//! Random selection used when sampling questions and answer positions

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of the two random decisions quiz assembly makes
pub trait RandomSource {
    /// Uniformly pick an index in `0..len`. `len` must be non-zero.
    fn pick_index(&mut self, len: usize) -> usize;

    /// Uniformly pick an integer in `low..=high`
    fn int_in_range(&mut self, low: u8, high: u8) -> u8;

    /// Slot (1-4) for the correct answer
    fn correct_position(&mut self) -> u8 {
        self.int_in_range(1, 4)
    }
}

/// `StdRng`-backed source, seeded from entropy or from a fixed seed
pub struct StdRandom {
    rng: StdRng,
}

impl StdRandom {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seeded when a seed is configured, otherwise from entropy
    pub fn from_optional_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::from_seed(seed),
            None => Self::from_entropy(),
        }
    }
}

impl RandomSource for StdRandom {
    fn pick_index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }

    fn int_in_range(&mut self, low: u8, high: u8) -> u8 {
        self.rng.gen_range(low..=high)
    }
}
