use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;

/// Source of the integer jitter added to fine-positioning deadlines.
pub trait JitterSource: Send {
    /// Uniform sample from `low..=high`.
    fn sample(&mut self, low: i32, high: i32) -> i32;
}

pub struct SeededJitter {
    rng: ChaCha12Rng,
}

impl SeededJitter {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha12Rng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha12Rng::from_entropy(),
        }
    }

    pub fn from_optional_seed(seed: Option<u64>) -> Self {
        seed.map(Self::from_seed).unwrap_or_else(Self::from_entropy)
    }
}

impl JitterSource for SeededJitter {
    fn sample(&mut self, low: i32, high: i32) -> i32 {
        if low >= high {
            return low;
        }
        self.rng.gen_range(low..=high)
    }
}

/// Always returns the same offset, clamped into the requested range.
pub struct FixedJitter(pub i32);

impl JitterSource for FixedJitter {
    fn sample(&mut self, low: i32, high: i32) -> i32 {
        self.0.clamp(low, high.max(low))
    }
}
