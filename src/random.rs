//! A seeded, sensor-local random stream. Every stochastic decision in the pipeline (the
//! pre-cast ray mask, positional noise, the acceptance test) draws from one of these in a
//! fixed order, so a sensor re-run with the same seed and the same inputs reproduces its
//! output exactly. Streams are independent per sensor and are not meant to be shared.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;

#[derive(Clone, Debug)]
pub struct RandomStream {
    rng: ChaCha8Rng,
}

impl RandomStream {
    /// Create a new stream from a seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Draw a uniform value in [0, 1).
    pub fn uniform(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    /// Draw from a normal distribution with the given mean and standard deviation.
    pub fn normal(&mut self, mean: f64, std_dev: f64) -> f64 {
        let z: f64 = self.rng.sample(StandardNormal);
        mean + std_dev * z
    }
}
