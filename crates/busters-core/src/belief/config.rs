use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PARTICLES: usize = 300;

/// Tunables shared by the tracker variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Particle population size. Ignored by the exact tracker.
    pub num_particles: usize,
    /// Seed for the tracker's sampler; `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            num_particles: DEFAULT_PARTICLES,
            seed: None,
        }
    }
}

impl TrackerConfig {
    /// Reads `BUSTERS_PARTICLES` and `BUSTERS_SEED`; unparsable values keep the default.
    pub fn from_env() -> Self {
        Self::from_reader(|key| std::env::var(key).ok())
    }

    pub fn with_particles(mut self, num_particles: usize) -> Self {
        self.num_particles = num_particles;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub(crate) fn rng(&self) -> SmallRng {
        match self.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        }
    }

    fn from_reader<F>(mut read: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let base = Self::default();
        let num_particles = read("BUSTERS_PARTICLES")
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .map(|count| count.max(1))
            .unwrap_or(base.num_particles);
        let seed = read("BUSTERS_SEED")
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .or(base.seed);
        Self {
            num_particles,
            seed,
        }
    }
}
