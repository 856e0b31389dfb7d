use super::TrackerError;
use super::config::TrackerConfig;
use super::distribution::DiscreteDistribution;
use super::module::InferenceModule;
use crate::model::{GameView, Position};
use rand::rngs::SmallRng;
use std::collections::HashMap;
use tracing::{Level, event};

/// Sampling tracker: the belief is the empirical distribution of a fixed-size
/// particle population.
#[derive(Debug, Clone)]
pub struct ParticleFilter {
    module: InferenceModule,
    num_particles: usize,
    particles: Vec<Position>,
    rng: SmallRng,
}

impl ParticleFilter {
    pub fn new(module: InferenceModule, config: &TrackerConfig) -> Result<Self, TrackerError> {
        if config.num_particles == 0 {
            return Err(TrackerError::InvalidParticleCount);
        }
        Ok(Self {
            module,
            num_particles: config.num_particles,
            particles: Vec::with_capacity(config.num_particles),
            rng: config.rng(),
        })
    }

    pub fn module(&self) -> &InferenceModule {
        &self.module
    }

    pub fn num_particles(&self) -> usize {
        self.num_particles
    }

    pub fn particles(&self) -> &[Position] {
        &self.particles
    }

    pub fn initialize(&mut self, view: &dyn GameView) -> Result<(), TrackerError> {
        self.module.initialize_positions(view)?;
        self.initialize_uniformly();
        Ok(())
    }

    /// Deterministic round-robin placement: every legal position gets
    /// `N / L` particles and the first `N % L` positions one more.
    pub fn initialize_uniformly(&mut self) {
        let legal = self.module.legal_positions();
        self.particles.clear();
        if legal.is_empty() {
            return;
        }
        let per_position = self.num_particles / legal.len();
        for position in legal {
            self.particles
                .extend(std::iter::repeat_n(*position, per_position));
        }
        let remainder = self.num_particles % legal.len();
        self.particles.extend_from_slice(&legal[..remainder]);
    }

    pub fn observe(&mut self, view: &dyn GameView) {
        if let Some(reading) = self.module.observation(view) {
            self.observe_update(reading, view);
        }
    }

    /// Reweights particles by the reading and resamples the population.
    ///
    /// A population with no weight left is placed uniformly again.
    pub fn observe_update(&mut self, observation: Option<u32>, view: &dyn GameView) {
        let pacman = view.pacman_position();
        let jail = self.module.jail_position();
        let mut weights = DiscreteDistribution::new();
        for particle in &self.particles {
            weights.add(
                *particle,
                self.module.observation_prob(observation, pacman, *particle, jail),
            );
        }

        if !(weights.total() > 0.0) {
            event!(
                target: "busters_core::particle",
                Level::INFO,
                ghost = self.module.index(),
                particles = self.num_particles,
                reading = ?observation,
                reason = "zero_weight"
            );
            self.initialize_uniformly();
            return;
        }

        weights.normalize();
        let mut resampled = Vec::with_capacity(self.num_particles);
        for _ in 0..self.num_particles {
            if let Some(position) = weights.sample(&mut self.rng) {
                resampled.push(position);
            }
        }
        self.particles = resampled;
    }

    /// Moves every particle by sampling the transition model from its cell.
    pub fn elapse_time(&mut self, view: &dyn GameView) {
        let mut transitions: HashMap<Position, DiscreteDistribution<Position>> = HashMap::new();
        let mut moved = Vec::with_capacity(self.particles.len());
        for particle in &self.particles {
            let next = transitions
                .entry(*particle)
                .or_insert_with(|| self.module.position_distribution(view, *particle));
            moved.push(next.sample(&mut self.rng).unwrap_or(*particle));
        }
        self.particles = moved;
    }

    /// Normalized particle counts.
    pub fn belief_distribution(&self) -> DiscreteDistribution<Position> {
        let mut counts: DiscreteDistribution<Position> =
            self.particles.iter().map(|particle| (*particle, 1.0)).collect();
        counts.normalize();
        counts
    }
}
