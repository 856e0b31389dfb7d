use super::TrackerError;
use super::distribution::DiscreteDistribution;
use super::module::InferenceModule;
use crate::model::{GameView, Position};
use tracing::{Level, event};

/// Forward-algorithm tracker holding the full belief over every position.
#[derive(Debug, Clone)]
pub struct ExactInference {
    module: InferenceModule,
    beliefs: DiscreteDistribution<Position>,
}

impl ExactInference {
    pub fn new(module: InferenceModule) -> Self {
        Self {
            module,
            beliefs: DiscreteDistribution::new(),
        }
    }

    pub fn module(&self) -> &InferenceModule {
        &self.module
    }

    pub fn initialize(&mut self, view: &dyn GameView) -> Result<(), TrackerError> {
        self.module.initialize_positions(view)?;
        self.initialize_uniformly();
        Ok(())
    }

    /// Uniform belief over the legal positions; the jail starts empty.
    pub fn initialize_uniformly(&mut self) {
        self.beliefs = self
            .module
            .legal_positions()
            .iter()
            .map(|position| (*position, 1.0))
            .collect();
        self.beliefs.normalize();
    }

    pub fn observe(&mut self, view: &dyn GameView) {
        if let Some(reading) = self.module.observation(view) {
            self.observe_update(reading, view);
        }
    }

    /// Bayes update of every position with the likelihood of `observation`.
    ///
    /// When no position is consistent with the reading the belief falls back
    /// to uniform over the legal positions. A plain renormalize would leave
    /// the all-zero belief in place instead.
    pub fn observe_update(&mut self, observation: Option<u32>, view: &dyn GameView) {
        let pacman = view.pacman_position();
        let jail = self.module.jail_position();
        for position in self.module.all_positions() {
            let prior = self.beliefs.get(position);
            let likelihood = self.module.observation_prob(observation, pacman, *position, jail);
            self.beliefs.set(*position, prior * likelihood);
        }

        if self.beliefs.total() > 0.0 {
            self.beliefs.normalize();
            return;
        }

        event!(
            target: "busters_core::exact",
            Level::INFO,
            ghost = self.module.index(),
            positions = self.module.legal_positions().len(),
            reading = ?observation,
            reason = "zero_posterior"
        );
        self.initialize_uniformly();
    }

    /// One step of the transition model applied to the whole belief.
    pub fn elapse_time(&mut self, view: &dyn GameView) {
        let mut predicted = DiscreteDistribution::new();
        for position in self.module.all_positions() {
            let mass = self.beliefs.get(position);
            if mass == 0.0 {
                continue;
            }
            for (next, prob) in &self.module.position_distribution(view, *position) {
                predicted.add(*next, mass * prob);
            }
        }
        predicted.normalize();
        self.beliefs = predicted;
    }

    pub fn belief_distribution(&self) -> &DiscreteDistribution<Position> {
        &self.beliefs
    }
}
