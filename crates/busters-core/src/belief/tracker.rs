use super::TrackerError;
use super::config::TrackerConfig;
use super::distribution::DiscreteDistribution;
use super::exact::ExactInference;
use super::module::InferenceModule;
use super::particle::ParticleFilter;
use crate::model::{GameView, GhostAgent, Position};
use crate::sensor::ObservationModel;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackerKind {
    Exact,
    Particle,
}

impl fmt::Display for TrackerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackerKind::Exact => f.write_str("exact"),
            TrackerKind::Particle => f.write_str("particle"),
        }
    }
}

/// A belief tracker for one ghost.
///
/// Lifecycle: `initialize`, then any number of `observe` / `elapse_time`
/// rounds, reading `belief_distribution` in between.
#[derive(Debug, Clone)]
pub enum Tracker {
    Exact(ExactInference),
    Particle(ParticleFilter),
}

impl Tracker {
    pub fn new(
        kind: TrackerKind,
        ghost: GhostAgent,
        sensor: Arc<dyn ObservationModel>,
        config: &TrackerConfig,
    ) -> Result<Self, TrackerError> {
        let module = InferenceModule::new(ghost, sensor);
        Ok(match kind {
            TrackerKind::Exact => Tracker::Exact(ExactInference::new(module)),
            TrackerKind::Particle => Tracker::Particle(ParticleFilter::new(module, config)?),
        })
    }

    pub fn kind(&self) -> TrackerKind {
        match self {
            Tracker::Exact(_) => TrackerKind::Exact,
            Tracker::Particle(_) => TrackerKind::Particle,
        }
    }

    pub fn module(&self) -> &InferenceModule {
        match self {
            Tracker::Exact(tracker) => tracker.module(),
            Tracker::Particle(tracker) => tracker.module(),
        }
    }

    pub fn initialize(&mut self, view: &dyn GameView) -> Result<(), TrackerError> {
        match self {
            Tracker::Exact(tracker) => tracker.initialize(view),
            Tracker::Particle(tracker) => tracker.initialize(view),
        }
    }

    pub fn observe(&mut self, view: &dyn GameView) {
        match self {
            Tracker::Exact(tracker) => tracker.observe(view),
            Tracker::Particle(tracker) => tracker.observe(view),
        }
    }

    pub fn elapse_time(&mut self, view: &dyn GameView) {
        match self {
            Tracker::Exact(tracker) => tracker.elapse_time(view),
            Tracker::Particle(tracker) => tracker.elapse_time(view),
        }
    }

    /// Current normalized belief over ghost positions.
    pub fn belief_distribution(&self) -> DiscreteDistribution<Position> {
        match self {
            Tracker::Exact(tracker) => tracker.belief_distribution().clone(),
            Tracker::Particle(tracker) => tracker.belief_distribution(),
        }
    }
}
