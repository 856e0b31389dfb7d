//! Tracking a ghost's position over time from noisy sonar readings.
//!
//! This module is composed of:
//! - `distribution`: the [`DiscreteDistribution`] used for every belief.
//! - `module`: jail handling and the transition/observation model shared by all trackers.
//! - `exact`: forward-algorithm tracker over every position.
//! - `particle`: particle filter tracker.
//! - `tracker`: the [`Tracker`] enum dispatching to either variant.
//! - `telemetry`: entropy/peak/support summaries of a belief.

mod config;
mod distribution;
mod exact;
mod module;
mod particle;
pub mod telemetry;
mod tracker;

use std::fmt;

pub use config::{DEFAULT_PARTICLES, TrackerConfig};
pub use distribution::DiscreteDistribution;
pub use exact::ExactInference;
pub use module::InferenceModule;
pub use particle::ParticleFilter;
pub use telemetry::BeliefMetrics;
pub use tracker::{Tracker, TrackerKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerError {
    NoLegalPositions { ghost: usize },
    InvalidParticleCount,
}

impl fmt::Display for TrackerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackerError::NoLegalPositions { ghost } => {
                write!(f, "board has no legal position for ghost {ghost}")
            }
            TrackerError::InvalidParticleCount => {
                write!(f, "particle filter needs at least one particle")
            }
        }
    }
}

impl std::error::Error for TrackerError {}
