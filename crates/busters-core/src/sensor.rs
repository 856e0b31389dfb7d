//! Noisy sonar readings of the distance between Pac-Man and a ghost.

use crate::model::Position;
use rand::Rng;
use std::fmt;

/// Largest absolute error the sonar adds to a true distance.
pub const SONAR_MAX_NOISE: i32 = 7;

/// `2^7 + 2^8 - 2`, the total weight of the noise values `-7..=7`.
const SONAR_DENOMINATOR: f64 = 382.0;

/// Likelihood of a noisy reading given the true Manhattan distance.
pub trait ObservationModel: Send + Sync + fmt::Debug {
    fn probability(&self, noisy_distance: u32, true_distance: u32) -> f64;
}

/// Sonar with symmetric, geometrically decaying error.
#[derive(Debug, Clone, Copy, Default)]
pub struct SonarModel;

impl SonarModel {
    /// `(error, probability)` pairs; the error `e` has weight `2^(7 - |e|) / 382`.
    pub fn noise() -> impl Iterator<Item = (i32, f64)> {
        (-SONAR_MAX_NOISE..=SONAR_MAX_NOISE).map(|error| {
            let weight = f64::from(1u32 << (SONAR_MAX_NOISE - error.abs()) as u32);
            (error, weight / SONAR_DENOMINATOR)
        })
    }

    /// Samples a reading for a ghost at `ghost`. Ghosts in the jail row read nothing.
    pub fn noisy_distance<R: Rng + ?Sized>(
        &self,
        pacman: Position,
        ghost: Position,
        rng: &mut R,
    ) -> Option<u32> {
        if ghost.y == 1 {
            return None;
        }
        let distance = pacman.manhattan(ghost) as i32;
        let draw: f64 = rng.r#gen();
        let mut cumulative = 0.0;
        let mut error = SONAR_MAX_NOISE;
        for (candidate, prob) in Self::noise() {
            cumulative += prob;
            if draw < cumulative {
                error = candidate;
                break;
            }
        }
        Some((distance + error).max(0) as u32)
    }
}

impl ObservationModel for SonarModel {
    fn probability(&self, noisy_distance: u32, true_distance: u32) -> f64 {
        let noisy = noisy_distance as i32;
        Self::noise()
            .filter(|(error, _)| (noisy - error).max(1) == true_distance as i32)
            .map(|(_, prob)| prob)
            .sum()
    }
}
