//! The two-ghost busters net: Pac-Man and ghost positions explaining two
//! noisy distance readings.

use super::{BayesNet, NetError};
use crate::factor::{Assignment, Domains, Value};
use crate::model::{Position, Walls};
use crate::sensor::{ObservationModel, SONAR_MAX_NOISE};
use std::collections::BTreeSet;

pub const PACMAN: &str = "Pacman";
pub const GHOST0: &str = "Ghost0";
pub const GHOST1: &str = "Ghost1";
pub const OBSERVATION0: &str = "Observation0";
pub const OBSERVATION1: &str = "Observation1";

const GHOSTS: [(&str, &str); 2] = [(GHOST0, OBSERVATION0), (GHOST1, OBSERVATION1)];

/// Builds the net structure with zero-filled tables.
///
/// Position variables range over every grid cell, walls included. Observation
/// variables range over every Manhattan distance between two cells widened by
/// the sonar noise on both sides and clipped at zero.
pub fn build_busters_net(walls: &Walls) -> Result<BayesNet, NetError> {
    let cells: Vec<Position> = walls.positions().collect();
    let readings = observation_domain(&cells);

    let mut domains = Domains::new();
    for variable in [PACMAN, GHOST0, GHOST1] {
        domains.insert(variable, cells.iter().copied())?;
    }
    for (_, observation) in GHOSTS {
        domains.insert(observation, readings.iter().copied())?;
    }

    BayesNet::new(
        &[PACMAN, GHOST0, GHOST1, OBSERVATION0, OBSERVATION1],
        &[
            (GHOST0, OBSERVATION0),
            (GHOST1, OBSERVATION1),
            (PACMAN, OBSERVATION0),
            (PACMAN, OBSERVATION1),
        ],
        domains,
    )
}

/// Every reading the sonar can report for agents placed on `cells`.
pub fn observation_domain(cells: &[Position]) -> Vec<u32> {
    let mut distances = BTreeSet::new();
    for pacman in cells {
        for ghost in cells {
            distances.insert(pacman.manhattan(*ghost));
        }
    }
    let (Some(&low), Some(&high)) = (distances.first(), distances.last()) else {
        return Vec::new();
    };
    let noise = SONAR_MAX_NOISE as u32;
    (low.saturating_sub(noise)..=high + noise).collect()
}

/// Fills the busters tables.
///
/// Position priors are uniform over open cells and zero on walls. Each
/// observation row is the model's likelihood over the observation domain,
/// rescaled to sum to one; rows the model gives no mass are uniform.
pub fn fill_busters_cpts(
    net: &mut BayesNet,
    walls: &Walls,
    model: &dyn ObservationModel,
) -> Result<(), NetError> {
    let open = walls.open_positions().len().max(1) as f64;
    for variable in [PACMAN, GHOST0, GHOST1] {
        let mut prior = net
            .cpt(variable)
            .ok_or_else(|| NetError::UnknownVariable {
                variable: variable.to_string(),
            })?
            .clone();
        let rows: Vec<Assignment> = prior.assignments().collect();
        for row in rows {
            let probability = match row.get(variable) {
                Some(Value::Position(cell)) if !walls.is_wall(*cell) => 1.0 / open,
                _ => 0.0,
            };
            prior.set_probability(&row, probability)?;
        }
        net.set_cpt(variable, prior)?;
    }

    let readings: Vec<u32> = net
        .domains()
        .values(OBSERVATION0)
        .unwrap_or_default()
        .iter()
        .filter_map(|value| match value {
            Value::Int(reading) => u32::try_from(*reading).ok(),
            _ => None,
        })
        .collect();
    let cells: Vec<Position> = walls.positions().collect();

    for (ghost, observation) in GHOSTS {
        let mut cpt = net
            .cpt(observation)
            .ok_or_else(|| NetError::UnknownVariable {
                variable: observation.to_string(),
            })?
            .clone();
        for pacman in &cells {
            for ghost_cell in &cells {
                let distance = pacman.manhattan(*ghost_cell);
                let likelihoods: Vec<f64> = readings
                    .iter()
                    .map(|reading| model.probability(*reading, distance))
                    .collect();
                let total: f64 = likelihoods.iter().sum();
                for (reading, likelihood) in readings.iter().zip(&likelihoods) {
                    let probability = if total > 0.0 {
                        likelihood / total
                    } else {
                        1.0 / readings.len() as f64
                    };
                    let row: Assignment = [
                        (PACMAN.to_string(), Value::Position(*pacman)),
                        (ghost.to_string(), Value::Position(*ghost_cell)),
                        (observation.to_string(), Value::from(*reading)),
                    ]
                    .into_iter()
                    .collect();
                    cpt.set_probability(&row, probability)?;
                }
            }
        }
        net.set_cpt(observation, cpt)?;
    }
    Ok(())
}
