use super::distribution::DiscreteDistribution;
use super::TrackerError;
use crate::model::{Direction, GameView, GhostAgent, Position};
use crate::sensor::ObservationModel;
use std::sync::Arc;

/// State and helpers shared by every tracker of one ghost.
///
/// Holds the ghost being tracked, the sensor model, and the candidate
/// positions computed at initialization. The jail cell is an absorbing state:
/// a jailed ghost stays there and only ever produces an empty reading.
#[derive(Debug, Clone)]
pub struct InferenceModule {
    ghost: GhostAgent,
    sensor: Arc<dyn ObservationModel>,
    legal_positions: Vec<Position>,
    all_positions: Vec<Position>,
}

impl InferenceModule {
    pub fn new(ghost: GhostAgent, sensor: Arc<dyn ObservationModel>) -> Self {
        Self {
            ghost,
            sensor,
            legal_positions: Vec::new(),
            all_positions: Vec::new(),
        }
    }

    pub fn ghost(&self) -> &GhostAgent {
        &self.ghost
    }

    pub fn index(&self) -> usize {
        self.ghost.index()
    }

    pub fn jail_position(&self) -> Position {
        self.ghost.jail_position()
    }

    /// Open cells above the jail row, column by column.
    pub fn legal_positions(&self) -> &[Position] {
        &self.legal_positions
    }

    /// Legal positions followed by the jail cell.
    pub fn all_positions(&self) -> &[Position] {
        &self.all_positions
    }

    pub(crate) fn initialize_positions(&mut self, view: &dyn GameView) -> Result<(), TrackerError> {
        let legal: Vec<Position> = view
            .legal_positions()
            .into_iter()
            .filter(|position| position.y > 1)
            .collect();
        if legal.is_empty() {
            return Err(TrackerError::NoLegalPositions {
                ghost: self.index(),
            });
        }
        self.all_positions = legal.clone();
        self.all_positions.push(self.jail_position());
        self.legal_positions = legal;
        Ok(())
    }

    /// Reading for this ghost, if the view carries one.
    ///
    /// The outer `None` means no reading slot exists for this ghost and the
    /// observation step should be skipped. An inner `None` is an empty reading,
    /// which only a jailed ghost produces.
    pub fn observation(&self, view: &dyn GameView) -> Option<Option<u32>> {
        view.noisy_distances().get(self.index() - 1).copied()
    }

    /// `P(noisy | pacman, ghost)` with the jail handled as a perfectly observed state.
    pub fn observation_prob(
        &self,
        noisy: Option<u32>,
        pacman: Position,
        ghost: Position,
        jail: Position,
    ) -> f64 {
        if ghost == jail {
            return if noisy.is_none() { 1.0 } else { 0.0 };
        }
        match noisy {
            None => 0.0,
            Some(reading) => self.sensor.probability(reading, pacman.manhattan(ghost)),
        }
    }

    /// Distribution over where the ghost will be next step given it stands at `position`.
    ///
    /// Accounts for Pac-Man possibly stepping onto the ghost (sending it to
    /// jail) both at its current cell and at each successor cell.
    pub fn position_distribution(
        &self,
        view: &dyn GameView,
        position: Position,
    ) -> DiscreteDistribution<Position> {
        let jail = self.jail_position();
        let pacman = view.pacman_position();
        let mut next = DiscreteDistribution::new();
        if pacman == position || position == jail {
            next.set(jail, 1.0);
            return next;
        }

        let walls = view.walls();
        let pacman_successors = walls.legal_neighbors(pacman);
        let mult = if pacman_successors.contains(&position) {
            1.0 / pacman_successors.len() as f64
        } else {
            0.0
        };
        if mult > 0.0 {
            next.add(jail, mult);
        }

        let mut actions = self.ghost.action_distribution(position, pacman, walls);
        if actions.is_empty() {
            actions.set(Direction::Stop, 1.0);
        }
        let choices = actions.len() as f64;
        for (action, prob) in &actions {
            let successor = action.successor(position);
            if pacman_successors.contains(&successor) {
                next.add(jail, prob / choices * (1.0 - mult));
                next.add(successor, prob * (choices - 1.0) / choices * (1.0 - mult));
            } else {
                next.add(successor, prob * (1.0 - mult));
            }
        }
        next
    }
}
