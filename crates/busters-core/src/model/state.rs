use super::position::Position;
use super::walls::Walls;
use std::sync::Arc;

/// Read-only view of the board that trackers consume.
pub trait GameView {
    fn walls(&self) -> &Walls;

    fn pacman_position(&self) -> Position;

    /// Noisy distance readings for this time step, one per ghost agent index
    /// starting at 1. `None` means the ghost produced no reading (captured).
    /// The slice may be shorter than the number of ghosts.
    fn noisy_distances(&self) -> &[Option<u32>];

    fn legal_positions(&self) -> Vec<Position> {
        self.walls().open_positions()
    }
}

/// Minimal owned board state implementing [`GameView`].
#[derive(Debug, Clone)]
pub struct BoardSnapshot {
    walls: Arc<Walls>,
    pacman: Position,
    noisy_distances: Vec<Option<u32>>,
}

impl BoardSnapshot {
    pub fn new(walls: Arc<Walls>, pacman: Position) -> Self {
        Self {
            walls,
            pacman,
            noisy_distances: Vec::new(),
        }
    }

    pub fn with_noisy_distances(mut self, readings: Vec<Option<u32>>) -> Self {
        self.noisy_distances = readings;
        self
    }

    pub fn set_pacman(&mut self, position: Position) {
        self.pacman = position;
    }

    pub fn set_noisy_distances(&mut self, readings: Vec<Option<u32>>) {
        self.noisy_distances = readings;
    }

    pub fn shared_walls(&self) -> &Arc<Walls> {
        &self.walls
    }
}

impl GameView for BoardSnapshot {
    fn walls(&self) -> &Walls {
        &self.walls
    }

    fn pacman_position(&self) -> Position {
        self.pacman
    }

    fn noisy_distances(&self) -> &[Option<u32>] {
        &self.noisy_distances
    }
}
