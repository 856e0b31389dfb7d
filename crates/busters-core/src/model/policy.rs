use super::direction::Direction;
use super::position::Position;
use super::walls::Walls;
use crate::belief::DiscreteDistribution;
use std::fmt;
use std::sync::Arc;

/// Situation handed to a ghost policy: the ghost is assumed to stand at `position`.
#[derive(Debug, Clone, Copy)]
pub struct GhostContext<'a> {
    pub index: usize,
    pub position: Position,
    pub pacman: Position,
    pub walls: &'a Walls,
}

impl GhostContext<'_> {
    /// Moving actions that keep the ghost off walls.
    pub fn legal_moves(&self) -> Vec<Direction> {
        self.walls.legal_moves(self.position)
    }
}

/// Action policy driving a ghost's motion.
pub trait GhostPolicy: Send + Sync + fmt::Debug {
    /// Short label used in logs and reports.
    fn name(&self) -> &'static str;

    /// Distribution over actions; probabilities must sum to 1.
    fn distribution(&self, ctx: &GhostContext<'_>) -> DiscreteDistribution<Direction>;
}

/// A ghost agent index (1-based; 0 is Pac-Man) bound to its policy.
#[derive(Debug, Clone)]
pub struct GhostAgent {
    index: usize,
    policy: Arc<dyn GhostPolicy>,
}

impl GhostAgent {
    /// Returns `None` for index 0, which belongs to Pac-Man.
    pub fn new(index: usize, policy: Arc<dyn GhostPolicy>) -> Option<Self> {
        if index == 0 {
            return None;
        }
        Some(Self { index, policy })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn policy(&self) -> &Arc<dyn GhostPolicy> {
        &self.policy
    }

    /// Absorbing cell holding this ghost once captured.
    pub fn jail_position(&self) -> Position {
        Position::new(2 * self.index as i32 - 1, 1)
    }

    pub fn action_distribution(
        &self,
        position: Position,
        pacman: Position,
        walls: &Walls,
    ) -> DiscreteDistribution<Direction> {
        let ctx = GhostContext {
            index: self.index,
            position,
            pacman,
            walls,
        };
        self.policy.distribution(&ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Frozen;

    impl GhostPolicy for Frozen {
        fn name(&self) -> &'static str {
            "frozen"
        }

        fn distribution(&self, _ctx: &GhostContext<'_>) -> DiscreteDistribution<Direction> {
            [(Direction::Stop, 1.0)].into_iter().collect()
        }
    }

    #[test]
    fn pacman_index_is_rejected() {
        assert!(GhostAgent::new(0, Arc::new(Frozen)).is_none());
    }

    #[test]
    fn jail_cells_are_distinct_per_ghost() {
        let first = GhostAgent::new(1, Arc::new(Frozen)).unwrap();
        let second = GhostAgent::new(2, Arc::new(Frozen)).unwrap();
        assert_eq!(first.jail_position(), Position::new(1, 1));
        assert_eq!(second.jail_position(), Position::new(3, 1));
    }
}
