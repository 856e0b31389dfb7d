use super::stay_put;
use busters_core::belief::DiscreteDistribution;
use busters_core::model::{Direction, GhostContext, GhostPolicy};
use tracing::{Level, event};

/// Picks uniformly among the moves that do not run into a wall.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomGhost;

impl GhostPolicy for RandomGhost {
    fn name(&self) -> &'static str {
        "random"
    }

    fn distribution(&self, ctx: &GhostContext<'_>) -> DiscreteDistribution<Direction> {
        let moves = ctx.legal_moves();
        if moves.is_empty() {
            event!(
                target: "busters_agents::random",
                Level::TRACE,
                ghost = ctx.index,
                position = %ctx.position,
                "boxed in"
            );
            return stay_put();
        }
        let share = 1.0 / moves.len() as f64;
        moves.into_iter().map(|action| (action, share)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use busters_core::model::{Position, Walls};

    #[test]
    fn spreads_mass_over_open_moves() {
        let walls = Walls::bordered(5, 5);
        let ctx = GhostContext {
            index: 1,
            position: Position::new(2, 1),
            pacman: Position::new(3, 3),
            walls: &walls,
        };
        let dist = RandomGhost.distribution(&ctx);
        assert_eq!(dist.len(), 3);
        for action in [Direction::North, Direction::East, Direction::West] {
            assert!((dist.get(&action) - 1.0 / 3.0).abs() < 1e-12);
        }
        assert_eq!(dist.get(&Direction::Stop), 0.0);
    }
}
