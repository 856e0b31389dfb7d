use super::stay_put;
use busters_core::belief::DiscreteDistribution;
use busters_core::model::{Direction, GhostContext, GhostPolicy};
use tracing::{Level, event};

pub const DEFAULT_PROB_ATTACK: f64 = 0.8;

/// Chases Pac-Man: `prob_attack` of the mass goes to the moves that minimise
/// the Manhattan distance to Pac-Man, the rest is spread over every legal move.
#[derive(Debug, Clone, Copy)]
pub struct DirectionalGhost {
    prob_attack: f64,
}

impl Default for DirectionalGhost {
    fn default() -> Self {
        Self {
            prob_attack: DEFAULT_PROB_ATTACK,
        }
    }
}

impl DirectionalGhost {
    /// `prob_attack` is clamped to `[0, 1]`.
    pub fn with_attack(prob_attack: f64) -> Self {
        let prob_attack = if prob_attack.is_finite() {
            prob_attack.clamp(0.0, 1.0)
        } else {
            DEFAULT_PROB_ATTACK
        };
        Self { prob_attack }
    }

    pub fn prob_attack(&self) -> f64 {
        self.prob_attack
    }
}

impl GhostPolicy for DirectionalGhost {
    fn name(&self) -> &'static str {
        "directional"
    }

    fn distribution(&self, ctx: &GhostContext<'_>) -> DiscreteDistribution<Direction> {
        let moves = ctx.legal_moves();
        if moves.is_empty() {
            event!(
                target: "busters_agents::directional",
                Level::TRACE,
                ghost = ctx.index,
                position = %ctx.position,
                "boxed in"
            );
            return stay_put();
        }

        let distances: Vec<u32> = moves
            .iter()
            .map(|action| action.successor(ctx.position).manhattan(ctx.pacman))
            .collect();
        let best = distances.iter().copied().min().unwrap_or(0);
        let best_count = distances.iter().filter(|d| **d == best).count() as f64;

        let spread = (1.0 - self.prob_attack) / moves.len() as f64;
        let mut dist: DiscreteDistribution<Direction> = moves
            .iter()
            .zip(&distances)
            .map(|(action, distance)| {
                let attack = if *distance == best {
                    self.prob_attack / best_count
                } else {
                    0.0
                };
                (*action, attack + spread)
            })
            .collect();
        dist.normalize();
        dist
    }
}
