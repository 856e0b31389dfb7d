mod directional;
mod random;

pub use directional::DirectionalGhost;
pub use random::RandomGhost;

use busters_core::belief::DiscreteDistribution;
use busters_core::model::{Direction, GhostAgent, GhostPolicy, Position, Walls};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Named ghost behaviours selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PolicyKind {
    Random,
    Directional {
        #[serde(default = "default_attack")]
        prob_attack: f64,
    },
}

fn default_attack() -> f64 {
    directional::DEFAULT_PROB_ATTACK
}

impl PolicyKind {
    pub fn build(self) -> Arc<dyn GhostPolicy> {
        match self {
            PolicyKind::Random => Arc::new(RandomGhost),
            PolicyKind::Directional { prob_attack } => {
                Arc::new(DirectionalGhost::with_attack(prob_attack))
            }
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyKind::Random => f.write_str("random"),
            PolicyKind::Directional { prob_attack } => write!(f, "directional({prob_attack})"),
        }
    }
}

/// Samples the ghost's next action at `position`; a policy without mass stops.
pub fn sample_action<R: Rng + ?Sized>(
    ghost: &GhostAgent,
    position: Position,
    pacman: Position,
    walls: &Walls,
    rng: &mut R,
) -> Direction {
    ghost
        .action_distribution(position, pacman, walls)
        .sample(rng)
        .unwrap_or(Direction::Stop)
}

/// Point mass on `Stop`, used when a ghost is boxed in.
fn stay_put() -> DiscreteDistribution<Direction> {
    [(Direction::Stop, 1.0)].into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn kinds_deserialize_with_defaults() {
        let kind: PolicyKind = serde_json::from_str(r#"{"kind":"directional"}"#).unwrap();
        assert_eq!(
            kind,
            PolicyKind::Directional {
                prob_attack: directional::DEFAULT_PROB_ATTACK
            }
        );
        let kind: PolicyKind =
            serde_json::from_str(r#"{"kind":"directional","prob_attack":0.5}"#).unwrap();
        assert_eq!(kind, PolicyKind::Directional { prob_attack: 0.5 });
        let kind: PolicyKind = serde_json::from_str(r#"{"kind":"random"}"#).unwrap();
        assert_eq!(kind, PolicyKind::Random);
    }

    #[test]
    fn sampled_actions_are_legal() {
        let walls = Walls::bordered(5, 5);
        let ghost = GhostAgent::new(1, PolicyKind::Random.build()).unwrap();
        let mut rng = SmallRng::seed_from_u64(12);
        let corner = Position::new(1, 1);
        for _ in 0..50 {
            let action = sample_action(&ghost, corner, Position::new(3, 3), &walls, &mut rng);
            assert!(matches!(action, Direction::North | Direction::East));
        }
    }

    #[test]
    fn boxed_in_ghost_stops() {
        let walls = Walls::bordered(3, 3);
        let mut rng = SmallRng::seed_from_u64(1);
        for kind in [
            PolicyKind::Random,
            PolicyKind::Directional { prob_attack: 0.8 },
        ] {
            let ghost = GhostAgent::new(1, kind.build()).unwrap();
            let cell = Position::new(1, 1);
            let action = sample_action(&ghost, cell, cell, &walls, &mut rng);
            assert_eq!(action, Direction::Stop, "{kind}");
        }
    }
}
