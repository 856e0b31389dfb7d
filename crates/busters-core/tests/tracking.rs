use busters_core::belief::{
    BeliefMetrics, DiscreteDistribution, Tracker, TrackerConfig, TrackerKind,
};
use busters_core::model::{
    BoardSnapshot, Direction, GhostAgent, GhostContext, GhostPolicy, Layout, Position,
};
use busters_core::sensor::SonarModel;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::sync::Arc;

const MAZE: &str = "\
%%%%%%%%%
%P......%
%.%%.%%.%
%...G...%
%.%%.%%.%
%.......%
%%%%%%%%%
%%%%%%%%%
";

#[derive(Debug)]
struct Wander;

impl GhostPolicy for Wander {
    fn name(&self) -> &'static str {
        "wander"
    }

    fn distribution(&self, ctx: &GhostContext<'_>) -> DiscreteDistribution<Direction> {
        let moves = ctx.legal_moves();
        if moves.is_empty() {
            return [(Direction::Stop, 1.0)].into_iter().collect();
        }
        let share = 1.0 / moves.len() as f64;
        moves.into_iter().map(|action| (action, share)).collect()
    }
}

fn total_variation(a: &DiscreteDistribution<Position>, b: &DiscreteDistribution<Position>) -> f64 {
    let keys: std::collections::BTreeSet<Position> = a.keys().chain(b.keys()).copied().collect();
    keys.iter().map(|key| (a.get(key) - b.get(key)).abs()).sum::<f64>() / 2.0
}

#[test]
fn particle_filter_approximates_exact_tracker() {
    let layout: Layout = MAZE.parse().expect("maze parses");
    let walls = Arc::new(layout.walls().clone());
    let pacman = layout.pacman_start().expect("pacman placed");
    let mut ghost_position = layout.ghost_starts()[0];

    let policy: Arc<dyn GhostPolicy> = Arc::new(Wander);
    let ghost = GhostAgent::new(1, Arc::clone(&policy)).expect("ghost index");
    let sensor = Arc::new(SonarModel);
    let config = TrackerConfig::default().with_particles(4000).with_seed(77);

    let mut exact = Tracker::new(TrackerKind::Exact, ghost.clone(), sensor.clone(), &config)
        .expect("exact tracker");
    let mut particle = Tracker::new(TrackerKind::Particle, ghost.clone(), sensor.clone(), &config)
        .expect("particle tracker");

    let mut view = BoardSnapshot::new(Arc::clone(&walls), pacman);
    exact.initialize(&view).expect("legal cells");
    particle.initialize(&view).expect("legal cells");

    let mut world = SmallRng::seed_from_u64(1234);
    for step in 0..8 {
        let reading = SonarModel.noisy_distance(pacman, ghost_position, &mut world);
        view.set_noisy_distances(vec![reading]);

        exact.observe(&view);
        particle.observe(&view);

        let exact_belief = exact.belief_distribution();
        let particle_belief = particle.belief_distribution();
        assert!((exact_belief.total() - 1.0).abs() < 1e-9);
        assert!((particle_belief.total() - 1.0).abs() < 1e-9);
        let distance = total_variation(&exact_belief, &particle_belief);
        assert!(distance < 0.2, "step {step}: total variation {distance}");

        exact.elapse_time(&view);
        particle.elapse_time(&view);

        let action = ghost
            .action_distribution(ghost_position, pacman, &walls)
            .sample(&mut world)
            .expect("policy has mass");
        let next = action.successor(ghost_position);
        if next != pacman {
            ghost_position = next;
        }
    }
}

#[test]
fn exact_belief_sharpens_with_readings() {
    let layout: Layout = MAZE.parse().expect("maze parses");
    let walls = Arc::new(layout.walls().clone());
    let pacman = layout.pacman_start().expect("pacman placed");
    let ghost_position = Position::new(7, 5);

    let ghost = GhostAgent::new(1, Arc::new(Wander)).expect("ghost index");
    let mut tracker = Tracker::new(
        TrackerKind::Exact,
        ghost,
        Arc::new(SonarModel),
        &TrackerConfig::default(),
    )
    .expect("exact tracker");
    let view = BoardSnapshot::new(walls, pacman)
        .with_noisy_distances(vec![Some(pacman.manhattan(ghost_position))]);
    tracker.initialize(&view).expect("legal cells");

    let before = BeliefMetrics::from_distribution(&tracker.belief_distribution());
    tracker.observe(&view);
    let after = BeliefMetrics::from_distribution(&tracker.belief_distribution());
    assert!(after.entropy < before.entropy);
    assert!(after.peak > before.peak);
    assert!(tracker.belief_distribution().get(&ghost_position) > 1.0 / before.support as f64);
}

#[test]
fn second_ghost_without_reading_is_not_updated() {
    let layout: Layout = MAZE.parse().expect("maze parses");
    let walls = Arc::new(layout.walls().clone());
    let pacman = layout.pacman_start().expect("pacman placed");

    let ghost = GhostAgent::new(2, Arc::new(Wander)).expect("ghost index");
    let mut tracker = Tracker::new(
        TrackerKind::Particle,
        ghost,
        Arc::new(SonarModel),
        &TrackerConfig::default().with_seed(5),
    )
    .expect("particle tracker");
    let view = BoardSnapshot::new(walls, pacman).with_noisy_distances(vec![Some(4)]);
    tracker.initialize(&view).expect("legal cells");

    let before = tracker.belief_distribution();
    tracker.observe(&view);
    assert_eq!(tracker.belief_distribution(), before);
}
