use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use busters_agents::sample_action;
use busters_core::belief::{BeliefMetrics, Tracker, TrackerConfig, TrackerError, TrackerKind};
use busters_core::model::{BoardSnapshot, GhostAgent, Layout, LayoutError, Position, Walls};
use busters_core::sensor::{ObservationModel, SonarModel};
use rand::seq::SliceRandom;
use rand::{Rng, RngCore, SeedableRng, rngs::StdRng};
use serde::Serialize;
use thiserror::Error;
use tracing::{Level, event};

use crate::analytics::{AnalyticsCollector, AnalyticsError};
use crate::config::{BenchmarkConfig, ResolvedOutputs};

/// Runs tracking episodes and streams per-step rows to disk.
pub struct SimulationRunner {
    config: BenchmarkConfig,
    outputs: ResolvedOutputs,
    walls: Arc<Walls>,
    pacman_start: Position,
    ghost_starts: Vec<Position>,
    logging_enabled: bool,
}

/// Summary details returned after a run.
pub struct RunSummary {
    pub episodes: usize,
    pub steps: usize,
    pub rows_written: usize,
    pub jsonl_path: PathBuf,
    pub summary_path: PathBuf,
    pub plot_path: Option<PathBuf>,
    pub telemetry_path: Option<PathBuf>,
}

impl SimulationRunner {
    /// Build a runner from a validated configuration, loading its layout.
    pub fn new(config: BenchmarkConfig, outputs: ResolvedOutputs) -> Result<Self, RunnerError> {
        let path = config.scenario.layout.clone();
        let text = fs::read_to_string(&path).map_err(|source| RunnerError::LayoutRead {
            path: path.clone(),
            source,
        })?;
        let layout = Layout::parse(&text).map_err(|source| RunnerError::Layout {
            path: path.clone(),
            source,
        })?;

        let pacman_start = layout
            .pacman_start()
            .ok_or(RunnerError::MissingPacman { path })?;

        let requested = config.scenario.ghosts.len();
        let available = layout.ghost_starts().len();
        if available < requested {
            return Err(RunnerError::GhostCount {
                requested,
                available,
            });
        }
        let ghost_starts = layout.ghost_starts()[..requested].to_vec();

        Ok(Self {
            logging_enabled: config.logging.enable_structured,
            config,
            outputs,
            walls: Arc::new(layout.into_walls()),
            pacman_start,
            ghost_starts,
        })
    }

    /// Execute every episode, streaming JSONL rows to disk.
    pub fn run(&self) -> Result<RunSummary, RunnerError> {
        ensure_parent(self.outputs.jsonl.parent())?;
        ensure_parent(self.outputs.summary_md.parent())?;
        if !self.outputs.plots_dir.as_os_str().is_empty() {
            fs::create_dir_all(&self.outputs.plots_dir)?;
        }

        let mut writer = BufWriter::new(File::create(&self.outputs.jsonl)?);
        let mut rng = StdRng::seed_from_u64(self.config.scenario.seed.unwrap_or(0));
        let mut analytics = AnalyticsCollector::new(&self.config);
        let mut rows_written = 0usize;

        for episode in 0..self.config.scenario.episodes {
            let episode_seed = rng.next_u64();
            rows_written +=
                self.play_episode(episode, episode_seed, &mut writer, &mut analytics)?;
        }

        writer.flush()?;

        let summary = analytics.finalize()?;
        summary.write_markdown(&self.outputs.summary_md)?;
        let plot_path = match summary.render_plot(&self.outputs.plots_dir) {
            Ok(path) => Some(path),
            Err(err) => {
                eprintln!("WARN: {}", err);
                None
            }
        };

        let telemetry_path = if self.logging_enabled {
            let dir = self
                .outputs
                .summary_md
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            Some(dir.join("telemetry.jsonl"))
        } else {
            None
        };

        Ok(RunSummary {
            episodes: self.config.scenario.episodes,
            steps: self.config.scenario.steps,
            rows_written,
            jsonl_path: self.outputs.jsonl.clone(),
            summary_path: self.outputs.summary_md.clone(),
            plot_path,
            telemetry_path,
        })
    }

    fn play_episode(
        &self,
        episode: usize,
        episode_seed: u64,
        writer: &mut BufWriter<File>,
        analytics: &mut AnalyticsCollector,
    ) -> Result<usize, RunnerError> {
        let mut rng = StdRng::seed_from_u64(episode_seed);
        let ghosts = self.spawn_ghosts()?;
        let mut ghost_positions = self.ghost_starts.clone();
        let mut pacman = self.pacman_start;
        let mut view = BoardSnapshot::new(Arc::clone(&self.walls), pacman);
        let mut slots = self.spawn_trackers(&ghosts, &view, &mut rng)?;

        let mut rows_written = 0usize;
        for step in 0..self.config.scenario.steps {
            let readings: Vec<Option<u32>> = ghost_positions
                .iter()
                .map(|ghost| SonarModel.noisy_distance(pacman, *ghost, &mut rng))
                .collect();
            view.set_noisy_distances(readings.clone());

            for slot in &mut slots {
                slot.tracker.observe(&view);
                let belief = slot.tracker.belief_distribution();
                let ghost = &ghosts[slot.ghost - 1];
                let truth = ghost_positions[slot.ghost - 1];
                let metrics = BeliefMetrics::from_distribution(&belief);
                let true_prob = belief.get(&truth);
                let arg_max_hit = belief.arg_max() == Some(truth);
                analytics.record(&slot.name, step, arg_max_hit, true_prob, metrics.entropy)?;

                let row = StepLogRow {
                    run_id: &self.config.run_id,
                    episode,
                    episode_seed,
                    step,
                    tracker: &slot.name,
                    kind: slot.tracker.kind(),
                    ghost: slot.ghost,
                    policy: ghost.policy().name(),
                    ghost_position: truth,
                    pacman_position: pacman,
                    reading: readings[slot.ghost - 1],
                    captured: truth == ghost.jail_position(),
                    true_prob,
                    arg_max_hit,
                    entropy: metrics.entropy,
                    peak: metrics.peak,
                    support: metrics.support,
                };
                serde_json::to_writer(&mut *writer, &row)?;
                writer.write_all(b"\n")?;
                rows_written += 1;

                if self.logging_enabled && tracing::enabled!(Level::INFO) {
                    event!(
                        target: "busters_bench::step",
                        Level::INFO,
                        run_id = %self.config.run_id,
                        episode = episode as u32,
                        step = step as u32,
                        tracker = %slot.name,
                        ghost = slot.ghost,
                        true_prob,
                        arg_max_hit,
                        entropy = metrics.entropy
                    );
                }
            }

            for slot in &mut slots {
                slot.tracker.elapse_time(&view);
            }

            move_ghosts(&ghosts, &mut ghost_positions, pacman, &self.walls, &mut rng);
            pacman = move_pacman(pacman, &self.walls, &mut rng);
            capture_ghosts(&ghosts, &mut ghost_positions, pacman);
            view.set_pacman(pacman);
        }

        Ok(rows_written)
    }

    fn spawn_ghosts(&self) -> Result<Vec<GhostAgent>, RunnerError> {
        self.config
            .scenario
            .ghosts
            .iter()
            .enumerate()
            .map(|(idx, kind)| {
                GhostAgent::new(idx + 1, kind.build())
                    .ok_or_else(|| RunnerError::game(format!("invalid ghost index {}", idx + 1)))
            })
            .collect()
    }

    /// One tracker per configured variant and ghost, each seeded from the episode stream.
    fn spawn_trackers(
        &self,
        ghosts: &[GhostAgent],
        view: &BoardSnapshot,
        rng: &mut StdRng,
    ) -> Result<Vec<TrackerSlot>, RunnerError> {
        let sensor: Arc<dyn ObservationModel> = Arc::new(SonarModel);
        let mut slots = Vec::with_capacity(self.config.trackers.len() * ghosts.len());
        for spec in &self.config.trackers {
            for ghost in ghosts {
                let tracker_config = TrackerConfig::default()
                    .with_particles(spec.particle_count())
                    .with_seed(rng.next_u64());
                let mut tracker =
                    Tracker::new(spec.kind, ghost.clone(), Arc::clone(&sensor), &tracker_config)?;
                tracker.initialize(view)?;
                slots.push(TrackerSlot {
                    name: spec.name.clone(),
                    ghost: ghost.index(),
                    tracker,
                });
            }
        }
        Ok(slots)
    }
}

fn ensure_parent(path: Option<&Path>) -> Result<(), RunnerError> {
    if let Some(dir) = path.filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

/// Every free ghost samples an action; stepping onto Pac-Man sends it to jail.
fn move_ghosts<R: Rng + ?Sized>(
    ghosts: &[GhostAgent],
    positions: &mut [Position],
    pacman: Position,
    walls: &Walls,
    rng: &mut R,
) {
    for (ghost, position) in ghosts.iter().zip(positions.iter_mut()) {
        let jail = ghost.jail_position();
        if *position == jail {
            continue;
        }
        let next = sample_action(ghost, *position, pacman, walls, rng).successor(*position);
        *position = if next == pacman { jail } else { next };
    }
}

fn move_pacman<R: Rng + ?Sized>(pacman: Position, walls: &Walls, rng: &mut R) -> Position {
    walls
        .legal_neighbors(pacman)
        .choose(rng)
        .copied()
        .unwrap_or(pacman)
}

fn capture_ghosts(ghosts: &[GhostAgent], positions: &mut [Position], pacman: Position) {
    for (ghost, position) in ghosts.iter().zip(positions.iter_mut()) {
        if *position == pacman {
            *position = ghost.jail_position();
        }
    }
}

struct TrackerSlot {
    name: String,
    ghost: usize,
    tracker: Tracker,
}

#[derive(Serialize)]
struct StepLogRow<'a> {
    run_id: &'a str,
    episode: usize,
    episode_seed: u64,
    step: usize,
    tracker: &'a str,
    kind: TrackerKind,
    ghost: usize,
    policy: &'static str,
    ghost_position: Position,
    pacman_position: Position,
    reading: Option<u32>,
    captured: bool,
    true_prob: f64,
    arg_max_hit: bool,
    entropy: f64,
    peak: f64,
    support: usize,
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to read layout {path:?}: {source}")]
    LayoutRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid layout {path:?}: {source}")]
    Layout {
        path: PathBuf,
        #[source]
        source: LayoutError,
    },
    #[error("layout {path:?} has no Pac-Man start")]
    MissingPacman { path: PathBuf },
    #[error("configuration requires {requested} ghosts but the layout places {available}")]
    GhostCount { requested: usize, available: usize },
    #[error("tracker setup failed: {0}")]
    Tracker(#[from] TrackerError),
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to serialize log row: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
    #[error("simulation failed: {message}")]
    Game { message: String },
    #[error("analytics error: {0}")]
    Analytics(#[from] AnalyticsError),
}

impl RunnerError {
    fn game(message: String) -> Self {
        RunnerError::Game { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use busters_agents::PolicyKind;
    use busters_core::belief::DiscreteDistribution;
    use busters_core::model::{Direction, GhostContext, GhostPolicy};
    use tempfile::tempdir;

    #[derive(Debug)]
    struct West;

    impl GhostPolicy for West {
        fn name(&self) -> &'static str {
            "west"
        }

        fn distribution(&self, _ctx: &GhostContext<'_>) -> DiscreteDistribution<Direction> {
            [(Direction::West, 1.0)].into_iter().collect()
        }
    }

    fn config_for(layout: &Path, ghosts: usize, out: &Path) -> BenchmarkConfig {
        let ghost_lines = "    - kind: \"random\"\n".repeat(ghosts);
        let yaml = format!(
            "run_id: \"unit\"\nscenario:\n  layout: \"{layout}\"\n  episodes: 1\n  steps: 3\n  seed: 5\n  ghosts:\n{ghost_lines}trackers:\n  - name: \"exact\"\n    kind: \"exact\"\noutputs:\n  jsonl: \"{jsonl}\"\n  summary_md: \"{summary}\"\n  plots_dir: \"{plots}\"\n",
            layout = layout.display(),
            jsonl = out.join("steps.jsonl").display(),
            summary = out.join("summary.md").display(),
            plots = out.join("plots").display(),
        );
        let mut cfg: BenchmarkConfig = serde_yaml::from_str(&yaml).expect("valid yaml");
        cfg.validate().expect("config validates");
        cfg
    }

    #[test]
    fn layout_needs_pacman() {
        let dir = tempdir().expect("temp dir");
        let layout = dir.path().join("no_pacman.lay");
        fs::write(&layout, "%%%%%\n%.G.%\n%...%\n%%%%%\n").expect("write layout");
        let cfg = config_for(&layout, 1, dir.path());
        let outputs = cfg.resolved_outputs();
        assert!(matches!(
            SimulationRunner::new(cfg, outputs),
            Err(RunnerError::MissingPacman { .. })
        ));
    }

    #[test]
    fn layout_must_place_every_ghost() {
        let dir = tempdir().expect("temp dir");
        let layout = dir.path().join("one_ghost.lay");
        fs::write(&layout, "%%%%%\n%PG.%\n%...%\n%%%%%\n").expect("write layout");
        let cfg = config_for(&layout, 2, dir.path());
        let outputs = cfg.resolved_outputs();
        assert!(matches!(
            SimulationRunner::new(cfg, outputs),
            Err(RunnerError::GhostCount {
                requested: 2,
                available: 1
            })
        ));
    }

    #[test]
    fn ghost_walking_into_pacman_is_jailed() {
        let walls = Walls::bordered(6, 5);
        let ghost = GhostAgent::new(1, Arc::new(West)).expect("ghost index");
        let mut positions = vec![Position::new(3, 3)];
        let mut rng = StdRng::seed_from_u64(1);
        move_ghosts(
            std::slice::from_ref(&ghost),
            &mut positions,
            Position::new(2, 3),
            &walls,
            &mut rng,
        );
        assert_eq!(positions[0], ghost.jail_position());

        // Jailed ghosts never leave.
        move_ghosts(
            std::slice::from_ref(&ghost),
            &mut positions,
            Position::new(4, 3),
            &walls,
            &mut rng,
        );
        assert_eq!(positions[0], ghost.jail_position());
    }

    #[test]
    fn pacman_stepping_on_ghost_captures_it() {
        let ghosts = vec![
            GhostAgent::new(1, PolicyKind::Random.build()).expect("ghost 1"),
            GhostAgent::new(2, PolicyKind::Random.build()).expect("ghost 2"),
        ];
        let mut positions = vec![Position::new(2, 2), Position::new(4, 3)];
        capture_ghosts(&ghosts, &mut positions, Position::new(4, 3));
        assert_eq!(positions, vec![Position::new(2, 2), Position::new(3, 1)]);
    }

    #[test]
    fn pacman_moves_to_an_open_neighbor() {
        let walls = Walls::bordered(5, 5);
        let mut rng = StdRng::seed_from_u64(8);
        let start = Position::new(1, 1);
        for _ in 0..50 {
            let next = move_pacman(start, &walls, &mut rng);
            assert!(walls.legal_neighbors(start).contains(&next));
        }
    }
}
