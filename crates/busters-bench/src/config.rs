use busters_agents::PolicyKind;
use busters_core::belief::{DEFAULT_PARTICLES, TrackerConfig, TrackerKind};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Level;

const RUN_ID_ALLOWED: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789._-";

/// Root benchmark configuration loaded from YAML.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BenchmarkConfig {
    pub run_id: String,
    pub scenario: ScenarioConfig,
    pub trackers: Vec<TrackerSpec>,
    pub outputs: OutputsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BenchmarkConfig {
    /// Load configuration from a YAML file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_buf = path.to_path_buf();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            source,
            path: path_buf.clone(),
        })?;
        let reader = BufReader::new(file);
        let mut cfg: BenchmarkConfig =
            serde_yaml::from_reader(reader).map_err(|source| ConfigError::Parse {
                source,
                path: path_buf.clone(),
            })?;
        cfg.validate().map_err(|source| ConfigError::Invalid {
            path: path_buf,
            source,
        })?;
        Ok(cfg)
    }

    /// Validate the configuration without performing I/O.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        validate_run_id(&self.run_id)?;
        self.scenario.validate()?;
        self.outputs.validate(&self.run_id)?;
        self.logging.normalize();
        validate_trackers(&mut self.trackers)?;
        Ok(())
    }

    /// Fills particle counts and the scenario seed the YAML leaves unset.
    pub fn apply_tracker_defaults(&mut self, defaults: TrackerConfig) {
        for tracker in &mut self.trackers {
            if tracker.kind == TrackerKind::Particle {
                tracker.particles.get_or_insert(defaults.num_particles);
            }
        }
        if self.scenario.seed.is_none() {
            self.scenario.seed = defaults.seed;
        }
    }

    /// Resolve output templates (`{run_id}` placeholders) into concrete paths.
    pub fn resolved_outputs(&self) -> ResolvedOutputs {
        ResolvedOutputs {
            jsonl: resolve_template(&self.run_id, &self.outputs.jsonl),
            summary_md: resolve_template(&self.run_id, &self.outputs.summary_md),
            plots_dir: resolve_template(&self.run_id, &self.outputs.plots_dir),
        }
    }
}

/// Board, episode count and ghost line-up.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ScenarioConfig {
    /// Path to a text layout (`%` walls, `P` Pac-Man, `G` ghosts).
    pub layout: PathBuf,
    pub episodes: usize,
    pub steps: usize,
    pub seed: Option<u64>,
    /// One policy per ghost, in agent-index order.
    pub ghosts: Vec<PolicyKind>,
}

impl ScenarioConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.layout.as_os_str().is_empty() {
            return Err(ValidationError::InvalidField {
                field: "scenario.layout".to_string(),
                message: "layout path must not be empty".to_string(),
            });
        }

        if self.episodes == 0 {
            return Err(ValidationError::InvalidField {
                field: "scenario.episodes".to_string(),
                message: "number of episodes must be greater than zero".to_string(),
            });
        }

        if self.steps == 0 {
            return Err(ValidationError::InvalidField {
                field: "scenario.steps".to_string(),
                message: "steps per episode must be greater than zero".to_string(),
            });
        }

        if self.ghosts.is_empty() {
            return Err(ValidationError::InvalidField {
                field: "scenario.ghosts".to_string(),
                message: "at least one ghost must be specified".to_string(),
            });
        }

        for (idx, ghost) in self.ghosts.iter().enumerate() {
            if let PolicyKind::Directional { prob_attack } = ghost
                && !(0.0..=1.0).contains(prob_attack)
            {
                return Err(ValidationError::InvalidField {
                    field: format!("scenario.ghosts[{idx}].prob_attack"),
                    message: format!("attack probability {prob_attack} is outside [0, 1]"),
                });
            }
        }

        Ok(())
    }
}

/// A tracker variant run against every ghost.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TrackerSpec {
    pub name: String,
    pub kind: TrackerKind,
    #[serde(default)]
    pub particles: Option<usize>,
}

impl TrackerSpec {
    /// Population size for particle trackers; the exact tracker ignores it.
    pub fn particle_count(&self) -> usize {
        self.particles.unwrap_or(DEFAULT_PARTICLES)
    }
}

/// Output artifact configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OutputsConfig {
    pub jsonl: String,
    pub summary_md: String,
    pub plots_dir: String,
}

impl OutputsConfig {
    fn validate(&self, run_id: &str) -> Result<(), ValidationError> {
        for (label, value) in [
            ("outputs.jsonl", &self.jsonl),
            ("outputs.summary_md", &self.summary_md),
            ("outputs.plots_dir", &self.plots_dir),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::InvalidField {
                    field: label.to_string(),
                    message: "path must not be empty".to_string(),
                });
            }

            let resolved = resolve_template(run_id, value);
            if resolved.components().count() == 0 {
                return Err(ValidationError::InvalidField {
                    field: label.to_string(),
                    message: "resolved path is invalid".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Logging configuration defaults to disabled structured logs.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enable_structured: bool,
    #[serde(default = "default_tracing_level")]
    pub tracing_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_structured: false,
            tracing_level: default_tracing_level(),
        }
    }
}

impl LoggingConfig {
    fn normalize(&mut self) {
        if self.tracing_level.trim().is_empty() {
            self.tracing_level = default_tracing_level();
        }
    }

    pub fn level(&self) -> Option<Level> {
        match self.tracing_level.to_ascii_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" | "warning" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }
}

fn default_tracing_level() -> String {
    "info".to_string()
}

fn validate_run_id(run_id: &str) -> Result<(), ValidationError> {
    if run_id.trim().is_empty() {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id must not be empty".to_string(),
        });
    }

    if !run_id.chars().all(|c| RUN_ID_ALLOWED.contains(c)) {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id may only contain alphanumeric characters, '.', '_' or '-'".to_string(),
        });
    }

    Ok(())
}

fn validate_trackers(trackers: &mut [TrackerSpec]) -> Result<(), ValidationError> {
    if trackers.is_empty() {
        return Err(ValidationError::InvalidField {
            field: "trackers".to_string(),
            message: "at least one tracker must be specified".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for tracker in trackers.iter_mut() {
        if tracker.name.trim().is_empty() {
            return Err(ValidationError::InvalidField {
                field: "trackers.name".to_string(),
                message: "tracker name must not be empty".to_string(),
            });
        }

        if !tracker.name.chars().all(|c| RUN_ID_ALLOWED.contains(c)) {
            return Err(ValidationError::InvalidField {
                field: format!("trackers[{}].name", tracker.name),
                message: "tracker name contains invalid characters".to_string(),
            });
        }

        if !seen.insert(tracker.name.clone()) {
            return Err(ValidationError::InvalidField {
                field: "trackers".to_string(),
                message: format!("tracker name '{}' defined more than once", tracker.name),
            });
        }

        match tracker.kind {
            TrackerKind::Particle if tracker.particles == Some(0) => {
                return Err(ValidationError::InvalidField {
                    field: format!("trackers[{}].particles", tracker.name),
                    message: "particle count must be greater than zero".to_string(),
                });
            }
            TrackerKind::Particle => {}
            TrackerKind::Exact => tracker.particles = None,
        }
    }

    Ok(())
}

fn resolve_template(run_id: &str, template: &str) -> PathBuf {
    let replaced = template.replace("{run_id}", run_id);
    PathBuf::from(replaced)
}

/// Fully resolved output paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutputs {
    pub jsonl: PathBuf,
    pub summary_md: PathBuf,
    pub plots_dir: PathBuf,
}

/// Errors surfaced when loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("invalid configuration in {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        source: ValidationError,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Invalid { path, .. } => path.as_path(),
        }
    }
}

/// Validation failures captured with contextual metadata.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}
