use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use busters_core::belief::TrackerKind;
use plotters::prelude::*;
use statrs::distribution::{ContinuousCDF, Normal};
use thiserror::Error;

use crate::config::BenchmarkConfig;

const CONFIDENCE_LEVEL: f64 = 0.95;
const SERIES_COLORS: [RGBColor; 5] = [BLUE, RED, GREEN, MAGENTA, CYAN];

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("tracker '{0}' recorded but missing from configuration")]
    UnknownTracker(String),
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to build normal distribution: {0}")]
    Stats(String),
    #[error("failed to render plot: {0}")]
    Plot(String),
}

/// Accumulates per-row tracking outcomes for every configured tracker.
pub struct AnalyticsCollector {
    trackers: HashMap<String, TrackerAccumulator>,
    tracker_order: Vec<String>,
}

impl AnalyticsCollector {
    pub fn new(config: &BenchmarkConfig) -> Self {
        let mut trackers = HashMap::new();
        let mut order = Vec::new();
        for spec in &config.trackers {
            trackers.insert(
                spec.name.clone(),
                TrackerAccumulator::new(spec.name.clone(), spec.kind),
            );
            order.push(spec.name.clone());
        }
        Self {
            trackers,
            tracker_order: order,
        }
    }

    pub fn record(
        &mut self,
        tracker: &str,
        step: usize,
        arg_max_hit: bool,
        true_prob: f64,
        entropy: f64,
    ) -> Result<(), AnalyticsError> {
        let acc = self
            .trackers
            .get_mut(tracker)
            .ok_or_else(|| AnalyticsError::UnknownTracker(tracker.to_string()))?;
        acc.record(step, arg_max_hit, true_prob, entropy);
        Ok(())
    }

    pub fn finalize(mut self) -> Result<AnalyticsSummary, AnalyticsError> {
        let z = normal_quantile((1.0 + CONFIDENCE_LEVEL) / 2.0)?;
        let mut reports = Vec::new();
        for name in &self.tracker_order {
            if let Some(acc) = self.trackers.remove(name) {
                reports.push(acc.into_report(z));
            }
        }
        Ok(AnalyticsSummary { trackers: reports })
    }
}

struct TrackerAccumulator {
    name: String,
    kind: TrackerKind,
    hits: Vec<f64>,
    total_true_prob: f64,
    total_entropy: f64,
    per_step: Vec<(usize, usize)>,
}

impl TrackerAccumulator {
    fn new(name: String, kind: TrackerKind) -> Self {
        Self {
            name,
            kind,
            hits: Vec::new(),
            total_true_prob: 0.0,
            total_entropy: 0.0,
            per_step: Vec::new(),
        }
    }

    fn record(&mut self, step: usize, arg_max_hit: bool, true_prob: f64, entropy: f64) {
        self.hits.push(if arg_max_hit { 1.0 } else { 0.0 });
        self.total_true_prob += true_prob;
        self.total_entropy += entropy;
        if self.per_step.len() <= step {
            self.per_step.resize(step + 1, (0, 0));
        }
        let (hits, rows) = &mut self.per_step[step];
        *rows += 1;
        if arg_max_hit {
            *hits += 1;
        }
    }

    fn into_report(self, z: f64) -> TrackerReport {
        let rows = self.hits.len();
        let (hit_rate, ci95) = mean_with_interval(&self.hits, z);
        let mean = |total: f64| if rows == 0 { 0.0 } else { total / rows as f64 };

        TrackerReport {
            name: self.name,
            kind: self.kind,
            rows,
            hit_rate,
            ci95: (ci95.0.max(0.0), ci95.1.min(1.0)),
            mean_true_prob: mean(self.total_true_prob),
            mean_entropy: mean(self.total_entropy),
            hit_rate_by_step: self
                .per_step
                .into_iter()
                .map(|(hits, rows)| {
                    if rows == 0 {
                        0.0
                    } else {
                        hits as f64 / rows as f64
                    }
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalyticsSummary {
    pub trackers: Vec<TrackerReport>,
}

impl AnalyticsSummary {
    pub fn write_markdown(&self, path: impl AsRef<Path>) -> Result<(), AnalyticsError> {
        let mut rows = String::new();
        rows.push_str("# Tracking Summary\n\n");
        rows.push_str(
            "Hit = the belief's most likely cell is the ghost's true cell. \
             Intervals are normal approximations at 95%.\n\n",
        );
        rows.push_str("| Tracker | Kind | Rows | Hit rate | 95% CI | Mean P(true) | Mean entropy (bits) |\n");
        rows.push_str("|---------|------|------|----------|--------|--------------|---------------------|\n");

        for tracker in &self.trackers {
            rows.push_str(&format!(
                "| {name} | {kind} | {rows} | {hit:.3} | [{ci_low:.3}, {ci_high:.3}] | {prob:.3} | {entropy:.3} |\n",
                name = tracker.name,
                kind = tracker.kind,
                rows = tracker.rows,
                hit = tracker.hit_rate,
                ci_low = tracker.ci95.0,
                ci_high = tracker.ci95.1,
                prob = tracker.mean_true_prob,
                entropy = tracker.mean_entropy,
            ));
        }

        fs::write(path.as_ref(), rows).map_err(|e| AnalyticsError::Io {
            context: "writing summary markdown",
            source: e,
        })?;
        Ok(())
    }

    /// Draws hit rate per step for every tracker into `hit_rate.png`.
    pub fn render_plot(&self, dir: impl AsRef<Path>) -> Result<PathBuf, AnalyticsError> {
        let dir = dir.as_ref();
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).map_err(|e| AnalyticsError::Io {
                context: "creating plots directory",
                source: e,
            })?;
        }

        let output_path = dir.join("hit_rate.png");
        let trackers = self.trackers.clone();
        let steps = trackers
            .iter()
            .map(|t| t.hit_rate_by_step.len())
            .max()
            .unwrap_or(0)
            .max(1);

        let prev_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(|_| {}));

        let plot_attempt = std::panic::catch_unwind(move || {
            let root = BitMapBackend::new(&output_path, (800, 480)).into_drawing_area();
            root.fill(&WHITE)
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            let mut chart = ChartBuilder::on(&root)
                .margin(20)
                .caption("Arg-max hit rate per step", ("sans-serif", 22))
                .set_label_area_size(LabelAreaPosition::Left, 50)
                .set_label_area_size(LabelAreaPosition::Bottom, 40)
                .build_cartesian_2d(0..steps, 0.0f64..1.0f64)
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            chart
                .configure_mesh()
                .y_desc("Hit rate")
                .x_desc("Step")
                .draw()
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            for (idx, tracker) in trackers.iter().enumerate() {
                let color = SERIES_COLORS[idx % SERIES_COLORS.len()];
                let points: Vec<(usize, f64)> =
                    tracker.hit_rate_by_step.iter().copied().enumerate().collect();
                chart
                    .draw_series(std::iter::once(PathElement::new(
                        points,
                        color.stroke_width(2),
                    )))
                    .map_err(|e| AnalyticsError::Plot(e.to_string()))?
                    .label(tracker.name.clone())
                    .legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                    });
            }

            chart
                .configure_series_labels()
                .background_style(&WHITE.mix(0.8))
                .border_style(&BLACK)
                .draw()
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            drop(chart);

            root.present()
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            drop(root);

            Ok(output_path)
        });

        std::panic::set_hook(prev_hook);

        match plot_attempt {
            Ok(result) => result,
            Err(_) => Err(AnalyticsError::Plot(
                "plotters panicked while rendering (missing font support?)".into(),
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrackerReport {
    pub name: String,
    pub kind: TrackerKind,
    pub rows: usize,
    pub hit_rate: f64,
    pub ci95: (f64, f64),
    pub mean_true_prob: f64,
    pub mean_entropy: f64,
    pub hit_rate_by_step: Vec<f64>,
}

fn normal_quantile(p: f64) -> Result<f64, AnalyticsError> {
    let normal = Normal::new(0.0, 1.0).map_err(|e| AnalyticsError::Stats(e.to_string()))?;
    Ok(normal.inverse_cdf(p))
}

/// Sample mean with a `mean ± z·se` interval.
fn mean_with_interval(values: &[f64], z: f64) -> (f64, (f64, f64)) {
    if values.is_empty() {
        return (0.0, (0.0, 0.0));
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    if values.len() == 1 {
        return (mean, (mean, mean));
    }
    let variance = values
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / (values.len() as f64 - 1.0);
    let std_error = (variance / values.len() as f64).sqrt();
    let margin = z * std_error;
    (mean, (mean - margin, mean + margin))
}
