//! Threshold and window-size sweeps.
//!
//! A [`SweepPlan`] is the ordered list of (scope, threshold) jobs; the
//! [`Sweep`] runner executes it sequentially through a [`CoOccurrence`]
//! pipeline and optionally renders a heatmap per non-empty result.

use std::path::{Path, PathBuf};
use std::time::Instant;

use refmine_core::{RefmineError, Scope, Statistic, SweepConfig};
use refmine_heatmap::{heatmap_file_name, Colormap, HeatmapRenderer, HeatmapRequest};
use serde::Serialize;
use tracing::{info, warn};

use crate::cache::Provenance;
use crate::pipeline::CoOccurrence;

/// One filtered matrix to produce.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepJob {
    pub scope: Scope,
    pub threshold: f64,
}

/// Ordered jobs of a run.
///
/// # Examples
///
/// ```
/// use refmine_core::{Scope, SweepConfig};
/// use refmine_cooccur::sweep::SweepPlan;
///
/// let plan = SweepPlan::from_config(&SweepConfig::default());
/// // 6 commit thresholds, then 3 windows x 2 statistics x 6 thresholds
/// assert_eq!(plan.len(), 6 + 36);
/// assert_eq!(plan.jobs()[0].scope, Scope::Commit);
/// assert_eq!(plan.jobs()[6].scope, Scope::window(6, "likelihood").unwrap());
/// assert_eq!(plan.jobs()[12].scope, Scope::window(6, "frequency").unwrap());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepPlan {
    jobs: Vec<SweepJob>,
}

impl SweepPlan {
    /// Commit thresholds first, then every window size with each statistic in
    /// configured order.
    pub fn from_config(sweep: &SweepConfig) -> Self {
        let mut plan = Self::default();
        if sweep.commit {
            plan.push_scope(Scope::Commit, &sweep.thresholds);
        }
        for &hours in &sweep.window_hours {
            for &statistic in &sweep.statistics {
                plan.push_scope(Scope::Window { hours, statistic }, &sweep.thresholds);
            }
        }
        plan
    }

    /// Commit analysis only.
    pub fn commit(thresholds: &[f64]) -> Self {
        let mut plan = Self::default();
        plan.push_scope(Scope::Commit, thresholds);
        plan
    }

    /// A single window table with one statistic, named as the user typed it.
    ///
    /// # Errors
    ///
    /// Returns [`RefmineError::InvalidStatistic`] for an unknown statistic and
    /// [`RefmineError::Config`] for a zero-hour window.
    pub fn window(hours: u32, statistic: &str, thresholds: &[f64]) -> Result<Self, RefmineError> {
        let mut plan = Self::default();
        plan.push_scope(Scope::window(hours, statistic)?, thresholds);
        Ok(plan)
    }

    fn push_scope(&mut self, scope: Scope, thresholds: &[f64]) {
        self.jobs.extend(
            thresholds
                .iter()
                .map(|&threshold| SweepJob { scope, threshold }),
        );
    }

    pub fn jobs(&self) -> &[SweepJob] {
        &self.jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

/// Outcome of one job.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepEntry {
    /// Human-readable scope, e.g. `window 6H (likelihood)`.
    pub scope: String,
    pub statistic: Statistic,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_hours: Option<u32>,
    pub threshold: f64,
    pub rows: usize,
    pub cols: usize,
    pub row_labels: Vec<String>,
    pub column_labels: Vec<String>,
    pub provenance: Provenance,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heatmap: Option<PathBuf>,
}

/// All entries of a run plus its wall-clock duration.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub entries: Vec<SweepEntry>,
    pub elapsed_secs: f64,
}

impl SweepReport {
    /// Entries whose filtered matrix was read back from disk.
    pub fn cached(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.provenance == Provenance::Cached)
            .count()
    }

    pub fn heatmaps(&self) -> usize {
        self.entries.iter().filter(|e| e.heatmap.is_some()).count()
    }

    /// Pretty-printed JSON with camelCase keys.
    ///
    /// # Errors
    ///
    /// Returns [`RefmineError::Serialization`] if encoding fails.
    pub fn to_json(&self) -> Result<String, RefmineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Where and how heatmaps are drawn.
pub struct HeatmapOutput<'a> {
    pub renderer: &'a dyn HeatmapRenderer,
    pub colormap: Colormap,
    pub dir: &'a Path,
}

/// Runs a plan job by job.
pub struct Sweep<'a> {
    pipeline: &'a CoOccurrence<'a>,
    heatmaps: Option<HeatmapOutput<'a>>,
}

impl<'a> Sweep<'a> {
    pub fn new(pipeline: &'a CoOccurrence<'a>) -> Self {
        Self {
            pipeline,
            heatmaps: None,
        }
    }

    /// Render a heatmap for each non-empty filtered matrix.
    pub fn with_heatmaps(mut self, output: HeatmapOutput<'a>) -> Self {
        self.heatmaps = Some(output);
        self
    }

    /// Execute every job in order. `on_job` is called after each job with the
    /// number of finished jobs.
    ///
    /// # Errors
    ///
    /// Stops at the first failing job and returns its error.
    pub fn run(
        &self,
        plan: &SweepPlan,
        on_job: &mut dyn FnMut(&SweepJob, usize),
    ) -> Result<SweepReport, RefmineError> {
        let started = Instant::now();
        let mut entries = Vec::with_capacity(plan.len());
        let mut current: Option<Scope> = None;

        for (done, job) in plan.jobs().iter().enumerate() {
            if current != Some(job.scope) {
                info!(scope = %job.scope, "starting co-occurrence analysis");
                current = Some(job.scope);
            }
            entries.push(self.run_job(job)?);
            on_job(job, done + 1);
        }

        let elapsed_secs = started.elapsed().as_secs_f64();
        info!(jobs = entries.len(), elapsed_secs, "sweep finished");
        Ok(SweepReport {
            entries,
            elapsed_secs,
        })
    }

    fn run_job(&self, job: &SweepJob) -> Result<SweepEntry, RefmineError> {
        let artifact = self.pipeline.filtered(job.scope, job.threshold)?;
        let matrix = &artifact.matrix;
        let (rows, cols) = matrix.shape();

        let heatmap = match &self.heatmaps {
            Some(_) if matrix.is_empty() => {
                warn!(
                    scope = %job.scope,
                    threshold = job.threshold,
                    "nothing above threshold, no heatmap rendered"
                );
                None
            }
            Some(output) => {
                let path = output
                    .dir
                    .join(heatmap_file_name(&job.scope, job.threshold, (rows, cols)));
                let title = job.scope.title(job.threshold);
                let colorbar_label = job.scope.colorbar_label();
                output.renderer.render(
                    &HeatmapRequest {
                        matrix,
                        title: &title,
                        colorbar_label: &colorbar_label,
                        colormap: output.colormap,
                    },
                    &path,
                )?;
                Some(path)
            }
            None => None,
        };

        Ok(SweepEntry {
            scope: job.scope.to_string(),
            statistic: job.scope.statistic(),
            window_hours: match job.scope {
                Scope::Commit => None,
                Scope::Window { hours, .. } => Some(hours),
            },
            threshold: job.threshold,
            rows,
            cols,
            row_labels: matrix.row_labels().into_iter().map(String::from).collect(),
            column_labels: matrix.columns().to_vec(),
            provenance: artifact.provenance,
            heatmap,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_respects_disabled_commit_and_statistic_order() {
        let config = SweepConfig {
            commit: false,
            thresholds: vec![0.1, 0.2],
            window_hours: vec![12],
            statistics: vec![Statistic::Frequency, Statistic::Likelihood],
        };
        let plan = SweepPlan::from_config(&config);
        let scopes: Vec<String> = plan.jobs().iter().map(|j| j.scope.to_string()).collect();
        assert_eq!(
            scopes,
            vec![
                "window 12H (frequency)",
                "window 12H (frequency)",
                "window 12H (likelihood)",
                "window 12H (likelihood)",
            ]
        );
        assert_eq!(plan.jobs()[1].threshold, 0.2);
    }

    #[test]
    fn default_plan_thresholds_are_exact_tenths() {
        let plan = SweepPlan::commit(&SweepConfig::default().thresholds);
        let thresholds: Vec<f64> = plan.jobs().iter().map(|j| j.threshold).collect();
        assert_eq!(thresholds[3], 0.3);
        assert_eq!(thresholds.len(), 6);
    }

    #[test]
    fn empty_thresholds_give_empty_plan() {
        assert!(SweepPlan::window(6, "likelihood", &[]).unwrap().is_empty());
        assert!(matches!(
            SweepPlan::window(6, "mean", &[0.1]),
            Err(RefmineError::InvalidStatistic(_))
        ));
    }

    #[test]
    fn report_counts() {
        let entry = |provenance, heatmap: Option<&str>| SweepEntry {
            scope: "commit".into(),
            statistic: Statistic::Likelihood,
            window_hours: None,
            threshold: 0.0,
            rows: 0,
            cols: 0,
            row_labels: vec![],
            column_labels: vec![],
            provenance,
            heatmap: heatmap.map(PathBuf::from),
        };
        let report = SweepReport {
            entries: vec![
                entry(Provenance::Cached, None),
                entry(Provenance::Computed, Some("a.png")),
            ],
            elapsed_secs: 0.0,
        };
        assert_eq!(report.cached(), 1);
        assert_eq!(report.heatmaps(), 1);

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["entries"][0]["provenance"], "cached");
        assert!(json["entries"][0].get("windowHours").is_none());
        assert_eq!(json["entries"][1]["heatmap"], "a.png");
    }
}
