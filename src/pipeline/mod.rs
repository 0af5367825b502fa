//! Comparative run pipeline
//!
//! Discovers run files, decodes each run's descriptor, aggregates its
//! trajectory, and folds the results into a [`ComparisonChart`]:
//!
//! ```text
//! <runs_dir>/*.txt ──decode──> RunDescriptor ─┐
//!         │                                   ├──> RunData ──> ComparisonChart ──> plot.png
//!         └───────load──────> Trajectory ─────┘
//! ```
//!
//! Runs are processed strictly one after another; each file is opened,
//! consumed and closed before the next one is touched.
//!
//! ## Broken runs
//!
//! What happens to a run whose filename or log is malformed is decided by
//! [`FailurePolicy`]. The default aborts the whole comparison.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::chart::ComparisonChart;
use crate::config::PipelineConfig;
use crate::descriptor::RunDescriptor;
use crate::digest::files_with_extension;
use crate::trajectory::Trajectory;
use crate::{Error, Result};

/// What to do with a run that fails to decode or load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Fail the whole comparison on the first broken run.
    #[default]
    Abort,
    /// Leave broken runs out of the chart and report them.
    SkipAndReport,
}

/// One decoded and aggregated run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunData {
    /// Run file the data came from
    pub path: PathBuf,
    /// Hyperparameters decoded from the file name
    pub descriptor: RunDescriptor,
    /// Best value per generation
    pub trajectory: Trajectory,
}

impl RunData {
    /// Legend entry: the run's file name.
    #[must_use]
    pub fn legend_label(&self) -> String {
        self.path.file_name().map_or_else(
            || self.descriptor.label(),
            |name| name.to_string_lossy().into_owned(),
        )
    }
}

/// A run left out under [`FailurePolicy::SkipAndReport`].
#[derive(Debug)]
pub struct SkippedRun {
    /// Run file that failed
    pub path: PathBuf,
    /// Why it failed
    pub error: Error,
}

/// All runs discovered under one directory.
#[derive(Debug, Default)]
pub struct RunCollection {
    /// Runs that decoded and loaded, in path order
    pub runs: Vec<RunData>,
    /// Runs that were skipped, in path order
    pub skipped: Vec<SkippedRun>,
}

impl RunCollection {
    /// Fold every run into a chart builder, one series per run.
    #[must_use]
    pub fn to_chart(&self, chart: ComparisonChart) -> ComparisonChart {
        let mut chart = chart;
        for run in &self.runs {
            chart.add_series(run.legend_label(), run.trajectory.clone());
        }
        chart
    }
}

/// Outcome of [`compare_runs`].
#[derive(Debug)]
pub struct ComparisonReport {
    /// Chart image that was written
    pub output: PathBuf,
    /// Runs drawn and runs skipped
    pub collection: RunCollection,
}

/// Run files under `dir` with the given extension, in lexicographic order.
///
/// # Errors
///
/// Returns [`Error::InputNotFound`] if `dir` does not exist.
pub fn discover_runs(dir: impl AsRef<Path>, extension: &str) -> Result<Vec<PathBuf>> {
    files_with_extension(dir.as_ref(), extension)
}

/// Decode and load a single run file.
///
/// # Errors
///
/// Returns [`Error::SchemaMismatch`] for a bad filename and the errors of
/// [`Trajectory::load`] for a bad log.
pub fn load_run(path: impl AsRef<Path>) -> Result<RunData> {
    let path = path.as_ref();
    let descriptor = RunDescriptor::decode(path)?;
    let trajectory = Trajectory::load(path)?;
    debug!(
        run = %descriptor,
        generations = trajectory.len(),
        "loaded run"
    );
    Ok(RunData {
        path: path.to_path_buf(),
        descriptor,
        trajectory,
    })
}

/// Load every run under `dir`.
///
/// # Errors
///
/// Returns [`Error::InputNotFound`] if `dir` does not exist. Under
/// [`FailurePolicy::Abort`] also returns the first run error.
pub fn collect_runs(
    dir: impl AsRef<Path>,
    extension: &str,
    policy: FailurePolicy,
) -> Result<RunCollection> {
    let mut collection = RunCollection::default();

    for path in discover_runs(dir, extension)? {
        match load_run(&path) {
            Ok(run) => collection.runs.push(run),
            Err(error) => match policy {
                FailurePolicy::Abort => return Err(error),
                FailurePolicy::SkipAndReport => {
                    warn!(run = %path.display(), %error, "skipping broken run");
                    collection.skipped.push(SkippedRun { path, error });
                }
            },
        }
    }

    Ok(collection)
}

/// Collect the configured runs and render their comparison chart.
///
/// # Errors
///
/// Returns run errors according to the configured [`FailurePolicy`], and
/// render errors from [`ComparisonChart::render`].
pub fn compare_runs(config: &PipelineConfig) -> Result<ComparisonReport> {
    let collection = collect_runs(&config.runs_dir, &config.extension, config.failure_policy)?;
    if collection.runs.is_empty() {
        warn!(dir = %config.runs_dir.display(), "no runs to compare");
    }

    let chart = collection.to_chart(ComparisonChart::new(config.chart.clone()));
    chart.render(&config.chart_output)?;

    info!(
        runs = collection.runs.len(),
        skipped = collection.skipped.len(),
        output = %config.chart_output.display(),
        "comparison complete"
    );
    Ok(ComparisonReport {
        output: config.chart_output.clone(),
        collection,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_discover_is_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b_run.txt", "");
        write(dir.path(), "a_run.txt", "");
        write(dir.path(), "notes.md", "");
        fs::create_dir(dir.path().join("sub.txt")).unwrap();

        let runs = discover_runs(dir.path(), "txt").unwrap();
        let names: Vec<_> = runs
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a_run.txt", "b_run.txt"]);
    }

    #[test]
    fn test_discover_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover_runs(dir.path().join("missing"), "txt").unwrap_err();
        assert!(matches!(err, Error::InputNotFound { .. }));
    }

    #[test]
    fn test_load_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "100000_100_19_20_40_0.5.txt",
            "@best=500|gen=0\n@best=120|gen=1\n",
        );
        let run = load_run(&path).unwrap();
        assert_eq!(run.descriptor.n_elite, 19);
        assert_eq!(run.trajectory.values(), &[500, 120]);
        assert_eq!(run.legend_label(), "100000_100_19_20_40_0.5.txt");
    }

    #[test]
    fn test_policy_abort_vs_skip() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "100000_100_10_20_40_0.5.txt", "@best=5|gen=0\n");
        write(dir.path(), "100000_100_19_20_40_0.5.txt", "@gen=0\n");
        write(dir.path(), "bad_name.txt", "@best=1\n");

        let err = collect_runs(dir.path(), "txt", FailurePolicy::Abort).unwrap_err();
        assert!(matches!(err, Error::MissingField { .. }));

        let collection = collect_runs(dir.path(), "txt", FailurePolicy::SkipAndReport).unwrap();
        assert_eq!(collection.runs.len(), 1);
        assert_eq!(collection.runs[0].descriptor.n_elite, 10);
        assert_eq!(collection.skipped.len(), 2);
        assert!(matches!(collection.skipped[0].error, Error::MissingField { .. }));
        assert!(matches!(collection.skipped[1].error, Error::SchemaMismatch(_)));
    }
}
