//! Optimizer sweeps
//!
//! Launches the external optimizer once per hyperparameter combination and
//! captures its stdout as a raw run log named after the combination. The
//! optimizer is not validated or retried; a failed launch leaves whatever
//! output it produced and the exit code is only recorded.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::descriptor::RunDescriptor;
use crate::{Error, Result};

/// How to invoke the optimizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizerCommand {
    /// Executable to run
    pub program: String,
    /// Arguments placed before the hyperparameters
    pub leading_args: Vec<String>,
}

impl OptimizerCommand {
    /// Create a command for `program` with no leading arguments.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    /// Append a leading argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.leading_args.push(arg.into());
        self
    }

    /// Full argument vector for one run: leading args, then the
    /// hyperparameters in schema order.
    #[must_use]
    pub fn args_for(&self, descriptor: &RunDescriptor) -> Vec<String> {
        let mut args = self.leading_args.clone();
        args.extend(descriptor.to_args());
        args
    }
}

/// Set of runs derived from one base descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepPlan {
    base: RunDescriptor,
    elites: Vec<u64>,
    selects: Vec<u64>,
    mutations: Vec<f64>,
}

impl SweepPlan {
    /// A plan with only the base run.
    #[must_use]
    pub const fn new(base: RunDescriptor) -> Self {
        Self {
            base,
            elites: Vec::new(),
            selects: Vec::new(),
            mutations: Vec::new(),
        }
    }

    /// Vary the elite count.
    #[must_use]
    pub fn with_elites(mut self, elites: impl IntoIterator<Item = u64>) -> Self {
        self.elites = elites.into_iter().collect();
        self
    }

    /// Vary the selection count; crossover follows the default derivation.
    #[must_use]
    pub fn with_selects(mut self, selects: impl IntoIterator<Item = u64>) -> Self {
        self.selects = selects.into_iter().collect();
        self
    }

    /// Vary the mutation probability.
    #[must_use]
    pub fn with_mutations(mut self, mutations: impl IntoIterator<Item = f64>) -> Self {
        self.mutations = mutations.into_iter().collect();
        self
    }

    /// Every descriptor of the plan, as the cartesian product of the
    /// variations (an empty variation keeps the base value).
    #[must_use]
    pub fn descriptors(&self) -> Vec<RunDescriptor> {
        let elites = or_base(&self.elites, self.base.n_elite);
        let mutations = or_base(&self.mutations, self.base.p_mutation);

        let mut out = Vec::new();
        for &n_elite in &elites {
            if self.selects.is_empty() {
                for &p_mutation in &mutations {
                    out.push(RunDescriptor {
                        n_elite,
                        p_mutation,
                        ..self.base
                    });
                }
                continue;
            }
            for &n_select in &self.selects {
                for &p_mutation in &mutations {
                    out.push(
                        RunDescriptor {
                            n_elite,
                            n_select,
                            p_mutation,
                            ..self.base
                        }
                        .with_default_crossover(),
                    );
                }
            }
        }
        out
    }
}

fn or_base<T: Copy>(values: &[T], base: T) -> Vec<T> {
    if values.is_empty() {
        vec![base]
    } else {
        values.to_vec()
    }
}

/// Record of one optimizer launch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchRecord {
    /// Hyperparameters of the run
    pub descriptor: RunDescriptor,
    /// Raw log written
    pub log_path: PathBuf,
    /// Wall-clock start
    pub started_at: DateTime<Utc>,
    /// Wall time in seconds
    pub elapsed_secs: f64,
    /// Exit code, `None` if terminated by a signal
    pub exit_code: Option<i32>,
}

/// Trailer line appended to every raw log; it is noise to the digest.
#[must_use]
pub fn timing_trailer(elapsed_secs: f64) -> String {
    format!("# time={elapsed_secs:.0}\n")
}

/// Launch one run, writing its stdout to `<output_dir>/<label>.<extension>`.
///
/// The log is overwritten, stderr is discarded, and a timing trailer is
/// appended once the process exits.
///
/// # Errors
///
/// Returns [`Error::Launch`] if the process cannot be spawned, or
/// [`Error::Io`] if the log cannot be written.
pub fn launch_run(
    command: &OptimizerCommand,
    descriptor: &RunDescriptor,
    output_dir: impl AsRef<Path>,
    extension: &str,
) -> Result<LaunchRecord> {
    let output_dir = output_dir.as_ref();
    fs::create_dir_all(output_dir)?;
    let log_path = output_dir.join(descriptor.file_name(extension));
    let log = File::create(&log_path)?;

    let args = command.args_for(descriptor);
    info!(
        program = %command.program,
        args = %args.join(" "),
        log = %log_path.display(),
        "launching run"
    );

    let started_at = Utc::now();
    let start = Instant::now();
    let status = Command::new(&command.program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::from(log))
        .stderr(Stdio::null())
        .status()
        .map_err(|e| Error::Launch(format!("{}: {e}", command.program)))?;
    let elapsed_secs = start.elapsed().as_secs_f64();

    let mut log = OpenOptions::new().append(true).open(&log_path)?;
    log.write_all(timing_trailer(elapsed_secs).as_bytes())?;

    if !status.success() {
        warn!(run = %descriptor, code = ?status.code(), "optimizer exited unsuccessfully");
    }

    Ok(LaunchRecord {
        descriptor: *descriptor,
        log_path,
        started_at,
        elapsed_secs,
        exit_code: status.code(),
    })
}

/// Launch every run of a plan, one after another.
///
/// Every descriptor is validated before the first launch.
///
/// # Errors
///
/// Returns [`Error::SchemaMismatch`] without launching anything if a
/// descriptor would not decode back from its log name; otherwise stops at
/// the first launch error.
pub fn run_sweep(
    command: &OptimizerCommand,
    plan: &SweepPlan,
    output_dir: impl AsRef<Path>,
    extension: &str,
) -> Result<Vec<LaunchRecord>> {
    let output_dir = output_dir.as_ref();
    let descriptors = plan.descriptors();
    for descriptor in &descriptors {
        descriptor.validate()?;
    }
    descriptors
        .iter()
        .map(|descriptor| launch_run(command, descriptor, output_dir, extension))
        .collect()
}
