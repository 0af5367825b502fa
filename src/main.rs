use std::io;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueHint};
use runlog_digest::config::PipelineConfig;
use runlog_digest::descriptor::RunDescriptor;
use runlog_digest::digest::{digest_dir, digest_file};
use runlog_digest::pipeline::{collect_runs, compare_runs, FailurePolicy};
use runlog_digest::store::{write_parquet, RunRecords};
use runlog_digest::sweep::{run_sweep, OptimizerCommand, SweepPlan};
use runlog_digest::trajectory::Trajectory;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Digest optimizer run logs and compare their convergence", long_about = None)]
struct Cli {
    /// Pipeline config (TOML); flags override its values
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Increase log verbosity
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Keep only telemetry lines of raw logs (a directory or a single file)
    Digest {
        /// Raw log directory or file (defaults to `raw_dir`)
        #[arg(long, value_hint = ValueHint::AnyPath)]
        input: Option<PathBuf>,
        /// Digest directory, or file when `--input` is a file (defaults to `runs_dir`)
        #[arg(long, value_hint = ValueHint::AnyPath)]
        output: Option<PathBuf>,
    },
    /// Print the best value of every generation of one run
    Trajectory {
        /// Digested (or raw, with `--raw`) run log
        #[arg(value_hint = ValueHint::FilePath)]
        path: PathBuf,
        /// Filter noise lines before parsing
        #[arg(long, action = ArgAction::SetTrue)]
        raw: bool,
    },
    /// Draw every run of a directory on one log-scale chart
    Plot {
        /// Digested runs directory (defaults to `runs_dir`)
        #[arg(long, value_hint = ValueHint::DirPath)]
        runs: Option<PathBuf>,
        /// Chart image (defaults to `chart_output`)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
        /// Upper y-limit
        #[arg(long)]
        y_max: Option<f64>,
        /// Leave broken runs out instead of aborting
        #[arg(long, action = ArgAction::SetTrue)]
        skip_broken: bool,
    },
    /// Launch the optimizer for each hyperparameter combination
    Sweep {
        /// Optimizer executable
        #[arg(long)]
        program: String,
        /// Arguments placed before the hyperparameters (repeatable)
        #[arg(long = "arg", allow_hyphen_values = true)]
        leading_args: Vec<String>,
        /// Generations per run
        #[arg(long, default_value_t = 100_000)]
        generations: u64,
        /// Population size
        #[arg(long, default_value_t = 100)]
        population: u64,
        /// Elite count
        #[arg(long, default_value_t = 10)]
        elite: u64,
        /// Selection count
        #[arg(long, default_value_t = 20)]
        select: u64,
        /// Crossover count (defaults to (population - select) / 2)
        #[arg(long)]
        crossover: Option<u64>,
        /// Mutation probability
        #[arg(long, default_value_t = 0.5)]
        mutation: f64,
        /// Elite counts to sweep (comma separated)
        #[arg(long, value_delimiter = ',')]
        elites: Vec<u64>,
        /// Selection counts to sweep (comma separated)
        #[arg(long, value_delimiter = ',')]
        selects: Vec<u64>,
        /// Mutation probabilities to sweep (comma separated)
        #[arg(long, value_delimiter = ',')]
        mutations: Vec<f64>,
        /// Raw log directory (defaults to `raw_dir`)
        #[arg(long, value_hint = ValueHint::DirPath)]
        output_dir: Option<PathBuf>,
    },
    /// Export all runs as a Parquet table and optionally JSON run records
    Export {
        /// Digested runs directory (defaults to `runs_dir`)
        #[arg(long, value_hint = ValueHint::DirPath)]
        runs: Option<PathBuf>,
        /// Parquet output
        #[arg(long, value_hint = ValueHint::FilePath)]
        parquet: PathBuf,
        /// JSON run records to merge into
        #[arg(long, value_hint = ValueHint::FilePath)]
        records: Option<PathBuf>,
    },
    /// Print the effective configuration as TOML
    ShowConfig,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let config = match &cli.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("failed loading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    match cli.command {
        Commands::Digest { input, output } => {
            let input = input.unwrap_or_else(|| config.raw_dir.clone());
            let output = output.unwrap_or_else(|| config.runs_dir.clone());
            if input.is_file() {
                let destination = if output.is_dir() {
                    match input.file_name() {
                        Some(name) => output.join(name),
                        None => bail!("cannot derive a file name from {}", input.display()),
                    }
                } else {
                    output
                };
                let stats = digest_file(&input, &destination)?;
                println!(
                    "{} -> {} ({}/{} lines kept)",
                    input.display(),
                    destination.display(),
                    stats.lines_retained,
                    stats.lines_read
                );
            } else {
                for run in digest_dir(&input, &output, &config.extension)? {
                    println!(
                        "{} -> {} ({}/{} lines kept)",
                        run.source.display(),
                        run.destination.display(),
                        run.stats.lines_retained,
                        run.stats.lines_read
                    );
                }
            }
        }
        Commands::Trajectory { path, raw } => {
            let trajectory = if raw {
                Trajectory::from_raw_log(&path)?
            } else {
                Trajectory::load(&path)?
            };
            for best in trajectory.values() {
                println!("{best}");
            }
            match trajectory.summary() {
                Some(summary) => info!(
                    generations = summary.generations,
                    first = summary.first,
                    last = summary.last,
                    min = summary.min,
                    "trajectory summary"
                ),
                None => info!(path = %path.display(), "no telemetry lines"),
            }
        }
        Commands::Plot {
            runs,
            output,
            y_max,
            skip_broken,
        } => {
            let mut config = config;
            if let Some(runs) = runs {
                config = config.runs_dir(runs);
            }
            if let Some(output) = output {
                config = config.chart_output(output);
            }
            if let Some(y_max) = y_max {
                config = config.y_max(y_max);
            }
            if skip_broken {
                config = config.failure_policy(FailurePolicy::SkipAndReport);
            }
            config.validate()?;

            let report = compare_runs(&config)?;
            for skipped in &report.collection.skipped {
                eprintln!("skipped {}: {}", skipped.path.display(), skipped.error);
            }
            println!("runs={}", report.collection.runs.len());
            println!("output={}", report.output.display());
        }
        Commands::Sweep {
            program,
            leading_args,
            generations,
            population,
            elite,
            select,
            crossover,
            mutation,
            elites,
            selects,
            mutations,
            output_dir,
        } => {
            let mut base = RunDescriptor {
                n_generation: generations,
                n_population: population,
                n_elite: elite,
                n_select: select,
                n_crossover: 0,
                p_mutation: mutation,
            }
            .with_default_crossover();
            if let Some(crossover) = crossover {
                base.n_crossover = crossover;
            }
            base.validate()
                .with_context(|| format!("invalid hyperparameters {base}"))?;

            let command = OptimizerCommand {
                program,
                leading_args,
            };
            let plan = SweepPlan::new(base)
                .with_elites(elites)
                .with_selects(selects)
                .with_mutations(mutations);
            let output_dir = output_dir.unwrap_or_else(|| config.raw_dir.clone());

            for record in run_sweep(&command, &plan, &output_dir, &config.extension)? {
                println!(
                    "{} time={:.0}s exit={}",
                    record.log_path.display(),
                    record.elapsed_secs,
                    record
                        .exit_code
                        .map_or_else(|| "signal".to_string(), |c| c.to_string())
                );
            }
        }
        Commands::Export {
            runs,
            parquet,
            records,
        } => {
            let runs_dir = runs.unwrap_or_else(|| config.runs_dir.clone());
            let collection = collect_runs(&runs_dir, &config.extension, config.failure_policy)?;
            let rows = write_parquet(&collection.runs, &parquet)?;
            println!("wrote={} rows={rows}", parquet.display());

            if let Some(path) = records {
                let mut store = RunRecords::load_or_default(&path)?;
                for run in &collection.runs {
                    store.insert(&run.descriptor, run.trajectory.clone());
                }
                store.save(&path)?;
                println!("wrote={} runs={}", path.display(), store.len());
            }
        }
        Commands::ShowConfig => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}
