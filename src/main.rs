//! Command-line front end for prequential active-learning evaluation.
//!
//! Usage:
//!   alpq run --stream data.csv --dump-file curve.csv
//!   alpq run --config alpq.toml --budget-manager fixed_fraction --json
//!   alpq components
//!   alpq default-config > alpq.toml

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing::{error, info};

use alpq::common::config::{AppCfg, LogCfg};
use alpq::common::{log, EvalError, EvalResult};
use alpq::data::CsvFileStream;
use alpq::evaluation::PrequentialTask;
use alpq::monitor::{CancelToken, StandardMonitor};
use alpq::registry;

#[derive(Parser)]
#[command(name = "alpq", version, about = "Prequential evaluation of active learners")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate a learner on a CSV stream and print the learning curve.
    Run(RunArgs),
    /// List registered base learners, budget managers and evaluators.
    Components,
    /// Print the built-in configuration as TOML.
    DefaultConfig,
}

#[derive(Args)]
struct RunArgs {
    /// TOML configuration file; `ALPQ_*` variables and flags override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// CSV stream, label in the last column unless configured otherwise.
    #[arg(long)]
    stream: Option<PathBuf>,

    #[arg(long)]
    learner: Option<String>,

    #[arg(long)]
    budget_manager: Option<String>,

    /// Positive-class instances released to training; 0 disables the gate.
    #[arg(long)]
    limited_instances: Option<u64>,

    #[arg(long)]
    evaluator: Option<String>,

    /// Maximum instances to process; -1 for no limit.
    #[arg(long, allow_negative_numbers = true)]
    instance_limit: Option<i64>,

    /// Maximum seconds to evaluate; -1 for no limit.
    #[arg(long, allow_negative_numbers = true)]
    time_limit: Option<i64>,

    /// Instances between snapshots; 0 keeps only the final snapshot.
    #[arg(long)]
    sample_frequency: Option<u64>,

    /// Append every snapshot to this CSV file.
    #[arg(long)]
    dump_file: Option<PathBuf>,

    /// Print the model description after the run.
    #[arg(long)]
    print_model: bool,

    /// Print the task result as JSON instead of CSV.
    #[arg(long)]
    json: bool,
}

impl RunArgs {
    fn apply(&self, cfg: &mut AppCfg) {
        if let Some(path) = &self.stream {
            cfg.stream.path = Some(path.clone());
        }
        if let Some(name) = &self.learner {
            cfg.learner.base_learner = name.clone();
        }
        if let Some(name) = &self.budget_manager {
            cfg.learner.budget_manager = name.clone();
        }
        if let Some(limit) = self.limited_instances {
            cfg.learner.limited_instances = limit;
        }
        if let Some(name) = &self.evaluator {
            cfg.evaluator.name = name.clone();
        }
        if let Some(limit) = self.instance_limit {
            cfg.task.instance_limit = limit;
        }
        if let Some(limit) = self.time_limit {
            cfg.task.time_limit = limit;
        }
        if let Some(freq) = self.sample_frequency {
            cfg.task.sample_frequency = freq;
        }
        if let Some(path) = &self.dump_file {
            cfg.task.dump_file = Some(path.clone());
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let outcome = match cli.command {
        Command::Run(args) => run(&args),
        Command::Components => {
            for (kind, name, summary) in registry::catalogue() {
                println!("{kind:<15} {name:<22} {summary}");
            }
            Ok(())
        }
        Command::DefaultConfig => AppCfg::default().to_toml().map(|toml| print!("{toml}")),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Config errors surface before `run` installs the configured subscriber.
            log::init(&LogCfg::default());
            error!(module = "cli", event = "failed", code = err.code() as u32, "{err}");
            eprintln!("alpq: {err}");
            ExitCode::from(err.code() as u8)
        }
    }
}

fn run(args: &RunArgs) -> EvalResult<()> {
    let mut cfg = AppCfg::load(args.config.as_deref())?;
    args.apply(&mut cfg);
    cfg.validate()?;
    log::init(&cfg.log);

    let path = cfg
        .stream
        .path
        .clone()
        .ok_or_else(|| EvalError::invalid("no stream given; use --stream or stream.path"))?;
    let mut stream = CsvFileStream::open(
        &path,
        cfg.task.class_count,
        cfg.stream.has_header,
        cfg.stream.class_column,
    )?;
    let mut learner = registry::active_learner(&cfg.learner)?;

    let mut task = PrequentialTask::from_cfg(&cfg.task);
    if let Some(evaluator) = registry::evaluator(&cfg.evaluator)? {
        task = task.with_evaluator(evaluator);
    }

    let mut monitor = StandardMonitor::new(CancelToken::new()).without_previews();
    info!(
        module = "cli",
        event = "run",
        stream = %path.display(),
        learner = %cfg.learner.base_learner,
        budget_manager = %cfg.learner.budget_manager,
    );

    let Some(result) = task.run(&mut stream, learner.as_mut(), &mut monitor)? else {
        eprintln!("alpq: evaluation aborted");
        return Ok(());
    };

    if args.json {
        let rendered = serde_json::to_string_pretty(&result)
            .map_err(|e| EvalError::invalid(format!("cannot render result: {e}")))?;
        println!("{rendered}");
    } else {
        println!("{}", result.curve.header_to_string());
        for i in 0..result.curve.num_entries() {
            if let Some(line) = result.curve.entry_to_string(i) {
                println!("{line}");
            }
        }
    }

    if args.print_model {
        println!("{}", learner.model_description());
    }
    Ok(())
}
