//! UPS - generate a working solution, then evolve it
//!
//! - `ups generate` runs the solution generator once and prints the scored
//!   baseline
//! - `ups evolve` generates the baseline and evolves it under a budget
//!
//! Exit codes: 0 when the run ends with a valid best solution, 130 when it
//! was cancelled before one existed, 1 on any other fatal error.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use ups_engine::{
    CascadeEvaluator, EngineError, EvolutionOrchestrator, JsonLinesSink, ProcessEnvironment,
    SandboxEvaluator, SurrogateEvaluator, TemplateGenerator,
};
use ups_strategies::TemplateSynthesizer;
use ups_types::{CancellationHandle, Evaluator, Problem};

mod config;

use config::{CliConfig, RunnerConfig};

/// UPS CLI
#[derive(Parser)]
#[command(name = "ups")]
#[command(about = "Generate a working solution and evolve better variants", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "UPS_CONFIG", global = true)]
    config: Option<String>,

    /// Log level
    #[arg(long, env = "UPS_LOG_LEVEL", global = true)]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "UPS_LOG_JSON", global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Produce and score the baseline solution
    Generate {
        /// Problem description (JSON)
        #[arg(short, long)]
        problem: PathBuf,
    },

    /// Produce the baseline, then evolve it
    Evolve {
        /// Problem description (JSON)
        #[arg(short, long)]
        problem: PathBuf,

        /// Generation budget
        #[arg(short, long)]
        generations: Option<u64>,

        /// Wall-clock budget in seconds
        #[arg(long)]
        time_budget_secs: Option<u64>,

        /// Seed for a reproducible run
        #[arg(long)]
        seed: Option<u64>,

        /// Append one JSON state snapshot per generation to this file
        #[arg(long)]
        state_out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match CliConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    config.logging.json |= cli.json_logs;
    init_tracing(&config);

    match run(cli.command, config).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "ups failed");
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(config: &CliConfig) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into());

    // Logs go to stderr; stdout carries the JSON result.
    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(command: Command, mut config: CliConfig) -> anyhow::Result<ExitCode> {
    match command {
        Command::Generate { problem } => {
            let problem = load_problem(&problem).await?;
            let orchestrator = build_orchestrator(&config)?;
            watch_ctrl_c(orchestrator.cancellation_handle());

            match orchestrator.generate(&problem).await {
                Ok(baseline) => {
                    println!("{}", serde_json::to_string_pretty(&baseline)?);
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => Ok(fatal(e)),
            }
        }
        Command::Evolve {
            problem,
            generations,
            time_budget_secs,
            seed,
            state_out,
        } => {
            let problem = load_problem(&problem).await?;

            // Override with CLI args
            if let Some(generations) = generations {
                config.evolution.budget.max_generations = Some(generations);
            }
            if let Some(secs) = time_budget_secs {
                config.evolution.budget.max_wall_clock_ms = Some(secs.saturating_mul(1000));
            }
            if let Some(seed) = seed {
                config.evolution.seed = Some(seed);
            }
            if state_out.is_some() {
                config.output.state_out = state_out;
            }

            let mut orchestrator = build_orchestrator(&config)?;
            if let Some(path) = &config.output.state_out {
                tracing::info!(path = %path.display(), "persisting state snapshots");
                orchestrator = orchestrator.with_sink(Arc::new(JsonLinesSink::new(path.clone())));
            }
            watch_ctrl_c(orchestrator.cancellation_handle());

            match orchestrator.run(&problem).await {
                Ok(outcome) => {
                    println!("{}", serde_json::to_string_pretty(&outcome.summary())?);
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => Ok(fatal(e)),
            }
        }
    }
}

/// Map a run-terminating error to its exit code.
fn fatal(e: EngineError) -> ExitCode {
    match e {
        EngineError::Cancelled => {
            tracing::warn!("cancelled before a valid solution existed");
            ExitCode::from(130)
        }
        other => {
            tracing::error!(error = %other, "run failed");
            eprintln!("error: {}", other);
            ExitCode::FAILURE
        }
    }
}

async fn load_problem(path: &Path) -> anyhow::Result<Problem> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading problem file {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing problem file {}", path.display()))
}

fn build_orchestrator(config: &CliConfig) -> anyhow::Result<EvolutionOrchestrator> {
    let evaluator = build_evaluator(&config.runner);
    let mut generator = TemplateGenerator::new();
    if let Some(seed) = config.evolution.seed {
        generator = generator.with_seed(seed);
    }
    let orchestrator = EvolutionOrchestrator::new(
        Arc::new(generator),
        evaluator,
        Arc::new(TemplateSynthesizer::new()),
        config.evolution.clone(),
    )
    .context("invalid evolution configuration")?;
    Ok(orchestrator)
}

/// Surrogate by default; with a runner, sandboxed execution, optionally
/// screened by the surrogate.
fn build_evaluator(runner: &RunnerConfig) -> Arc<dyn Evaluator> {
    let Some(interpreter) = &runner.interpreter else {
        return Arc::new(SurrogateEvaluator::new());
    };
    let environment = runner
        .args
        .iter()
        .fold(ProcessEnvironment::new(interpreter.clone()), |env, arg| env.with_arg(arg.clone()));
    let sandbox = Arc::new(SandboxEvaluator::new(Arc::new(environment)).with_limits(runner.limits()));
    match runner.screen_threshold {
        Some(threshold) => Arc::new(CascadeEvaluator::new(
            Arc::new(SurrogateEvaluator::new()),
            sandbox,
            threshold,
        )),
        None => sandbox,
    }
}

/// Ctrl-C raises the run's cancellation signal.
fn watch_ctrl_c(cancel: CancellationHandle) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl+C, cancelling run");
            cancel.cancel();
        }
    });
}
