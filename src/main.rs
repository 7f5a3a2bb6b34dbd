//! @ai:module:intent CLI for the toolchain benchmark harness
//! @ai:module:layer presentation

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use toolbench::{
    config::BenchmarkConfig,
    matrix::ColumnBinding,
    runner::{Environment, PlannedInvocation, SystemProcessRunner},
    session::BenchmarkSession,
};

#[derive(Parser)]
#[command(name = "toolbench")]
#[command(about = "Run a toolchain once per benchmark task and tabulate extracted metrics")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every task through the toolchain and write the result table
    Run {
        /// Path to configuration file
        #[arg(short, long, default_value = "bench.json")]
        config: PathBuf,

        /// Override the application path (tool working directory)
        #[arg(long)]
        app_path: Option<PathBuf>,

        /// Override the task table path
        #[arg(long)]
        bench_path: Option<PathBuf>,

        /// Override the result table path
        #[arg(long)]
        result_path: Option<PathBuf>,

        /// Print every command that would run, without running anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Check configuration, task table and tool availability without running tools
    Validate {
        /// Path to configuration file
        #[arg(short, long, default_value = "bench.json")]
        config: PathBuf,
    },

    /// Write a template configuration
    Init {
        /// Output path for config file
        #[arg(short, long, default_value = "bench.json")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("toolbench=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            app_path,
            bench_path,
            result_path,
            dry_run,
        } => run_benchmarks(RunArgs {
            config,
            app_path,
            bench_path,
            result_path,
            dry_run,
        }),
        Commands::Validate { config } => validate(config),
        Commands::Init { output } => init_config(output),
    }
}

struct RunArgs {
    config: PathBuf,
    app_path: Option<PathBuf>,
    bench_path: Option<PathBuf>,
    result_path: Option<PathBuf>,
    dry_run: bool,
}

/// @ai:intent Run the benchmark suite and store the results
/// @ai:effects io, fs:write
fn run_benchmarks(args: RunArgs) -> Result<()> {
    let mut config = load_config(&args.config)?;

    if let Some(app_path) = args.app_path {
        config.app_path = app_path;
    }
    if let Some(bench_path) = args.bench_path {
        config.bench_path = bench_path;
    }
    if let Some(result_path) = args.result_path {
        config.result_path = result_path;
    }

    let session = build_session(&config)?;
    session.preflight().log_warnings();

    if args.dry_run {
        tracing::info!("Dry run: no tool will be started and no results written");
        print_plan(&session.plan());
        return Ok(());
    }

    let summary = session.run().context("Benchmark run aborted; no results written")?;

    println!(
        "Written {} tasks x {} columns into {}",
        summary.tasks,
        summary.columns,
        summary.result_path.display()
    );
    Ok(())
}

/// @ai:intent Validate configuration and task table, report tool availability
/// @ai:effects fs:read
fn validate(config_path: PathBuf) -> Result<()> {
    let config = load_config(&config_path)?;
    let session = build_session(&config)?;
    let runner = session.runner();

    println!("Toolchain ({} stages):", runner.toolchain().len());
    for (index, tool) in runner.toolchain().stages().iter().enumerate() {
        let fields: Vec<_> = tool.field_names().collect();
        println!("  [{}] {:<30} fields: {}", index, tool.command(), fields.join(", "));
    }

    println!();
    println!("Task table: {} tasks", runner.matrix().len());
    println!("{:<30} {:<12} {:<6} {}", "Column", "Binding", "Stage", "Key");
    println!("{}", "-".repeat(60));
    for (column, binding) in runner.matrix().schema().bindings() {
        match binding {
            ColumnBinding::Passthrough => println!("{:<30} {:<12}", column, "passthrough"),
            ColumnBinding::Override { stage, kind, key } => {
                println!("{:<30} {:<12} {:<6} {}", column, kind.as_str(), stage, key)
            }
        }
    }

    let status = session.preflight();
    status.log_warnings();
    if !status.is_ready() {
        anyhow::bail!("{} toolchain command(s) not found", status.missing_tools.len());
    }

    println!();
    println!("Validation passed!");
    Ok(())
}

/// @ai:intent Initialize template configuration file
/// @ai:effects fs:write
fn init_config(output: PathBuf) -> Result<()> {
    BenchmarkConfig::template()
        .save(&output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("Configuration saved to {}", output.display());
    Ok(())
}

/// @ai:effects fs:read
fn load_config(path: &Path) -> Result<BenchmarkConfig> {
    tracing::info!("Loading configuration from {}", path.display());
    BenchmarkConfig::load(path).with_context(|| format!("Invalid configuration {}", path.display()))
}

/// @ai:effects fs:read, env:read
fn build_session(config: &BenchmarkConfig) -> Result<BenchmarkSession<SystemProcessRunner>> {
    BenchmarkSession::from_config(
        config,
        Arc::new(SystemProcessRunner::new()),
        Environment::capture(),
    )
    .with_context(|| format!("Failed to prepare tasks from {}", config.bench_path.display()))
}

/// @ai:intent Print every planned invocation, grouped by task
/// @ai:effects io
fn print_plan(plan: &[PlannedInvocation]) {
    let mut current_task = None;

    for invocation in plan {
        if current_task != Some(invocation.task) {
            println!();
            println!("Task {}", invocation.task + 1);
            println!("{}", "-".repeat(40));
            current_task = Some(invocation.task);
        }
        println!(
            "  [{}] (cd {}) {}",
            invocation.stage,
            invocation.request.working_dir.display(),
            invocation.request.display_command()
        );
    }
}
