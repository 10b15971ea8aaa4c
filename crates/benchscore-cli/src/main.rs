//! Benchscore CLI
//!
//! The `benchscore` command scores recorded benchmark runs and emits the
//! ranked report as JSON.
//!
//! ## Commands
//!
//! - `rank`: Rank every task in a run set and write the report artifact
//! - `check-config`: Validate a task category table and print the resolved tasks

use anyhow::{Context, Result};
use benchscore_core::{
    load_registry, write_report_json, CategoryDescriptor, CategoryRegistry, RankingSelector,
    ReportArtifact, RunSet, ScoringConfig, StyleOffenseTable, METRICS,
};
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "benchscore")]
#[command(author = "Benchscore Developers")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Benchmark scoring and aggregation engine", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank implementations for every task in a run set
    Rank {
        /// Run set file (JSON object: task id -> list of run records)
        #[arg(long)]
        runs: PathBuf,

        /// Task category table (TOML, or JSON with a .json extension)
        #[arg(long, env = "BENCHSCORE_TASKS")]
        tasks: PathBuf,

        /// Style offense counts (JSON object: task id -> implementation -> counts)
        #[arg(long)]
        offenses: Option<PathBuf>,

        /// Output path for the report artifact (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a task category table
    CheckConfig {
        /// Task category table (TOML, or JSON with a .json extension)
        #[arg(long, env = "BENCHSCORE_TASKS")]
        tasks: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    benchscore_core::init_tracing(cli.json, level);

    let result = match cli.command {
        Commands::Rank {
            runs,
            tasks,
            offenses,
            output,
        } => cmd_rank(&runs, &tasks, offenses.as_deref(), output.as_deref()),
        Commands::CheckConfig { tasks } => cmd_check_config(&tasks),
    };

    METRICS.flush();
    result
}

fn load_tasks(path: &Path) -> Result<CategoryRegistry> {
    load_registry(path).with_context(|| format!("load task table {:?}", path))
}

fn load_run_set(path: &Path) -> Result<RunSet> {
    let content = std::fs::read_to_string(path).with_context(|| format!("read {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("parse run set {:?}", path))
}

fn load_offenses(path: &Path) -> Result<StyleOffenseTable> {
    let content = std::fs::read_to_string(path).with_context(|| format!("read {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("parse offense table {:?}", path))
}

fn cmd_rank(
    runs_path: &Path,
    tasks_path: &Path,
    offenses_path: Option<&Path>,
    output: Option<&Path>,
) -> Result<()> {
    let registry = load_tasks(tasks_path)?;
    let run_set = load_run_set(runs_path)?;
    let offenses = match offenses_path {
        Some(path) => load_offenses(path)?,
        None => StyleOffenseTable::new(),
    };

    let report = RankingSelector::new(&registry)
        .with_offenses(&offenses)
        .build_report(&run_set);
    info!(
        tasks = report.tasks.len(),
        failed = report.failed_tasks.len(),
        "report built"
    );

    let artifact = ReportArtifact::new(report, Utc::now())?;
    match output {
        Some(path) => {
            write_report_json(path, &artifact)?;
            info!(path = ?path, digest = %artifact.report_digest, "report written");
        }
        None => println!("{}", serde_json::to_string_pretty(&artifact)?),
    }
    Ok(())
}

fn check_config_summary(registry: &CategoryRegistry) -> Result<serde_json::Value> {
    let tasks = registry
        .task_ids()
        .map(|id| registry.descriptor_for(id))
        .collect::<benchscore_core::Result<Vec<CategoryDescriptor>>>()?;
    let scoring: &ScoringConfig = registry.scoring_config();
    Ok(json!({
        "fallback": registry.fallback(),
        "scoring": scoring,
        "tasks": tasks,
    }))
}

fn cmd_check_config(tasks_path: &Path) -> Result<()> {
    let registry = load_tasks(tasks_path)?;
    let summary = check_config_summary(&registry)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
