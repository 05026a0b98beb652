//! AccessGraph CLI
//!
//! Reads a User/Role/Permission CSV, builds the entitlement graph, flags
//! users holding toxic permission combinations, and writes:
//! - the alert report (CSV)
//! - a render-ready graph export (JSON and/or Graphviz DOT)

use accessgraph_entitlements::{analyze, read_rows_with, Analysis, IngestOptions, Strictness};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

mod config;

use config::AnalyzerConfig;

/// AccessGraph CLI
#[derive(Parser)]
#[command(name = "accessgraph")]
#[command(about = "Detect toxic permission combinations in user/role/permission data")]
#[command(version)]
struct Cli {
    /// Path to configuration file (built-in defaults when omitted)
    #[arg(short, long, global = true, env = "ACCESSGRAPH_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a CSV file with columns User, Role, Permission
    Analyze {
        /// Input CSV file
        #[arg(short, long)]
        input: PathBuf,

        /// Write the alert report (CSV) here
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// Write the graph export (JSON) here
        #[arg(long)]
        graph_json: Option<PathBuf>,

        /// Write the graph as Graphviz DOT here
        #[arg(long)]
        dot: Option<PathBuf>,

        /// Row strictness: permissive, skip or strict (overrides config)
        #[arg(long)]
        strictness: Option<Strictness>,

        /// Strip surrounding whitespace from every field
        #[arg(long)]
        trim: bool,
    },

    /// List the configured toxic combinations
    Combos,

    /// Print the default configuration as TOML
    DefaultConfig,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AnalyzerConfig::load_or_default(cli.config.as_deref())?;

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { config.logging.level.as_str() };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    config.validate()?;
    match &cli.config {
        Some(path) => info!("Loaded configuration from {:?}", path),
        None => info!("Using built-in configuration"),
    }

    match cli.command {
        Command::Analyze {
            input,
            report,
            graph_json,
            dot,
            strictness,
            trim,
        } => {
            let mut options = config.ingest.options();
            if let Some(strictness) = strictness {
                options.strictness = strictness;
            }
            if trim {
                options.trim_whitespace = true;
            }
            let analysis = run_analysis(&input, &config, options)?;

            print_alerts(&analysis);

            if let Some(path) = report {
                write_report(&analysis, &path)?;
            }
            if let Some(path) = graph_json {
                write_graph_json(&analysis, &path)?;
            }
            if let Some(path) = dot {
                std::fs::write(&path, analysis.to_dot())
                    .with_context(|| format!("Failed to write DOT file {}", path.display()))?;
                info!("Graph DOT written to {:?}", path);
            }
        }
        Command::Combos => {
            let policy = config.policy();
            if policy.is_empty() {
                println!("No toxic combinations configured.");
            }
            for (idx, combo) in policy.combos().iter().enumerate() {
                match &combo.name {
                    Some(name) => println!("{}. {}: {}", idx + 1, name, combo.joined()),
                    None => println!("{}. {}", idx + 1, combo.joined()),
                }
            }
        }
        Command::DefaultConfig => {
            let text = toml::to_string_pretty(&AnalyzerConfig::default())
                .context("Failed to serialize default configuration")?;
            print!("{}", text);
        }
    }

    Ok(())
}

/// Read rows and run the pipeline
fn run_analysis(input: &Path, config: &AnalyzerConfig, options: IngestOptions) -> Result<Analysis> {
    let file = File::open(input)
        .with_context(|| format!("Failed to open input file {}", input.display()))?;

    let rows = read_rows_with(BufReader::new(file), options)
        .with_context(|| format!("Failed to read rows from {}", input.display()))?;
    info!("Read {} rows from {:?} ({} mode)", rows.len(), input, options.strictness);

    Ok(analyze(&rows, &config.policy()))
}

fn print_alerts(analysis: &Analysis) {
    if !analysis.has_alerts() {
        println!("No toxic combinations detected.");
        return;
    }

    println!("Toxic permission alerts:");
    for alert in &analysis.alerts {
        println!("  {}", alert.message());
    }
}

fn write_report(analysis: &Analysis, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create report file {}", path.display()))?;

    let report = analysis.report();
    report.write_csv(BufWriter::new(file))?;

    info!("Alert report ({} rows) written to {:?}", report.len(), path);
    Ok(())
}

fn write_graph_json(analysis: &Analysis, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create graph export {}", path.display()))?;

    let mut writer = BufWriter::new(file);
    analysis.export().write_json(&mut writer)?;
    writer.flush()?;

    info!("Graph export written to {:?}", path);
    Ok(())
}
