//! `atos` command-line interface.
//!
//! ```text
//! atos guidance --snapshot case.yaml --module insurance
//! atos guidance --snapshot case.json --all --json
//! atos validate --snapshot case.json
//! atos ask --snapshot case.json --module contractor "What should we do next?"
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use atos_core::snapshot::validate_snapshot_schema;
use atos_core::{evaluate_with, generate_all_guidance, rank, CaseSnapshot, GuidanceItem, Module, Thresholds};
use atos_runtime::{ConversationRequest, ConversationalAdapter, ConversationalResponse};

/// Deterministic guidance for property and insurance-claim cases
#[derive(Parser)]
#[command(name = "atos", author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Debug-level logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print ranked guidance for a snapshot
    Guidance {
        /// Snapshot file (.json, .yaml or .yml)
        #[arg(short, long, value_name = "FILE")]
        snapshot: PathBuf,

        /// Module to evaluate
        #[arg(short, long, conflicts_with = "all")]
        module: Option<String>,

        /// Evaluate every module
        #[arg(long)]
        all: bool,

        /// Threshold overrides (.json, .yaml or .yml)
        #[arg(long, value_name = "FILE")]
        thresholds: Option<PathBuf>,

        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// Check a snapshot against the schema
    Validate {
        #[arg(short, long, value_name = "FILE")]
        snapshot: PathBuf,
    },

    /// Ask a question about one module
    Ask {
        #[arg(short, long, value_name = "FILE")]
        snapshot: PathBuf,

        #[arg(short, long)]
        module: String,

        /// The question
        message: String,

        /// Emit JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Yaml,
}

fn format_of(path: &Path) -> Result<Format> {
    match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
        Some("json") => Ok(Format::Json),
        Some("yaml") | Some("yml") => Ok(Format::Yaml),
        _ => bail!("Unsupported file extension for {}: expected .json, .yaml or .yml", path.display()),
    }
}

fn read_value(path: &Path) -> Result<serde_json::Value> {
    let format = format_of(path)?;
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value = match format {
        Format::Json => serde_json::from_str(&contents)
            .with_context(|| format!("Invalid JSON in {}", path.display()))?,
        Format::Yaml => serde_yaml::from_str(&contents)
            .with_context(|| format!("Invalid YAML in {}", path.display()))?,
    };
    Ok(value)
}

fn load_snapshot(path: &Path) -> Result<CaseSnapshot> {
    CaseSnapshot::from_value(read_value(path)?)
        .with_context(|| format!("Invalid snapshot {}", path.display()))
}

fn load_thresholds(path: Option<&Path>) -> Result<Thresholds> {
    match path {
        Some(path) => serde_json::from_value(read_value(path)?)
            .with_context(|| format!("Invalid thresholds in {}", path.display())),
        None => Ok(Thresholds::default()),
    }
}

fn print_items(items: &[GuidanceItem]) {
    for (n, item) in items.iter().enumerate() {
        println!(
            "{:>2}. [{}] {} ({}, confidence {:.2})",
            n + 1,
            item.severity,
            item.title,
            item.module,
            item.confidence_score
        );
        println!("    Why: {}", item.why_this_matters);
        println!("    Do:  {}", item.recommendation);
    }
}

fn print_response(response: &ConversationalResponse) {
    println!("{}", response.message);
    if !response.insights.is_empty() {
        println!();
        for insight in &response.insights {
            println!("  [{:?}] {}", insight.kind, insight.text);
        }
    }
    if !response.actions.is_empty() {
        println!("\nActions:");
        for (n, action) in response.actions.iter().enumerate() {
            println!("  {}. {}", n + 1, action);
        }
    }
    match response.fallback_reason {
        Some(reason) => println!("\nconfidence: {:?} (deterministic: {})", response.confidence, reason),
        None => println!("\nconfidence: {:?}", response.confidence),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "atos=debug,atos_core=debug,atos_runtime=debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn guidance(
    snapshot: &Path,
    module: Option<String>,
    all: bool,
    thresholds: Option<&Path>,
    json: bool,
) -> Result<()> {
    let snapshot = load_snapshot(snapshot)?;
    let thresholds = load_thresholds(thresholds)?;

    let items = match (module, all) {
        (Some(module), _) => {
            let module: Module = module.parse()?;
            rank(evaluate_with(module, &snapshot, &thresholds))
        }
        (None, true) => generate_all_guidance(&snapshot, &thresholds),
        (None, false) => bail!("Pass --module <name> or --all"),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else {
        println!("Case {} ({})", snapshot.case_id, snapshot.stage.as_str());
        print_items(&items);
    }
    Ok(())
}

fn validate(path: &Path) -> Result<bool> {
    let value = read_value(path)?;
    if let Err(errors) = validate_snapshot_schema(&value) {
        for error in &errors {
            eprintln!("  {}", error);
        }
        eprintln!("{}: {} schema error(s)", path.display(), errors.len());
        return Ok(false);
    }
    match CaseSnapshot::from_value(value) {
        Ok(snapshot) => {
            println!("{}: valid (case {}, stage {})", path.display(), snapshot.case_id, snapshot.stage.as_str());
            Ok(true)
        }
        Err(e) => {
            eprintln!("{}: {}", path.display(), e);
            Ok(false)
        }
    }
}

async fn ask(snapshot: &Path, module: &str, message: &str, json: bool) -> Result<()> {
    let snapshot = load_snapshot(snapshot)?;
    let module: Module = module.parse()?;

    let adapter = ConversationalAdapter::from_env();
    tracing::debug!(adapter = ?adapter, "adapter ready");

    let response = adapter
        .respond(ConversationRequest::new(module, &snapshot, message))
        .await;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_response(&response);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let outcome = match cli.command {
        Commands::Guidance {
            snapshot,
            module,
            all,
            thresholds,
            json,
        } => guidance(&snapshot, module, all, thresholds.as_deref(), json).map(|_| true),
        Commands::Validate { snapshot } => validate(&snapshot),
        Commands::Ask {
            snapshot,
            module,
            message,
            json,
        } => ask(&snapshot, &module, &message, json).await.map(|_| true),
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_format_by_extension() {
        assert_eq!(format_of(Path::new("case.json")).unwrap(), Format::Json);
        assert_eq!(format_of(Path::new("case.YML")).unwrap(), Format::Yaml);
        assert_eq!(format_of(Path::new("case.yaml")).unwrap(), Format::Yaml);
        assert!(format_of(Path::new("case.txt")).is_err());
        assert!(format_of(Path::new("case")).is_err());
    }

    #[test]
    fn test_parse_ask() {
        let cli = Cli::try_parse_from([
            "atos", "ask", "--snapshot", "case.json", "--module", "insurance", "What's missing?",
        ])
        .unwrap();
        match cli.command {
            Commands::Ask { module, message, json, .. } => {
                assert_eq!(module, "insurance");
                assert_eq!(message, "What's missing?");
                assert!(!json);
            }
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn test_module_and_all_conflict() {
        assert!(Cli::try_parse_from([
            "atos", "guidance", "--snapshot", "c.json", "--module", "equity", "--all",
        ])
        .is_err());
    }
}
