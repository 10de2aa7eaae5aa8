//! Prevent - CLI Entry Point
//!
//! Thin facade over `prevent-engine`, intended to be invoked from
//! pre-commit hooks or CI. Exit codes form the contract with callers:
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | Pass |
//! | 1 | Policy violations found (per `--fail-on`) |
//! | 2 | Engine internal error (e.g. config load failure) |

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use prevent_engine::{EngineConfig, PreventionEngine};

/// Command line interface for the prevention engine
#[derive(Parser, Debug)]
#[command(name = "prevent")]
#[command(about = "Structural duplication and architecture-compliance gate")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze the given paths and report violations
    Check {
        /// Files or directories to analyze (defaults to the enclosing
        /// repository root, or the current directory outside a repository)
        paths: Vec<PathBuf>,

        /// Report output format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,

        /// Severity level that fails the run (critical or high)
        #[arg(long)]
        fail_on: Option<String>,

        /// Path to the YAML configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Overall run timeout in milliseconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Print the loaded pattern library for inspection
    ListPatterns {
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,

        /// Path to the YAML configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Format {
    Text,
    Json,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("prevent: {e:#}");
            2
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    match cli.command {
        Command::Check {
            paths,
            format,
            fail_on,
            config,
            timeout,
        } => {
            let mut engine_config = load_config(config.as_deref())?;
            if let Some(level) = fail_on {
                engine_config.fail_on = level.parse()?;
            }
            if let Some(ms) = timeout {
                engine_config.run_timeout_ms = Some(ms);
            }

            let engine = PreventionEngine::new(engine_config)?;
            let paths = if paths.is_empty() {
                vec![default_root()]
            } else {
                paths
            };

            let report = engine.run(&paths).await;
            tracing::debug!(pass = report.pass, violations = report.counts.total(), "run complete");
            match format {
                Format::Json => println!("{}", report.to_json()),
                Format::Text => print!("{}", report.to_text()),
            }
            Ok(report.exit_code())
        }

        Command::ListPatterns { format, config } => {
            let engine_config = load_config(config.as_deref())?;
            let engine = PreventionEngine::new(engine_config)?;
            let rules = engine.patterns().rules();
            match format {
                Format::Json => {
                    let entries: Vec<serde_json::Value> = rules
                        .iter()
                        .map(|rule| {
                            serde_json::json!({
                                "name": rule.name,
                                "pattern": rule.regex.as_str(),
                                "target": rule.target,
                                "severity": rule.severity,
                            })
                        })
                        .collect();
                    println!("{}", serde_json::to_string_pretty(&entries)?);
                }
                Format::Text => {
                    if rules.is_empty() {
                        println!("no pattern rules configured");
                    }
                    for rule in rules {
                        let target = rule.target.as_deref().unwrap_or("-");
                        println!(
                            "{:<28} {:<9} {:<40} -> {}",
                            rule.name,
                            rule.severity.to_string(),
                            rule.regex.as_str(),
                            target
                        );
                    }
                }
            }
            Ok(0)
        }
    }
}

/// The enclosing repository root, falling back to the current directory
fn default_root() -> PathBuf {
    std::env::current_dir()
        .ok()
        .and_then(|dir| prevent_engine::find_repo_root_from(&dir))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}
