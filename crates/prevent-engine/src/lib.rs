//! Prevention Engine
//!
//! Repository-wide structural duplication and architectural-compliance
//! detection, designed to run as a pre-commit/CI gate:
//! - Source indexing (function/class/file units, normalized tokens)
//! - Known bad-pattern signatures (regex rules with severities)
//! - Two-stage clone detection (shingle fingerprinting + token overlap)
//! - Independent validation modules executed concurrently with timeouts
//! - A single deterministic report with a severity-based pass/fail policy
//!
//! # Usage
//!
//! ```ignore
//! use prevent_engine::{EngineConfig, PreventionEngine};
//!
//! let config = EngineConfig::load("prevent.yml")?;
//! let engine = PreventionEngine::new(config)?;
//! let report = engine.run(&[path.into()]).await;
//! println!("{}", report.to_json());
//! ```

pub mod advisory;
pub mod config;
pub mod index;
pub mod modules;
pub mod orchestrator;
pub mod patterns;
pub mod report;
pub mod scan;
pub mod similarity;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use advisory::{Advisor, NoopAdvisor};
pub use config::{EngineConfig, FailOn, ModuleConfig, SeverityBands, SimilarityConfig};
pub use index::{SourceIndex, SourceUnit, UnitKind};
pub use modules::{AnalysisInput, ValidationModule, ValidationResult, Violation};
pub use orchestrator::PreventionEngine;
pub use patterns::{PatternLibrary, PatternRule};
pub use report::{AggregateReport, SeverityCounts};
pub use similarity::{DuplicateCluster, DuplicationStats, SimilarityAnalyzer};

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Engine error types
///
/// Only configuration errors abort before a report is produced. Everything
/// else is recovered into the report as violations so CI output is never
/// silently empty.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid pattern rule '{name}': {message}")]
    InvalidPattern { name: String, message: String },

    #[error("Invalid glob pattern: {0}")]
    Glob(#[from] globset::Error),
}

/// Severity level for violations and pattern rules
///
/// `Error` is reserved for engine failures (module panic or timeout). It is
/// surfaced in reports but never participates in the pass/fail policy, and
/// pattern rules are not allowed to declare it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    #[serde(alias = "low")]
    Low,
    #[serde(alias = "moderate")]
    Moderate,
    #[serde(alias = "high")]
    High,
    #[serde(alias = "critical")]
    Critical,
    #[serde(alias = "error")]
    Error,
}

impl Severity {
    /// True for the four policy levels a pattern rule may declare
    pub fn is_policy_level(self) -> bool {
        !matches!(self, Self::Error)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Critical => write!(f, "CRITICAL"),
            Self::High => write!(f, "HIGH"),
            Self::Moderate => write!(f, "MODERATE"),
            Self::Low => write!(f, "LOW"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// Locate the repository root by walking up from a path until a directory
/// containing `.git` or a workspace `Cargo.toml` is found.
pub fn find_repo_root_from(start: &std::path::Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(".git").exists() {
            return Some(current);
        }
        let cargo_toml = current.join("Cargo.toml");
        if cargo_toml.exists() {
            if let Ok(content) = std::fs::read_to_string(&cargo_toml) {
                if content.contains("[workspace]") {
                    return Some(current);
                }
            }
        }
        if !current.pop() {
            return None;
        }
    }
}
