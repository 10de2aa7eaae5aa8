//! Validation Modules
//!
//! Independent, pluggable checks over the shared read-only analysis inputs.
//! Modules must not share mutable state; every module consumes the same
//! immutable `AnalysisInput` and emits a uniform `ValidationResult`. A
//! module failure (panic or timeout) is converted by the orchestrator into a
//! single ERROR violation naming the module, never a crash.

pub mod duplication;
pub mod literals;
pub mod pattern_match;
pub mod security;
pub mod size;

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::Severity;
use crate::config::EngineConfig;
use crate::index::{SourceUnit, UnitKind};
use crate::patterns::PatternLibrary;
use crate::similarity::DuplicateCluster;

pub use duplication::DuplicationModule;
pub use literals::LiteralModule;
pub use pattern_match::PatternMatchModule;
pub use security::SecurityModule;
pub use size::SizeModule;

/// A single finding
#[derive(Debug, Clone, Serialize)]
pub struct Violation {
    pub file: PathBuf,
    pub line: usize,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
}

impl Violation {
    pub fn new(
        file: impl Into<PathBuf>,
        line: usize,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            line,
            severity,
            message: message.into(),
            suggestion: None,
            rule: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rule = Some(rule.into());
        self
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {}:{} {}",
            self.severity,
            self.file.display(),
            self.line,
            self.message
        )
    }
}

/// Uniform output of one validation module
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub name: String,
    pub violations: Vec<Violation>,
    pub warnings: Vec<Violation>,
    pub duration_ms: u64,
}

impl ValidationResult {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            violations: Vec::new(),
            warnings: Vec::new(),
            duration_ms: 0,
        }
    }

    /// Result representing a module-level failure (panic, timeout)
    pub fn engine_error(name: impl Into<String>, message: impl Into<String>) -> Self {
        let name = name.into();
        let mut result = Self::new(name.clone());
        result.violations.push(Violation::new(
            PathBuf::new(),
            0,
            Severity::Error,
            format!("module '{name}' failed: {}", message.into()),
        ));
        result
    }
}

/// Read-only shared inputs handed to every module. Built once per run;
/// no module may mutate them, so no locks are needed.
#[derive(Clone)]
pub struct AnalysisInput {
    pub units: Arc<Vec<SourceUnit>>,
    pub patterns: Arc<PatternLibrary>,
    pub clusters: Arc<Vec<DuplicateCluster>>,
    pub config: Arc<EngineConfig>,
}

impl AnalysisInput {
    /// Whole-file units only (one per indexed file)
    pub fn file_units(&self) -> impl Iterator<Item = &SourceUnit> {
        self.units.iter().filter(|u| u.kind == UnitKind::File)
    }
}

/// The minimal interface every validation module implements
pub trait ValidationModule: Send + Sync {
    /// Stable module name used for report ordering and configuration
    fn name(&self) -> &'static str;

    /// Run the check against the shared inputs
    fn validate(&self, input: &AnalysisInput) -> ValidationResult;
}

/// The built-in module set, filtered by per-module enable flags
pub fn default_modules(config: &EngineConfig) -> Vec<Arc<dyn ValidationModule>> {
    let all: Vec<Arc<dyn ValidationModule>> = vec![
        Arc::new(DuplicationModule),
        Arc::new(PatternMatchModule),
        Arc::new(LiteralModule),
        Arc::new(SizeModule),
        Arc::new(SecurityModule),
    ];
    all.into_iter()
        .filter(|m| {
            config
                .modules
                .get(m.name())
                .is_none_or(|entry| entry.enabled)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_error_result_carries_error_severity() {
        let result = ValidationResult::engine_error("duplication", "timed out after 25ms");
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].severity, Severity::Error);
        assert!(result.violations[0].message.contains("duplication"));
        assert!(result.violations[0].message.contains("timed out"));
    }

    #[test]
    fn default_modules_respects_enable_flags() {
        let mut config = EngineConfig::default();
        assert_eq!(default_modules(&config).len(), 5);

        config.modules.security.enabled = false;
        let names: Vec<&str> = default_modules(&config).iter().map(|m| m.name()).collect();
        assert_eq!(names.len(), 4);
        assert!(!names.contains(&"security"));
    }

    #[test]
    fn violation_display_includes_location() {
        let v = Violation::new("src/lib.rs", 42, Severity::High, "oversized class");
        let text = v.to_string();
        assert!(text.contains("src/lib.rs:42"));
        assert!(text.contains("HIGH"));
    }
}
