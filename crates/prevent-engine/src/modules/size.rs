//! Class/Function Size Module
//!
//! Flags classes exceeding the configured line limit as HIGH violations.
//! Oversized functions are informational findings reported as LOW warnings;
//! they never block by default.

use super::{AnalysisInput, ValidationModule, ValidationResult, Violation};
use crate::Severity;
use crate::index::UnitKind;

pub struct SizeModule;

impl ValidationModule for SizeModule {
    fn name(&self) -> &'static str {
        "size"
    }

    fn validate(&self, input: &AnalysisInput) -> ValidationResult {
        let limits = input.config.limits;
        let mut result = ValidationResult::new(self.name());

        for unit in input.units.iter() {
            match unit.kind {
                UnitKind::Class if unit.line_count() > limits.max_class_lines => {
                    result.violations.push(
                        Violation::new(
                            unit.path.clone(),
                            unit.start_line,
                            Severity::High,
                            format!(
                                "class '{}' spans {} lines (limit {})",
                                unit.name,
                                unit.line_count(),
                                limits.max_class_lines
                            ),
                        )
                        .with_suggestion(
                            "Split responsibilities into smaller types (single responsibility)",
                        ),
                    );
                }
                UnitKind::Function if unit.line_count() > limits.max_function_lines => {
                    result.warnings.push(Violation::new(
                        unit.path.clone(),
                        unit.start_line,
                        Severity::Low,
                        format!(
                            "function '{}' spans {} lines (limit {})",
                            unit.name,
                            unit.line_count(),
                            limits.max_function_lines
                        ),
                    ));
                }
                _ => {}
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::index::SourceUnit;
    use crate::patterns::PatternLibrary;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn unit(name: &str, kind: UnitKind, lines: usize) -> SourceUnit {
        SourceUnit {
            id: format!("big.rs:10:{name}"),
            path: PathBuf::from("big.rs"),
            name: name.to_string(),
            kind,
            start_line: 10,
            end_line: 10 + lines - 1,
            tokens: Vec::new(),
            text: String::new(),
            raw_hash: 0,
        }
    }

    fn input(units: Vec<SourceUnit>) -> AnalysisInput {
        AnalysisInput {
            units: Arc::new(units),
            patterns: Arc::new(PatternLibrary::default()),
            clusters: Arc::new(Vec::new()),
            config: Arc::new(EngineConfig::default()),
        }
    }

    #[test]
    fn oversized_class_is_high_violation() {
        let result = SizeModule.validate(&input(vec![unit("God", UnitKind::Class, 350)]));
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].severity, Severity::High);
        assert_eq!(result.violations[0].line, 10);
        assert!(result.violations[0].message.contains("350 lines"));
    }

    #[test]
    fn class_at_limit_passes() {
        let result = SizeModule.validate(&input(vec![unit("Ok", UnitKind::Class, 300)]));
        assert!(result.violations.is_empty());
    }

    #[test]
    fn oversized_function_is_warning_not_violation() {
        let result = SizeModule.validate(&input(vec![unit("long", UnitKind::Function, 45)]));
        assert!(result.violations.is_empty());
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].severity, Severity::Low);
    }

    #[test]
    fn file_units_are_not_size_checked() {
        let result = SizeModule.validate(&input(vec![unit("main.rs", UnitKind::File, 5000)]));
        assert!(result.violations.is_empty());
        assert!(result.warnings.is_empty());
    }
}
