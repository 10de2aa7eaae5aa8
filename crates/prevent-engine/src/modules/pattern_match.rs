//! Pattern-Match Module
//!
//! Applies the loaded pattern library to every file unit and emits one
//! violation per rule occurrence at the rule's declared severity.

use super::{AnalysisInput, ValidationModule, ValidationResult, Violation};

pub struct PatternMatchModule;

impl ValidationModule for PatternMatchModule {
    fn name(&self) -> &'static str {
        "patterns"
    }

    fn validate(&self, input: &AnalysisInput) -> ValidationResult {
        let mut result = ValidationResult::new(self.name());

        for unit in input.file_units() {
            for rule in input.patterns.matches(unit) {
                for found in rule.regex.find_iter(&unit.text) {
                    let line = unit.start_line + line_offset(&unit.text, found.start());
                    let mut violation = Violation::new(
                        unit.path.clone(),
                        line,
                        rule.severity,
                        format!("known pattern '{}' matched", rule.name),
                    )
                    .with_rule(rule.name.clone());
                    if let Some(target) = &rule.target {
                        violation =
                            violation.with_suggestion(format!("consolidate into {target}"));
                    }
                    result.violations.push(violation);
                }
            }
        }

        result
    }
}

/// Number of newlines before a byte offset
fn line_offset(text: &str, byte_offset: usize) -> usize {
    text.as_bytes()[..byte_offset]
        .iter()
        .filter(|&&b| b == b'\n')
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Severity;
    use crate::config::{EngineConfig, PatternRuleConfig};
    use crate::index::{SourceUnit, UnitKind};
    use crate::patterns::PatternLibrary;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn input_with(text: &str, rules: Vec<PatternRuleConfig>) -> AnalysisInput {
        let unit = SourceUnit {
            id: "a.rs:1:a.rs".to_string(),
            path: PathBuf::from("a.rs"),
            name: "a.rs".to_string(),
            kind: UnitKind::File,
            start_line: 1,
            end_line: text.lines().count().max(1),
            tokens: Vec::new(),
            text: text.to_string(),
            raw_hash: 0,
        };
        AnalysisInput {
            units: Arc::new(vec![unit]),
            patterns: Arc::new(PatternLibrary::load(&rules).unwrap()),
            clusters: Arc::new(Vec::new()),
            config: Arc::new(EngineConfig::default()),
        }
    }

    fn rule(name: &str, pattern: &str, severity: Severity) -> PatternRuleConfig {
        PatternRuleConfig {
            name: name.to_string(),
            pattern: pattern.to_string(),
            target: Some("src/shared.rs".to_string()),
            severity,
        }
    }

    #[test]
    fn one_violation_per_occurrence_at_declared_severity() {
        let input = input_with(
            "foo().unwrap();\nbar();\nbaz().unwrap();\n",
            vec![rule("no-unwrap", r"\.unwrap\(\)", Severity::High)],
        );
        let result = PatternMatchModule.validate(&input);
        assert_eq!(result.violations.len(), 2);
        assert_eq!(result.violations[0].severity, Severity::High);
        assert_eq!(result.violations[0].line, 1);
        assert_eq!(result.violations[1].line, 3);
        assert_eq!(result.violations[0].rule.as_deref(), Some("no-unwrap"));
    }

    #[test]
    fn target_becomes_suggestion() {
        let input = input_with(
            "legacy_helper();\n",
            vec![rule("legacy-helper", "legacy_helper", Severity::Moderate)],
        );
        let result = PatternMatchModule.validate(&input);
        assert!(
            result.violations[0]
                .suggestion
                .as_deref()
                .unwrap()
                .contains("src/shared.rs")
        );
    }

    #[test]
    fn no_rules_no_violations() {
        let input = input_with("anything at all", Vec::new());
        assert!(PatternMatchModule.validate(&input).violations.is_empty());
    }
}
