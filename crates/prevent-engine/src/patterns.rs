//! Pattern Library
//!
//! Named signatures for known undesirable code patterns, loaded from
//! configuration and compiled once at startup. An invalid or duplicate rule
//! fails loading; it is never silently ignored.

use regex::Regex;

use crate::config::PatternRuleConfig;
use crate::index::SourceUnit;
use crate::{EngineError, Result, Severity};

/// A compiled detection rule
#[derive(Debug, Clone)]
pub struct PatternRule {
    pub name: String,
    pub regex: Regex,
    /// Informational consolidation target for matched code
    pub target: Option<String>,
    pub severity: Severity,
}

/// The set of compiled pattern rules for one run
#[derive(Debug, Clone, Default)]
pub struct PatternLibrary {
    rules: Vec<PatternRule>,
}

impl PatternLibrary {
    /// Compile rules from configuration, failing fast on invalid regex,
    /// duplicate names or non-policy severities.
    pub fn load(configs: &[PatternRuleConfig]) -> Result<Self> {
        let mut rules = Vec::with_capacity(configs.len());
        let mut seen = std::collections::HashSet::new();

        for config in configs {
            if !seen.insert(config.name.as_str()) {
                return Err(EngineError::Config(format!(
                    "duplicate pattern rule name '{}'",
                    config.name
                )));
            }
            if !config.severity.is_policy_level() {
                return Err(EngineError::InvalidPattern {
                    name: config.name.clone(),
                    message: "severity must be CRITICAL, HIGH, MODERATE or LOW".to_string(),
                });
            }
            let regex = Regex::new(&config.pattern).map_err(|e| EngineError::InvalidPattern {
                name: config.name.clone(),
                message: e.to_string(),
            })?;
            rules.push(PatternRule {
                name: config.name.clone(),
                regex,
                target: config.target.clone(),
                severity: config.severity,
            });
        }

        Ok(Self { rules })
    }

    /// Every rule whose expression matches the unit's text. A unit may match
    /// multiple rules.
    pub fn matches(&self, unit: &SourceUnit) -> Vec<&PatternRule> {
        self.rules
            .iter()
            .filter(|rule| rule.regex.is_match(&unit.text))
            .collect()
    }

    /// All loaded rules, in configuration order
    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::UnitKind;
    use std::path::PathBuf;

    fn rule(name: &str, pattern: &str, severity: Severity) -> PatternRuleConfig {
        PatternRuleConfig {
            name: name.to_string(),
            pattern: pattern.to_string(),
            target: Some("src/shared/mod.rs".to_string()),
            severity,
        }
    }

    fn unit_with_text(text: &str) -> SourceUnit {
        SourceUnit {
            id: "a.rs:1:a".to_string(),
            path: PathBuf::from("a.rs"),
            name: "a".to_string(),
            kind: UnitKind::File,
            start_line: 1,
            end_line: text.lines().count().max(1),
            tokens: Vec::new(),
            text: text.to_string(),
            raw_hash: 0,
        }
    }

    #[test]
    fn load_compiles_rules() {
        let library = PatternLibrary::load(&[
            rule("ad-hoc-retry", r"for\s+attempt\s+in", Severity::High),
            rule("println-debug", r"println!\(", Severity::Low),
        ])
        .unwrap();
        assert_eq!(library.len(), 2);
    }

    #[test]
    fn load_rejects_duplicate_names() {
        let err = PatternLibrary::load(&[
            rule("same", "a", Severity::Low),
            rule("same", "b", Severity::Low),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn load_rejects_invalid_regex() {
        let err = PatternLibrary::load(&[rule("bad", "[unclosed", Severity::High)]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidPattern { .. }));
    }

    #[test]
    fn unit_may_match_multiple_rules() {
        let library = PatternLibrary::load(&[
            rule("uses-unwrap", r"\.unwrap\(\)", Severity::High),
            rule("uses-expect", r"\.expect\(", Severity::Moderate),
        ])
        .unwrap();

        let unit = unit_with_text("let x = foo().unwrap();\nlet y = bar().expect(\"boom\");");
        let matched = library.matches(&unit);
        assert_eq!(matched.len(), 2);

        let clean = unit_with_text("let x = foo()?;");
        assert!(library.matches(&clean).is_empty());
    }
}
