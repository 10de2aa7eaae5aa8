//! Configuration-Literal Module
//!
//! Flags literal constants/strings repeated across the codebase at or above
//! the configured occurrence count, outside designated configuration files.
//! Repetition of the same magic value is a consolidation smell: the value
//! belongs in one configuration location.

use std::collections::BTreeMap;
use std::path::PathBuf;

use once_cell::sync::Lazy;
use regex::Regex;

use super::{AnalysisInput, ValidationModule, ValidationResult, Violation};
use crate::Severity;
use crate::config::build_globset;

/// String literals with at least 4 meaningful characters
static STRING_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"\n]{4,})""#).unwrap());

/// Multi-digit numeric literals; single digits are too noisy to count
static NUMERIC_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d[\d_]{1,}(?:\.\d+)?\b").unwrap());

pub struct LiteralModule;

impl ValidationModule for LiteralModule {
    fn name(&self) -> &'static str {
        "literals"
    }

    fn validate(&self, input: &AnalysisInput) -> ValidationResult {
        let mut result = ValidationResult::new(self.name());
        let Ok(config_files) = build_globset(&input.config.literals.config_files) else {
            // Globs are validated at load time; an error here is a programmer bug
            return ValidationResult::engine_error(self.name(), "invalid config-file globs");
        };

        // literal text -> every (file, line) it appears at, in scan order
        let mut occurrences: BTreeMap<String, Vec<(PathBuf, usize)>> = BTreeMap::new();

        for unit in input.file_units() {
            if config_files.is_match(&unit.path) {
                continue;
            }
            for (offset, line) in unit.text.lines().enumerate() {
                let line_no = unit.start_line + offset;
                let mut masked = line.as_bytes().to_vec();
                for m in STRING_LITERAL.find_iter(line) {
                    occurrences
                        .entry(m.as_str().to_string())
                        .or_default()
                        .push((unit.path.clone(), line_no));
                    // A number inside a string is part of that string, not
                    // a second literal
                    masked[m.range()].fill(b' ');
                }
                let masked = String::from_utf8_lossy(&masked);
                for m in NUMERIC_LITERAL.find_iter(&masked) {
                    occurrences
                        .entry(m.as_str().to_string())
                        .or_default()
                        .push((unit.path.clone(), line_no));
                }
            }
        }

        let min = input.config.literals.min_occurrences;
        for (literal, sites) in occurrences {
            if sites.len() < min {
                continue;
            }
            let (first_file, first_line) = &sites[0];
            result.violations.push(
                Violation::new(
                    first_file.clone(),
                    *first_line,
                    Severity::Moderate,
                    format!("literal {literal} repeated {} times", sites.len()),
                )
                .with_suggestion(
                    "Hoist the repeated value into a named constant or configuration entry",
                ),
            );
        }

        result
    }
}
