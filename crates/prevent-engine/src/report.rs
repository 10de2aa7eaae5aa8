//! Aggregate Report
//!
//! The single structured output of one engine run: per-module results in
//! deterministic (name-sorted) order, severity counts, and the pass/fail
//! decision. Rendered as JSON for CI consumption or as a human-readable
//! terminal summary.

use serde::Serialize;

use crate::Severity;
use crate::config::FailOn;
use crate::modules::ValidationResult;
use crate::similarity::DuplicationStats;

/// Violation totals by severity. Engine errors are tracked separately and
/// never feed the pass/fail policy.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SeverityCounts {
    pub critical: usize,
    pub high: usize,
    pub moderate: usize,
    pub low: usize,
}

impl SeverityCounts {
    fn record(&mut self, severity: Severity) {
        match severity {
            Severity::Critical => self.critical += 1,
            Severity::High => self.high += 1,
            Severity::Moderate => self.moderate += 1,
            Severity::Low => self.low += 1,
            Severity::Error => {}
        }
    }

    pub fn total(&self) -> usize {
        self.critical + self.high + self.moderate + self.low
    }
}

/// Final output of one engine invocation
#[derive(Debug, Clone, Serialize)]
pub struct AggregateReport {
    pub pass: bool,
    pub duration_ms: u64,
    pub counts: SeverityCounts,
    pub duplication: DuplicationStats,
    pub modules: Vec<ValidationResult>,
}

impl AggregateReport {
    /// Aggregate module results into the final report.
    ///
    /// Results are sorted by module name so output is diff-stable regardless
    /// of module completion order.
    pub fn from_results(
        mut results: Vec<ValidationResult>,
        fail_on: FailOn,
        duration_ms: u64,
    ) -> Self {
        results.sort_by(|a, b| a.name.cmp(&b.name));

        let mut counts = SeverityCounts::default();
        let mut fail = false;
        for result in &results {
            for violation in &result.violations {
                counts.record(violation.severity);
                fail |= fail_on.fails(violation.severity);
            }
        }

        Self {
            pass: !fail,
            duration_ms,
            counts,
            duplication: DuplicationStats::default(),
            modules: results,
        }
    }

    /// Number of ERROR-severity (engine failure) entries across all modules
    pub fn error_count(&self) -> usize {
        self.modules
            .iter()
            .flat_map(|m| &m.violations)
            .filter(|v| v.severity == Severity::Error)
            .count()
    }

    /// Machine-readable JSON for CI
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Human-readable terminal summary
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str("=== Prevention Report ===\n\n");
        out.push_str(&format!(
            "Result: {}\n",
            if self.pass { "PASS" } else { "FAIL" }
        ));
        out.push_str(&format!("Duration: {}ms\n", self.duration_ms));
        out.push_str(&format!(
            "Violations: critical={} high={} moderate={} low={}\n",
            self.counts.critical, self.counts.high, self.counts.moderate, self.counts.low
        ));
        if self.duplication.clusters > 0 {
            out.push_str(&format!(
                "Duplicate clusters: {} ({} units, ~{} lines)\n",
                self.duplication.clusters,
                self.duplication.duplicated_units,
                self.duplication.duplicated_lines
            ));
        }
        if self.error_count() > 0 {
            out.push_str(&format!("Engine errors: {}\n", self.error_count()));
        }

        for module in &self.modules {
            if module.violations.is_empty() && module.warnings.is_empty() {
                continue;
            }
            out.push_str(&format!(
                "\n--- {} ({}ms) ---\n",
                module.name, module.duration_ms
            ));
            for violation in &module.violations {
                out.push_str(&format!("  {violation}\n"));
                if let Some(suggestion) = &violation.suggestion {
                    out.push_str(&format!("      suggestion: {suggestion}\n"));
                }
            }
            for warning in &module.warnings {
                out.push_str(&format!("  (warning) {warning}\n"));
            }
        }

        out
    }

    /// Process exit code for the policy outcome: 0 pass, 1 violations found
    pub fn exit_code(&self) -> i32 {
        i32::from(!self.pass)
    }
}
