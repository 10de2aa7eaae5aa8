//! Prevention Orchestrator
//!
//! Builds the shared inputs once (index, pattern library, duplicate
//! clusters), fans them out to every enabled validation module concurrently,
//! and aggregates results into a single report. Each module runs on the
//! blocking pool under its own timeout; an overall run deadline bounds the
//! whole pass. A module panic or timeout becomes a single ERROR violation
//! naming the module; already-completed results survive an overall timeout.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::StreamExt;
use futures::stream::FuturesUnordered;

use crate::advisory::{Advisor, NoopAdvisor};
use crate::config::EngineConfig;
use crate::index::{IndexIssue, SourceIndex};
use crate::modules::{self, AnalysisInput, ValidationModule, ValidationResult, Violation};
use crate::patterns::PatternLibrary;
use crate::report::AggregateReport;
use crate::scan;
use crate::similarity::{DuplicationStats, SimilarityAnalyzer};
use crate::{Result, Severity};

/// One engine instance per invocation: constructed from validated
/// configuration, discarded at exit. There is no process-wide state.
pub struct PreventionEngine {
    config: Arc<EngineConfig>,
    patterns: Arc<PatternLibrary>,
    advisor: Arc<dyn Advisor>,
}

impl PreventionEngine {
    /// Validate configuration and compile the pattern library.
    ///
    /// This is the only point where the engine can fail before producing a
    /// report; every later failure mode is recovered into the report itself.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let patterns = PatternLibrary::load(&config.patterns)?;
        Ok(Self {
            config: Arc::new(config),
            patterns: Arc::new(patterns),
            advisor: Arc::new(NoopAdvisor),
        })
    }

    /// Attach an advisory collaborator
    pub fn with_advisor(mut self, advisor: Arc<dyn Advisor>) -> Self {
        self.advisor = advisor;
        self
    }

    /// The compiled pattern library (for `list-patterns`)
    pub fn patterns(&self) -> &PatternLibrary {
        &self.patterns
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run the built-in module set over the given paths
    pub async fn run(&self, paths: &[PathBuf]) -> AggregateReport {
        self.run_with(paths, modules::default_modules(&self.config))
            .await
    }

    /// Run a caller-supplied module set. This is the extension point for
    /// pluggable checks beyond the built-ins.
    pub async fn run_with(
        &self,
        paths: &[PathBuf],
        module_set: Vec<Arc<dyn ValidationModule>>,
    ) -> AggregateReport {
        let started = Instant::now();

        let files = match scan::collect_files(paths, &self.config) {
            Ok(files) => files,
            Err(e) => {
                // Globs were validated at construction; reaching this means
                // the filesystem changed under us. Report, don't crash.
                tracing::warn!(error = %e, "file discovery failed");
                Vec::new()
            }
        };
        tracing::debug!(files = files.len(), "discovered source files");

        let SourceIndex { units, issues } = SourceIndex::build(&files, &self.config);
        let analyzer = SimilarityAnalyzer::new(self.config.similarity.clone());
        let clusters = analyzer.find_duplicates(&units, &self.patterns);
        let stats = DuplicationStats::from_clusters(&clusters);
        tracing::info!(
            units = units.len(),
            clusters = clusters.len(),
            "analysis inputs ready"
        );

        let input = AnalysisInput {
            units: Arc::new(units),
            patterns: Arc::clone(&self.patterns),
            clusters: Arc::new(clusters),
            config: Arc::clone(&self.config),
        };

        let mut results = Vec::new();
        if !issues.is_empty() {
            results.push(index_section(&issues));
        }

        let run_timeout_ms = self.config.run_timeout_ms();
        results.extend(self.execute_modules(module_set, &input, run_timeout_ms).await);

        let mut report = AggregateReport::from_results(
            results,
            self.config.fail_on,
            started.elapsed().as_millis() as u64,
        );
        report.duplication = stats;
        self.apply_advice(&mut report);
        report
    }

    /// Fan modules out to the blocking pool and collect completions under
    /// the overall deadline. The result vector is the only mutable state and
    /// it is owned by this task; modules communicate solely by return value.
    async fn execute_modules(
        &self,
        module_set: Vec<Arc<dyn ValidationModule>>,
        input: &AnalysisInput,
        run_timeout_ms: u64,
    ) -> Vec<ValidationResult> {
        let mut in_flight = FuturesUnordered::new();
        for module in module_set {
            let name = module.name();
            let timeout_ms = self.config.module_timeout_ms(name);
            let input = input.clone();
            in_flight.push(async move {
                let module_started = Instant::now();
                let handle = tokio::task::spawn_blocking(move || module.validate(&input));
                let outcome =
                    tokio::time::timeout(Duration::from_millis(timeout_ms), handle).await;
                (name, timeout_ms, module_started.elapsed(), outcome)
            });
        }

        let deadline = tokio::time::Instant::now() + Duration::from_millis(run_timeout_ms);
        let mut results = Vec::new();

        while !in_flight.is_empty() {
            match tokio::time::timeout_at(deadline, in_flight.next()).await {
                Ok(Some((name, timeout_ms, elapsed, outcome))) => {
                    let mut result = match outcome {
                        Ok(Ok(result)) => result,
                        Ok(Err(join_error)) => {
                            tracing::warn!(module = name, "module panicked");
                            let cause = if join_error.is_panic() {
                                "panicked during execution".to_string()
                            } else {
                                "was cancelled".to_string()
                            };
                            ValidationResult::engine_error(name, cause)
                        }
                        Err(_elapsed) => {
                            tracing::warn!(module = name, timeout_ms, "module timed out");
                            ValidationResult::engine_error(
                                name,
                                format!("timed out after {timeout_ms}ms"),
                            )
                        }
                    };
                    result.duration_ms = elapsed.as_millis() as u64;
                    results.push(result);
                }
                Ok(None) => break,
                Err(_elapsed) => {
                    tracing::warn!(run_timeout_ms, "overall run deadline exceeded");
                    results.push(ValidationResult::engine_error(
                        "orchestrator",
                        format!(
                            "overall run timed out after {run_timeout_ms}ms; in-flight modules cancelled"
                        ),
                    ));
                    break;
                }
            }
        }

        results
    }

    /// Attach advisory suggestions. Runs after the pass/fail decision is
    /// final, so the advisor cannot influence policy.
    fn apply_advice(&self, report: &mut AggregateReport) {
        for module in &mut report.modules {
            for violation in module.violations.iter_mut().chain(module.warnings.iter_mut()) {
                if violation.suggestion.is_none() {
                    violation.suggestion = self.advisor.suggest(violation);
                }
            }
        }
    }
}

/// Indexing failures surfaced as a synthetic report section so unreadable
/// files are visible without aborting the run
fn index_section(issues: &[IndexIssue]) -> ValidationResult {
    let mut result = ValidationResult::new("index");
    for issue in issues {
        result.violations.push(Violation::new(
            issue.path.clone(),
            0,
            Severity::Low,
            issue.message.clone(),
        ));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    struct PanickingModule;

    impl ValidationModule for PanickingModule {
        fn name(&self) -> &'static str {
            "explosive"
        }

        fn validate(&self, _input: &AnalysisInput) -> ValidationResult {
            panic!("deliberate test panic");
        }
    }

    struct SleepyModule;

    impl ValidationModule for SleepyModule {
        fn name(&self) -> &'static str {
            "sleepy"
        }

        fn validate(&self, _input: &AnalysisInput) -> ValidationResult {
            std::thread::sleep(Duration::from_millis(250));
            ValidationResult::new(self.name())
        }
    }

    fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    fn test_config() -> EngineConfig {
        EngineConfig {
            run_timeout_ms: Some(5_000),
            module_timeout_ms: Some(2_000),
            ..EngineConfig::default()
        }
    }

    #[tokio::test]
    async fn clean_tree_passes() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "ok.rs", "fn tiny() -> u32 { 7 }\n");

        let engine = PreventionEngine::new(test_config()).unwrap();
        let report = engine.run(&[dir.path().to_path_buf()]).await;
        assert!(report.pass);
        assert_eq!(report.counts.critical, 0);
    }

    #[tokio::test]
    async fn panicking_module_becomes_error_entry() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "ok.rs", "fn tiny() -> u32 { 7 }\n");

        let engine = PreventionEngine::new(test_config()).unwrap();
        let report = engine
            .run_with(&[dir.path().to_path_buf()], vec![Arc::new(PanickingModule)])
            .await;

        assert!(report.pass, "ERROR entries must not fail the run by themselves");
        assert_eq!(report.error_count(), 1);
        let explosive = report
            .modules
            .iter()
            .find(|m| m.name == "explosive")
            .expect("failed module still present in report");
        assert!(explosive.violations[0].message.contains("panicked"));
    }

    #[tokio::test]
    async fn slow_module_times_out_without_affecting_others() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "ok.rs", "fn tiny() -> u32 { 7 }\n");

        let config = EngineConfig {
            run_timeout_ms: Some(5_000),
            module_timeout_ms: Some(10),
            ..EngineConfig::default()
        };
        let engine = PreventionEngine::new(config).unwrap();
        let report = engine
            .run_with(&[dir.path().to_path_buf()], vec![Arc::new(SleepyModule)])
            .await;

        let sleepy = report.modules.iter().find(|m| m.name == "sleepy").unwrap();
        assert_eq!(sleepy.violations.len(), 1);
        assert_eq!(sleepy.violations[0].severity, Severity::Error);
        assert!(sleepy.violations[0].message.contains("timed out"));
        assert!(report.pass);
    }

    #[tokio::test]
    async fn overall_deadline_appends_single_error() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "ok.rs", "fn tiny() -> u32 { 7 }\n");

        let config = EngineConfig {
            run_timeout_ms: Some(20),
            // Module timeout longer than the run budget so only the overall
            // deadline can fire
            module_timeout_ms: Some(10_000),
            ..EngineConfig::default()
        };
        let engine = PreventionEngine::new(config).unwrap();
        let report = engine
            .run_with(&[dir.path().to_path_buf()], vec![Arc::new(SleepyModule)])
            .await;

        let orchestrator = report
            .modules
            .iter()
            .find(|m| m.name == "orchestrator")
            .expect("overall timeout reported");
        assert!(orchestrator.violations[0].message.contains("overall run timed out"));
    }

    #[tokio::test]
    async fn report_module_order_is_name_sorted() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "ok.rs", "fn tiny() -> u32 { 7 }\n");

        let engine = PreventionEngine::new(test_config()).unwrap();
        let report = engine.run(&[dir.path().to_path_buf()]).await;
        let names: Vec<&str> = report.modules.iter().map(|m| m.name.as_str()).collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
    }

    #[tokio::test]
    async fn advisor_fills_missing_suggestions_only() {
        struct StaticAdvisor;
        impl Advisor for StaticAdvisor {
            fn suggest(&self, _v: &Violation) -> Option<String> {
                Some("ask a senior reviewer".to_string())
            }
        }

        let dir = TempDir::new().unwrap();
        // Oversized function produces a suggestion-free LOW warning
        let body: String = (0..40).map(|i| format!("    let x{i} = {i};\n")).collect();
        write_file(&dir, "long.rs", &format!("fn long() {{\n{body}}}\n"));

        let engine = PreventionEngine::new(test_config())
            .unwrap()
            .with_advisor(Arc::new(StaticAdvisor));
        let report = engine.run(&[dir.path().to_path_buf()]).await;

        let size = report.modules.iter().find(|m| m.name == "size").unwrap();
        assert_eq!(
            size.warnings[0].suggestion.as_deref(),
            Some("ask a senior reviewer")
        );
    }

    #[test]
    fn invalid_config_fails_construction() {
        let config = EngineConfig {
            patterns: vec![crate::config::PatternRuleConfig {
                name: "broken".to_string(),
                pattern: "[unclosed".to_string(),
                target: None,
                severity: Severity::High,
            }],
            ..EngineConfig::default()
        };
        assert!(PreventionEngine::new(config).is_err());
    }
}
