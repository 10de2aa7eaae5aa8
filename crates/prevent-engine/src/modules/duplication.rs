//! Duplication Module
//!
//! Emits one violation per duplicate cluster, at a severity derived from the
//! cluster's similarity score via the configured bands.

use super::{AnalysisInput, ValidationModule, ValidationResult, Violation};
use crate::Severity;
use crate::similarity::DuplicateCluster;

pub struct DuplicationModule;

impl ValidationModule for DuplicationModule {
    fn name(&self) -> &'static str {
        "duplication"
    }

    fn validate(&self, input: &AnalysisInput) -> ValidationResult {
        let bands = input.config.similarity.bands;
        let mut result = ValidationResult::new(self.name());

        for cluster in input.clusters.iter() {
            let severity = bands.classify(cluster.score);
            let violation = Violation::new(
                cluster.canonical_path.clone(),
                cluster.canonical_line,
                severity,
                describe(cluster),
            )
            .with_suggestion(suggestion_for(severity, cluster));
            result.violations.push(violation);
        }

        result
    }
}

fn describe(cluster: &DuplicateCluster) -> String {
    let others: Vec<&str> = cluster
        .members
        .iter()
        .filter(|m| **m != cluster.canonical)
        .map(String::as_str)
        .collect();
    format!(
        "duplicate cluster of {} units ({} lines, {:.0}% similar): also at {}",
        cluster.size(),
        cluster.canonical_lines,
        cluster.score * 100.0,
        others.join(", ")
    )
}

fn suggestion_for(severity: Severity, cluster: &DuplicateCluster) -> String {
    let base = match severity {
        Severity::Critical => "Extract the duplicated code into a single shared function",
        Severity::High => {
            "The structure is near-identical; consider extracting with parameters or generics"
        }
        _ => "Review whether a common abstraction could reduce this duplication",
    };
    match &cluster.target {
        Some(target) => format!("{base} (consolidation target: {target})"),
        None => base.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::patterns::PatternLibrary;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn cluster(score: f64, target: Option<&str>) -> DuplicateCluster {
        DuplicateCluster {
            members: vec!["a.rs:1:f".to_string(), "b.rs:1:g".to_string()],
            score,
            canonical: "a.rs:1:f".to_string(),
            canonical_path: PathBuf::from("a.rs"),
            canonical_line: 1,
            canonical_lines: 20,
            target: target.map(ToString::to_string),
        }
    }

    fn input(clusters: Vec<DuplicateCluster>) -> AnalysisInput {
        AnalysisInput {
            units: Arc::new(Vec::new()),
            patterns: Arc::new(PatternLibrary::default()),
            clusters: Arc::new(clusters),
            config: Arc::new(EngineConfig::default()),
        }
    }

    #[test]
    fn identical_cluster_is_critical() {
        let result = DuplicationModule.validate(&input(vec![cluster(1.0, None)]));
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].severity, Severity::Critical);
        assert_eq!(result.violations[0].file, PathBuf::from("a.rs"));
        assert_eq!(result.violations[0].line, 1);
    }

    #[test]
    fn partial_overlap_is_never_critical() {
        let result = DuplicationModule.validate(&input(vec![cluster(0.80, None)]));
        assert_eq!(result.violations[0].severity, Severity::Moderate);
        let result = DuplicationModule.validate(&input(vec![cluster(0.88, None)]));
        assert_eq!(result.violations[0].severity, Severity::High);
    }

    #[test]
    fn target_is_threaded_into_suggestion() {
        let result = DuplicationModule.validate(&input(vec![cluster(1.0, Some("src/util.rs"))]));
        let suggestion = result.violations[0].suggestion.as_deref().unwrap();
        assert!(suggestion.contains("src/util.rs"));
    }

    #[test]
    fn no_clusters_no_violations() {
        let result = DuplicationModule.validate(&input(Vec::new()));
        assert!(result.violations.is_empty());
        assert!(result.warnings.is_empty());
    }
}
