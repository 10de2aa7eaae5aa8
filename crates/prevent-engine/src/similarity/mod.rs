//! Similarity Analyzer
//!
//! Two-stage structural duplicate detection:
//! 1. Shingle fingerprint bucketing produces candidate pairs only
//! 2. Token-overlap (Dice coefficient) scoring runs within candidates only
//!
//! Clustering is transitive: an edge above threshold merges the two sides'
//! clusters, so a unit similar to two otherwise-disjoint clusters joins them
//! into one rather than picking one arbitrarily. The recorded cluster score
//! is the minimum edge score observed inside the cluster. Canonical member
//! selection is deterministic: largest unit by line count, ties broken by
//! lexicographically smallest path then smallest start line.

pub mod fingerprint;

use std::collections::HashMap;

use serde::Serialize;

use crate::config::SimilarityConfig;
use crate::index::{SourceUnit, UnitKind};
use crate::patterns::PatternLibrary;

pub use fingerprint::{CandidateIndex, shingle_hashes};

/// A set of source units judged structurally similar
#[derive(Debug, Clone)]
pub struct DuplicateCluster {
    /// Sorted member unit identifiers
    pub members: Vec<String>,
    /// Minimum pairwise similarity among the edges that formed the cluster
    pub score: f64,
    /// Canonical representative unit identifier
    pub canonical: String,
    /// File and line of the canonical unit, for reporting
    pub canonical_path: std::path::PathBuf,
    pub canonical_line: usize,
    /// Total lines spanned by the canonical unit
    pub canonical_lines: usize,
    /// Suggested consolidation target, from the pattern library if matched
    pub target: Option<String>,
}

impl DuplicateCluster {
    pub fn size(&self) -> usize {
        self.members.len()
    }
}

/// Summary statistics over the detected clusters, carried in the report
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct DuplicationStats {
    /// Number of duplicate clusters
    pub clusters: usize,
    /// Total units across all clusters
    pub duplicated_units: usize,
    /// Approximate duplicated line total (canonical span times member count)
    pub duplicated_lines: usize,
}

impl DuplicationStats {
    pub fn from_clusters(clusters: &[DuplicateCluster]) -> Self {
        Self {
            clusters: clusters.len(),
            duplicated_units: clusters.iter().map(DuplicateCluster::size).sum(),
            duplicated_lines: clusters
                .iter()
                .map(|c| c.canonical_lines * c.size())
                .sum(),
        }
    }
}

/// Token-overlap similarity: Dice coefficient over token multisets
pub fn token_overlap(a: &[String], b: &[String]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let mut counts: HashMap<&str, isize> = HashMap::new();
    for token in a {
        *counts.entry(token.as_str()).or_insert(0) += 1;
    }
    let mut common = 0usize;
    for token in b {
        if let Some(count) = counts.get_mut(token.as_str()) {
            if *count > 0 {
                *count -= 1;
                common += 1;
            }
        }
    }
    (2.0 * common as f64) / (a.len() + b.len()) as f64
}

/// Disjoint-set over unit indices, tracking the minimum edge score per set
struct UnionFind {
    parent: Vec<usize>,
    min_score: Vec<f64>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            min_score: vec![f64::INFINITY; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize, score: f64) {
        let (ra, rb) = (self.find(a), self.find(b));
        let merged_min = self.min_score[ra].min(self.min_score[rb]).min(score);
        if ra != rb {
            self.parent[rb] = ra;
        }
        self.min_score[ra] = merged_min;
    }
}

/// Computes duplicate clusters from indexed units
pub struct SimilarityAnalyzer {
    config: SimilarityConfig,
}

impl SimilarityAnalyzer {
    pub fn new(config: SimilarityConfig) -> Self {
        Self { config }
    }

    /// Find duplicate clusters among the given units.
    ///
    /// Deterministic for a fixed unit list and configuration: candidate
    /// pairs, edges and cluster ordering are all processed in sorted order.
    pub fn find_duplicates(
        &self,
        units: &[SourceUnit],
        patterns: &PatternLibrary,
    ) -> Vec<DuplicateCluster> {
        // Stage 0: restrict to units worth comparing. Whole-file units are
        // excluded so a duplicated function is not reported a second time
        // through the files that contain it.
        let comparable: Vec<usize> = units
            .iter()
            .enumerate()
            .filter(|(_, u)| {
                u.kind != UnitKind::File && u.tokens.len() >= self.config.min_tokens
            })
            .map(|(i, _)| i)
            .collect();

        // Stage 1: shingle bucketing
        let mut index = CandidateIndex::new();
        for &i in &comparable {
            let hashes = shingle_hashes(&units[i].tokens, self.config.shingle_size);
            index.insert(i, &hashes);
        }

        // Stage 2: precise scoring within candidate buckets only
        let mut uf = UnionFind::new(units.len());
        let mut edges = 0usize;
        for (a, b) in index.candidate_pairs() {
            if !Self::pair_comparable(&units[a], &units[b]) {
                continue;
            }
            let score = token_overlap(&units[a].tokens, &units[b].tokens);
            if score >= self.config.threshold {
                uf.union(a, b, score);
                edges += 1;
            }
        }
        tracing::debug!(
            candidates = comparable.len(),
            edges,
            "similarity scoring complete"
        );

        self.collect_clusters(units, &mut uf, patterns)
    }

    /// Units of the same kind, excluding a unit paired with itself or with
    /// an overlapping range in the same file (a class unit overlaps its own
    /// methods).
    fn pair_comparable(a: &SourceUnit, b: &SourceUnit) -> bool {
        if a.kind != b.kind {
            return false;
        }
        if a.path == b.path {
            let overlap = a.start_line <= b.end_line && b.start_line <= a.end_line;
            if overlap {
                return false;
            }
        }
        true
    }

    fn collect_clusters(
        &self,
        units: &[SourceUnit],
        uf: &mut UnionFind,
        patterns: &PatternLibrary,
    ) -> Vec<DuplicateCluster> {
        let mut groups: HashMap<usize, Vec<usize>> = HashMap::new();
        for i in 0..units.len() {
            let root = uf.find(i);
            groups.entry(root).or_default().push(i);
        }

        let mut clusters: Vec<DuplicateCluster> = groups
            .into_iter()
            .filter(|(_, members)| members.len() >= 2)
            .map(|(root, members)| self.build_cluster(units, &members, uf.min_score[root], patterns))
            .collect();

        clusters.sort_by(|a, b| a.canonical.cmp(&b.canonical));
        clusters
    }

    fn build_cluster(
        &self,
        units: &[SourceUnit],
        member_indices: &[usize],
        score: f64,
        patterns: &PatternLibrary,
    ) -> DuplicateCluster {
        let canonical_idx = *member_indices
            .iter()
            .min_by(|&&a, &&b| {
                let (ua, ub) = (&units[a], &units[b]);
                ub.line_count()
                    .cmp(&ua.line_count())
                    .then_with(|| ua.path.cmp(&ub.path))
                    .then_with(|| ua.start_line.cmp(&ub.start_line))
            })
            .expect("cluster has members");
        let canonical = &units[canonical_idx];

        let mut members: Vec<String> =
            member_indices.iter().map(|&i| units[i].id.clone()).collect();
        members.sort();

        let target = patterns
            .matches(canonical)
            .first()
            .and_then(|rule| rule.target.clone());

        DuplicateCluster {
            members,
            score,
            canonical: canonical.id.clone(),
            canonical_path: canonical.path.clone(),
            canonical_line: canonical.start_line,
            canonical_lines: canonical.line_count(),
            target,
        }
    }
}
