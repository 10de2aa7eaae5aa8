//! Shingle Fingerprinting
//!
//! First-stage filter for duplicate detection. Each unit's token sequence is
//! reduced to a set of Rabin-Karp rolling hashes over a fixed-size window
//! (shingles); only units sharing at least one shingle become candidate
//! pairs for the precise second-stage scoring. This bounds the otherwise
//! O(n^2) pairwise comparison.

use std::collections::{BTreeSet, HashMap};
use std::hash::{Hash, Hasher};

const BASE: u64 = 31;
const MODULUS: u64 = 1_000_000_007; // Large prime

/// Stable numeric value for a token
fn token_value(token: &str) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    token.hash(&mut hasher);
    hasher.finish() % MODULUS
}

/// Modular exponentiation: base^exp mod MODULUS
fn mod_pow(mut base: u64, mut exp: u64) -> u64 {
    let mut result: u64 = 1;
    base %= MODULUS;
    while exp > 0 {
        if exp % 2 == 1 {
            result = result.wrapping_mul(base) % MODULUS;
        }
        exp /= 2;
        base = base.wrapping_mul(base) % MODULUS;
    }
    result
}

/// Compute the set of rolling-hash shingles for a token sequence.
///
/// Sequences shorter than the window are hashed as a single shingle so
/// small-but-identical units still bucket together.
pub fn shingle_hashes(tokens: &[String], window: usize) -> BTreeSet<u64> {
    let mut hashes = BTreeSet::new();
    if tokens.is_empty() {
        return hashes;
    }

    let window = window.min(tokens.len());
    let drop_power = mod_pow(BASE, (window - 1) as u64);

    let mut hash: u64 = 0;
    for token in &tokens[..window] {
        hash = (hash.wrapping_mul(BASE) + token_value(token)) % MODULUS;
    }
    hashes.insert(hash);

    for i in window..tokens.len() {
        let old = token_value(&tokens[i - window]).wrapping_mul(drop_power) % MODULUS;
        hash = (hash + MODULUS - old) % MODULUS;
        hash = (hash.wrapping_mul(BASE) + token_value(&tokens[i])) % MODULUS;
        hashes.insert(hash);
    }

    hashes
}

/// Bucketed index from shingle hash to unit indices
#[derive(Debug, Default)]
pub struct CandidateIndex {
    buckets: HashMap<u64, Vec<usize>>,
}

impl CandidateIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a unit's shingles
    pub fn insert(&mut self, unit_idx: usize, hashes: &BTreeSet<u64>) {
        for &hash in hashes {
            self.buckets.entry(hash).or_default().push(unit_idx);
        }
    }

    /// All unit index pairs sharing at least one bucket, deduplicated and
    /// ordered for deterministic downstream processing
    pub fn candidate_pairs(&self) -> BTreeSet<(usize, usize)> {
        let mut pairs = BTreeSet::new();
        for indices in self.buckets.values() {
            for i in 0..indices.len() {
                for j in (i + 1)..indices.len() {
                    let (a, b) = (indices[i].min(indices[j]), indices[i].max(indices[j]));
                    if a != b {
                        pairs.insert((a, b));
                    }
                }
            }
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(texts: &[&str]) -> Vec<String> {
        texts.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn identical_sequences_share_all_shingles() {
        let a = shingle_hashes(&tokens(&["fn", "$ID", "(", ")", "{", "}"]), 3);
        let b = shingle_hashes(&tokens(&["fn", "$ID", "(", ")", "{", "}"]), 3);
        assert_eq!(a, b);
        assert!(!a.is_empty());
    }

    #[test]
    fn rolling_hash_matches_direct_hash() {
        // The shingle for a suffix window must equal the same window hashed
        // from scratch, otherwise bucketing silently misses candidates.
        let seq = tokens(&["a", "b", "c", "d"]);
        let rolled = shingle_hashes(&seq, 3);
        let direct = shingle_hashes(&tokens(&["b", "c", "d"]), 3);
        assert!(direct.iter().all(|h| rolled.contains(h)));
    }

    #[test]
    fn short_sequences_still_fingerprint() {
        let hashes = shingle_hashes(&tokens(&["x", "y"]), 8);
        assert_eq!(hashes.len(), 1);
    }

    #[test]
    fn disjoint_sequences_produce_no_candidates() {
        let mut index = CandidateIndex::new();
        index.insert(0, &shingle_hashes(&tokens(&["a", "b", "c", "d"]), 3));
        index.insert(1, &shingle_hashes(&tokens(&["w", "x", "y", "z"]), 3));
        assert!(index.candidate_pairs().is_empty());
    }

    #[test]
    fn shared_shingles_produce_candidates() {
        let mut index = CandidateIndex::new();
        index.insert(0, &shingle_hashes(&tokens(&["a", "b", "c", "d"]), 3));
        index.insert(1, &shingle_hashes(&tokens(&["a", "b", "c", "e"]), 3));
        let pairs = index.candidate_pairs();
        assert!(pairs.contains(&(0, 1)));
    }
}
