//! Engine Configuration
//!
//! Typed, validated configuration loaded once at startup from a YAML file.
//! Every threshold the engine consults is expressed here rather than as a
//! hard-coded constant; invalid values (bad regex, duplicate rule names,
//! out-of-range thresholds) fail loading before any analysis starts.

use std::path::Path;
use std::str::FromStr;

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

use crate::{EngineError, Result, Severity};

/// Which severity level causes the run to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FailOn {
    /// Fail only on CRITICAL violations (documented baseline)
    #[default]
    Critical,
    /// Fail on HIGH or CRITICAL violations
    High,
}

impl FailOn {
    /// True if a violation of `severity` fails the run under this policy
    pub fn fails(self, severity: Severity) -> bool {
        if !severity.is_policy_level() {
            return false;
        }
        match self {
            Self::Critical => severity >= Severity::Critical,
            Self::High => severity >= Severity::High,
        }
    }
}

impl FromStr for FailOn {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "critical" => Ok(Self::Critical),
            "high" => Ok(Self::High),
            other => Err(EngineError::Config(format!(
                "invalid fail-on level '{other}' (expected 'critical' or 'high')"
            ))),
        }
    }
}

/// File selection rules: extension allow-list plus exclude globs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRules {
    /// Extensions considered source code; everything else is skipped silently
    pub extensions: Vec<String>,
    /// Glob patterns excluded from scanning
    pub exclude: Vec<String>,
}

impl Default for FileRules {
    fn default() -> Self {
        Self {
            extensions: [
                "rs", "py", "js", "jsx", "ts", "tsx", "go", "java", "c", "h", "cpp", "hpp",
                "cs", "rb", "php", "swift", "kt",
            ]
            .iter()
            .map(ToString::to_string)
            .collect(),
            exclude: vec![
                "**/target/**".to_string(),
                "**/node_modules/**".to_string(),
                "**/.git/**".to_string(),
                "**/vendor/**".to_string(),
            ],
        }
    }
}

impl FileRules {
    /// True if the extension is on the allow-list
    pub fn allows_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e == ext))
    }

    /// Compile the exclude globs
    pub fn exclude_set(&self) -> Result<GlobSet> {
        build_globset(&self.exclude)
    }
}

/// Similarity band boundaries mapping scores to severities
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityBands {
    pub critical: f64,
    pub high: f64,
    pub moderate: f64,
}

impl Default for SeverityBands {
    fn default() -> Self {
        Self {
            critical: 0.95,
            high: 0.85,
            moderate: 0.75,
        }
    }
}

impl SeverityBands {
    /// Map a similarity score to its severity band
    pub fn classify(&self, score: f64) -> Severity {
        if score >= self.critical {
            Severity::Critical
        } else if score >= self.high {
            Severity::High
        } else if score >= self.moderate {
            Severity::Moderate
        } else {
            Severity::Low
        }
    }
}

/// Thresholds for the similarity analyzer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityConfig {
    /// Minimum similarity (0.0 - 1.0) for two units to cluster together
    pub threshold: f64,
    /// Shingle window size in tokens for the fingerprint pre-filter
    pub shingle_size: usize,
    /// Units with fewer tokens than this are not compared
    pub min_tokens: usize,
    /// Replace identifiers/literals with placeholders so renamed-but-identical
    /// code still matches; disable for exact-identifier comparison
    pub normalize_identifiers: bool,
    /// Score-to-severity bands for duplication violations
    pub bands: SeverityBands,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            threshold: 0.75,
            shingle_size: 8,
            min_tokens: 30,
            normalize_identifiers: true,
            bands: SeverityBands::default(),
        }
    }
}

impl SimilarityConfig {
    /// Higher-sensitivity preset: smaller units compared, higher bar to cluster
    pub fn strict() -> Self {
        Self {
            threshold: 0.90,
            min_tokens: 20,
            ..Default::default()
        }
    }

    /// Lower-sensitivity preset for noisy legacy codebases
    pub fn lenient() -> Self {
        Self {
            threshold: 0.70,
            min_tokens: 60,
            ..Default::default()
        }
    }
}

/// Per-module enable flag and timeout override
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleConfig {
    pub enabled: bool,
    /// Overrides the engine-wide `module_timeout_ms` when set
    pub timeout_ms: Option<u64>,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_ms: None,
        }
    }
}

/// Enable/disable flags for the built-in validation modules
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModulesConfig {
    pub duplication: ModuleConfig,
    pub patterns: ModuleConfig,
    pub literals: ModuleConfig,
    pub size: ModuleConfig,
    pub security: ModuleConfig,
}

impl ModulesConfig {
    /// Look up the config entry for a built-in module by name
    pub fn get(&self, name: &str) -> Option<&ModuleConfig> {
        match name {
            "duplication" => Some(&self.duplication),
            "patterns" => Some(&self.patterns),
            "literals" => Some(&self.literals),
            "size" => Some(&self.size),
            "security" => Some(&self.security),
            _ => None,
        }
    }
}

/// Size limits for classes and functions
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SizeLimits {
    pub max_class_lines: usize,
    pub max_function_lines: usize,
}

impl Default for SizeLimits {
    fn default() -> Self {
        Self {
            max_class_lines: 300,
            max_function_lines: 30,
        }
    }
}

/// Repeated-literal detection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LiteralRules {
    /// A literal appearing this many times or more is flagged
    pub min_occurrences: usize,
    /// Files where literal repetition is expected (configuration files)
    pub config_files: Vec<String>,
}

impl Default for LiteralRules {
    fn default() -> Self {
        Self {
            min_occurrences: 3,
            config_files: vec![
                "**/config/**".to_string(),
                "**/*.toml".to_string(),
                "**/*.yml".to_string(),
                "**/*.yaml".to_string(),
                "**/*.json".to_string(),
            ],
        }
    }
}

/// Secret-scanning exclusions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityRules {
    /// Paths exempt from secret scanning (tests, examples, docs)
    pub allow_paths: Vec<String>,
}

impl Default for SecurityRules {
    fn default() -> Self {
        Self {
            allow_paths: vec![
                "**/tests/**".to_string(),
                "**/examples/**".to_string(),
                "**/docs/**".to_string(),
                "**/fixtures/**".to_string(),
            ],
        }
    }
}

/// A configured pattern rule before regex compilation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternRuleConfig {
    /// Unique rule name (duplicates are a load-time error)
    pub name: String,
    /// Textual regex matched against unit text
    pub pattern: String,
    /// Informational consolidation target for matched code
    #[serde(default)]
    pub target: Option<String>,
    /// One of the four policy levels; ERROR is rejected at load time
    pub severity: Severity,
}

/// Full engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub files: FileRules,
    pub similarity: SimilarityConfig,
    pub modules: ModulesConfig,
    pub limits: SizeLimits,
    pub literals: LiteralRules,
    pub security: SecurityRules,
    pub patterns: Vec<PatternRuleConfig>,
    /// Overall wall-clock budget for one run
    pub run_timeout_ms: Option<u64>,
    /// Default per-module timeout
    pub module_timeout_ms: Option<u64>,
    pub fail_on: FailOn,
}

/// Engine-wide run budget when not configured
pub const DEFAULT_RUN_TIMEOUT_MS: u64 = 100;

/// Per-module budget when not configured: the run budget divided across the
/// five built-in modules, with headroom for indexing
pub const DEFAULT_MODULE_TIMEOUT_MS: u64 = 25;

impl EngineConfig {
    /// Load and validate configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Config(format!("cannot read config {}: {e}", path.display()))
        })?;
        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Effective overall run timeout
    pub fn run_timeout_ms(&self) -> u64 {
        self.run_timeout_ms.unwrap_or(DEFAULT_RUN_TIMEOUT_MS)
    }

    /// Effective timeout for a named module
    pub fn module_timeout_ms(&self, module: &str) -> u64 {
        self.modules
            .get(module)
            .and_then(|m| m.timeout_ms)
            .or(self.module_timeout_ms)
            .unwrap_or(DEFAULT_MODULE_TIMEOUT_MS)
    }

    /// Check invariants that serde cannot express
    pub fn validate(&self) -> Result<()> {
        let t = self.similarity.threshold;
        if !(0.0..=1.0).contains(&t) {
            return Err(EngineError::Config(format!(
                "similarity.threshold must be within 0.0..=1.0, got {t}"
            )));
        }
        if self.similarity.shingle_size < 2 {
            return Err(EngineError::Config(
                "similarity.shingle_size must be at least 2".to_string(),
            ));
        }
        let bands = self.similarity.bands;
        if bands.critical < bands.high || bands.high < bands.moderate {
            return Err(EngineError::Config(
                "similarity.bands must be ordered critical >= high >= moderate".to_string(),
            ));
        }
        if self.literals.min_occurrences < 2 {
            return Err(EngineError::Config(
                "literals.min_occurrences must be at least 2".to_string(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for rule in &self.patterns {
            if !seen.insert(rule.name.as_str()) {
                return Err(EngineError::Config(format!(
                    "duplicate pattern rule name '{}'",
                    rule.name
                )));
            }
            if !rule.severity.is_policy_level() {
                return Err(EngineError::InvalidPattern {
                    name: rule.name.clone(),
                    message: "severity must be CRITICAL, HIGH, MODERATE or LOW".to_string(),
                });
            }
            regex::Regex::new(&rule.pattern).map_err(|e| EngineError::InvalidPattern {
                name: rule.name.clone(),
                message: e.to_string(),
            })?;
        }

        // Glob compilation is also a load-time concern
        self.files.exclude_set()?;
        build_globset(&self.literals.config_files)?;
        build_globset(&self.security.allow_paths)?;
        Ok(())
    }
}

/// Compile a list of glob patterns into a matcher set
pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
