//! Source Index
//!
//! Parses source files into named, addressable units (functions, classes,
//! whole files) with a normalized token sequence suitable for similarity
//! comparison. Extraction is syntactic and heuristic: declaration headers
//! are matched by regex, bodies are delimited by brace counting for
//! brace-family languages and by indentation for Python. Unreadable files
//! never abort the run; they are recorded as index issues and surfaced as
//! LOW violations in the report.

pub mod tokenizer;

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::EngineConfig;

pub use tokenizer::{Token, TokenKind, normalized_texts, tokenize};

/// Kind of an indexed source unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    Function,
    Class,
    File,
}

impl std::fmt::Display for UnitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Function => write!(f, "function"),
            Self::Class => write!(f, "class"),
            Self::File => write!(f, "file"),
        }
    }
}

/// A named, addressable chunk of source code extracted during indexing
///
/// Immutable once created; discarded at the end of the analysis run.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    /// Unique identifier: `<path>:<start_line>:<name>`
    pub id: String,
    pub path: PathBuf,
    pub name: String,
    pub kind: UnitKind,
    /// 1-based inclusive line range
    pub start_line: usize,
    pub end_line: usize,
    /// Normalized token sequence used for similarity comparison
    pub tokens: Vec<String>,
    /// Raw text of the unit, used by textual pattern and secret scans
    pub text: String,
    /// Hash of the raw text
    pub raw_hash: u64,
}

impl SourceUnit {
    /// Number of source lines the unit spans
    pub fn line_count(&self) -> usize {
        self.end_line.saturating_sub(self.start_line) + 1
    }
}

/// A file that could not be indexed
#[derive(Debug, Clone)]
pub struct IndexIssue {
    pub path: PathBuf,
    pub message: String,
}

/// The indexed view of a file set
#[derive(Debug, Clone, Default)]
pub struct SourceIndex {
    pub units: Vec<SourceUnit>,
    pub issues: Vec<IndexIssue>,
}

impl SourceIndex {
    /// Index the given files. Pure function of file system state at call
    /// time; per-file failures are recorded, never propagated.
    pub fn build(files: &[PathBuf], config: &EngineConfig) -> Self {
        let mut index = Self::default();

        for path in files {
            if !config.files.allows_extension(path) {
                continue;
            }
            match std::fs::read_to_string(path) {
                Ok(content) => index_file(path, &content, config, &mut index.units),
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "file unreadable");
                    index.issues.push(IndexIssue {
                        path: path.clone(),
                        message: format!("file unreadable: {e}"),
                    });
                }
            }
        }

        index
    }
}

/// Declaration headers for brace-family languages and Python
static FUNCTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:async\s+)?(?:fn|def|func|function)\s+([A-Za-z_][A-Za-z0-9_]*)",
    )
    .unwrap()
});

static CLASS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:class|struct|trait|enum|impl|interface)\s+([A-Za-z_][A-Za-z0-9_]*)",
    )
    .unwrap()
});

fn index_file(path: &Path, content: &str, config: &EngineConfig, units: &mut Vec<SourceUnit>) {
    let normalize = config.similarity.normalize_identifiers;
    let lines: Vec<&str> = content.lines().collect();
    let tokens = tokenize(content);
    let python = path.extension().and_then(|e| e.to_str()) == Some("py");

    // Whole-file unit first
    units.push(make_unit(
        path,
        file_stem(path),
        UnitKind::File,
        1,
        lines.len().max(1),
        &lines,
        &tokens,
        normalize,
    ));

    for (idx, line) in lines.iter().enumerate() {
        let (kind, name) = if let Some(caps) = FUNCTION_RE.captures(line) {
            (UnitKind::Function, caps[1].to_string())
        } else if let Some(caps) = CLASS_RE.captures(line) {
            (UnitKind::Class, caps[1].to_string())
        } else {
            continue;
        };

        let end_idx = if python {
            indent_block_end(&lines, idx)
        } else {
            brace_block_end(&lines, idx)
        };

        units.push(make_unit(
            path,
            name,
            kind,
            idx + 1,
            end_idx + 1,
            &lines,
            &tokens,
            normalize,
        ));
    }
}

#[allow(clippy::too_many_arguments)]
fn make_unit(
    path: &Path,
    name: String,
    kind: UnitKind,
    start_line: usize,
    end_line: usize,
    lines: &[&str],
    tokens: &[Token],
    normalize: bool,
) -> SourceUnit {
    let text = lines
        .get(start_line.saturating_sub(1)..end_line.min(lines.len()))
        .unwrap_or_default()
        .join("\n");

    let unit_tokens: Vec<Token> = tokens
        .iter()
        .filter(|t| t.line >= start_line && t.line <= end_line)
        .cloned()
        .collect();

    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);

    SourceUnit {
        id: format!("{}:{}:{}", path.display(), start_line, name),
        path: path.to_path_buf(),
        name,
        kind,
        start_line,
        end_line,
        tokens: normalized_texts(&unit_tokens, normalize),
        text,
        raw_hash: hasher.finish(),
    }
}

fn file_stem(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("file")
        .to_string()
}

/// Find the closing line of a brace-delimited body starting at `header`
/// (0-based). Signatures may wrap over several lines before the opening
/// brace; a line ending in `;` before any brace opens, or a blank line,
/// marks a bodiless declaration (`fn x();`) ending on the header.
fn brace_block_end(lines: &[&str], header: usize) -> usize {
    let mut depth = 0usize;
    let mut opened = false;

    for (idx, line) in lines.iter().enumerate().skip(header) {
        for c in line.chars() {
            match c {
                '{' => {
                    depth += 1;
                    opened = true;
                }
                '}' => depth = depth.saturating_sub(1),
                _ => {}
            }
        }
        if opened && depth == 0 {
            return idx;
        }
        if !opened {
            let trimmed = line.trim_end();
            if trimmed.ends_with(';') || (idx > header && trimmed.is_empty()) {
                return header;
            }
        }
    }

    lines.len().saturating_sub(1)
}

/// Find the last line of an indentation-delimited body (Python)
fn indent_block_end(lines: &[&str], header: usize) -> usize {
    let header_indent = indent_of(lines[header]);
    let mut last = header;

    for (idx, line) in lines.iter().enumerate().skip(header + 1) {
        if line.trim().is_empty() {
            continue;
        }
        if indent_of(line) <= header_indent {
            break;
        }
        last = idx;
    }

    last
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}
