//! Source Tokenizer
//!
//! A lightweight, language-tolerant tokenizer shared by the similarity
//! analyzer and the indexer. Comments and whitespace are stripped; the
//! remaining tokens keep their 1-based source line so units can be sliced
//! by line range.

/// Token classification used for normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Variable, function or type name
    Identifier,
    /// Language keyword
    Keyword,
    /// String or numeric literal
    Literal,
    /// Operator or punctuation character
    Symbol,
}

/// A single source token with its origin line
#[derive(Debug, Clone)]
pub struct Token {
    pub text: String,
    pub line: usize,
    pub kind: TokenKind,
}

impl Token {
    fn new(text: impl Into<String>, line: usize, kind: TokenKind) -> Self {
        Self {
            text: text.into(),
            line,
            kind,
        }
    }

    /// Token text with identifiers and literals replaced by placeholders,
    /// so renamed-but-structurally-identical code compares equal
    pub fn normalized(&self) -> &str {
        match self.kind {
            TokenKind::Identifier => "$ID",
            TokenKind::Literal => "$LIT",
            _ => &self.text,
        }
    }
}

/// Tokenize source text, stripping comments and whitespace.
///
/// Handles `//`, `/* */` and `#` comments; `#` is treated as a line comment
/// which also drops Rust attribute lines, an acceptable loss for similarity
/// purposes.
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut line = 1usize;
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\n' => line += 1,
            c if c.is_whitespace() => {}
            '#' => {
                // Line comment (shell/Python style, Rust attributes)
                while let Some(&next) = chars.peek() {
                    if next == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            '/' => match chars.peek() {
                Some('/') => {
                    while let Some(&next) = chars.peek() {
                        if next == '\n' {
                            break;
                        }
                        chars.next();
                    }
                }
                Some('*') => {
                    chars.next();
                    let mut prev = ' ';
                    for next in chars.by_ref() {
                        if next == '\n' {
                            line += 1;
                        } else if prev == '*' && next == '/' {
                            break;
                        }
                        prev = next;
                    }
                }
                _ => tokens.push(Token::new("/", line, TokenKind::Symbol)),
            },
            c if c.is_alphabetic() || c == '_' => {
                let mut word = String::from(c);
                while let Some(&next) = chars.peek() {
                    if next.is_alphanumeric() || next == '_' {
                        word.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let kind = if is_keyword(&word) {
                    TokenKind::Keyword
                } else {
                    TokenKind::Identifier
                };
                tokens.push(Token::new(word, line, kind));
            }
            c if c.is_ascii_digit() => {
                let mut number = String::from(c);
                while let Some(&next) = chars.peek() {
                    if next.is_ascii_alphanumeric() || next == '.' || next == '_' {
                        number.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::new(number, line, TokenKind::Literal));
            }
            '"' => {
                let start_line = line;
                let mut text = String::from('"');
                let mut escaped = false;
                for next in chars.by_ref() {
                    if next == '\n' {
                        line += 1;
                    }
                    text.push(next);
                    if next == '"' && !escaped {
                        break;
                    }
                    escaped = next == '\\' && !escaped;
                }
                tokens.push(Token::new(text, start_line, TokenKind::Literal));
            }
            '\'' => {
                // Only a literal if it closes on the same line; otherwise
                // this is a Rust lifetime marker and the quote is dropped,
                // letting the name tokenize as a plain identifier
                let mut lookahead = chars.clone();
                let mut consumed = 0usize;
                let mut closed = false;
                let mut escaped = false;
                for next in lookahead {
                    if next == '\n' {
                        break;
                    }
                    consumed += 1;
                    if next == '\'' && !escaped {
                        closed = true;
                        break;
                    }
                    escaped = next == '\\' && !escaped;
                }
                if closed {
                    let mut text = String::from('\'');
                    for _ in 0..consumed {
                        if let Some(next) = chars.next() {
                            text.push(next);
                        }
                    }
                    tokens.push(Token::new(text, line, TokenKind::Literal));
                }
            }
            c if "+-*%=<>!&|^~(){}[];:,.?@".contains(c) => {
                tokens.push(Token::new(c.to_string(), line, TokenKind::Symbol));
            }
            _ => {}
        }
    }

    tokens
}

/// Project tokens to their comparison form
pub fn normalized_texts(tokens: &[Token], normalize_identifiers: bool) -> Vec<String> {
    tokens
        .iter()
        .map(|t| {
            if normalize_identifiers {
                t.normalized().to_string()
            } else {
                t.text.clone()
            }
        })
        .collect()
}

/// Keyword table spanning the supported language families
fn is_keyword(word: &str) -> bool {
    const KEYWORDS: &[&str] = &[
        // Rust
        "fn", "let", "mut", "const", "static", "struct", "enum", "impl", "trait", "pub",
        "mod", "use", "crate", "self", "super", "where", "async", "await", "move", "ref",
        "match", "loop", "dyn", "unsafe", "extern", "type",
        // Shared control flow
        "if", "else", "while", "for", "in", "break", "continue", "return", "as",
        // Python
        "def", "class", "import", "from", "with", "try", "except", "finally", "raise",
        "pass", "yield", "lambda", "global", "nonlocal", "assert", "del", "True", "False",
        "None", "and", "or", "not", "is", "elif",
        // JavaScript / TypeScript / Java / Go
        "function", "var", "extends", "implements", "interface", "namespace", "module",
        "export", "default", "new", "delete", "typeof", "instanceof", "this", "null",
        "undefined", "true", "false", "void", "throw", "catch", "switch", "case", "func",
        "package", "go", "defer", "chan", "select", "range", "map", "public", "private",
        "protected", "final", "abstract",
    ];
    KEYWORDS.contains(&word)
}
