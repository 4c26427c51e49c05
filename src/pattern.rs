//! Search pattern compilation
//!
//! Compiles the user supplied search pattern and, when that fails, explains
//! what went wrong in terms a user can act on. Patterns are often copied from
//! JavaScript or PCRE tooling, so unsupported constructs get a specific hint.

use regex::bytes::Regex;
use thiserror::Error;

/// A search pattern that failed to compile.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct PatternError {
    /// The pattern as given by the user
    pub pattern: String,
    pub kind: PatternErrorKind,
    /// Message reported by the regex engine
    pub message: String,
    pub suggestion: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PatternErrorKind {
    /// A group, class or counted repetition was opened but never closed
    UnclosedDelimiter { delimiter: char, position: usize },
    /// A quantifier with nothing to repeat, or a malformed `{n,m}`
    InvalidQuantifier,
    /// Unknown or unsupported escape sequence
    InvalidEscape,
    /// Look-ahead / look-behind
    Lookaround,
    /// `\1` style backreference
    Backreference,
    Syntax,
}

impl PatternError {
    fn from_regex_error(err: &regex::Error, pattern: &str) -> Self {
        let message = err.to_string();
        let kind = classify(&message, pattern);
        let suggestion = suggest(&kind, pattern);

        PatternError {
            pattern: pattern.to_string(),
            kind,
            message,
            suggestion,
        }
    }

    /// Last line of the engine message, e.g. `error: unclosed group`.
    pub fn summary(&self) -> &str {
        self.message
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .map(|line| line.trim().trim_start_matches("error: "))
            .unwrap_or(self.message.as_str())
    }

    /// Multi-line description for terminal output.
    pub fn explain(&self) -> String {
        let mut output = format!("Invalid search pattern: \"{}\"\n", self.pattern);
        output.push_str(&format!("  Problem: {}\n", self.summary()));
        if let PatternErrorKind::UnclosedDelimiter { delimiter, position } = self.kind {
            output.push_str(&format!("  Unclosed '{}' at position {}\n", delimiter, position));
        }
        if let Some(ref suggestion) = self.suggestion {
            output.push_str(&format!("  Suggestion: {}\n", suggestion));
        }
        output
    }
}

/// Compile `pattern`, annotating failures.
pub fn compile_pattern(pattern: &str) -> Result<Regex, PatternError> {
    Regex::new(pattern).map_err(|err| PatternError::from_regex_error(&err, pattern))
}

fn classify(message: &str, pattern: &str) -> PatternErrorKind {
    let lower = message.to_lowercase();

    if lower.contains("look-around") || lower.contains("lookaround") {
        return PatternErrorKind::Lookaround;
    }
    if lower.contains("backreference") {
        return PatternErrorKind::Backreference;
    }

    if lower.contains("unclosed") {
        let (open, close) = if lower.contains("character class") {
            ('[', ']')
        } else if lower.contains("counted repetition") {
            ('{', '}')
        } else {
            ('(', ')')
        };
        if let Some(position) = find_unclosed_delimiter(pattern, open, close) {
            return PatternErrorKind::UnclosedDelimiter {
                delimiter: open,
                position,
            };
        }
    }

    if lower.contains("repetition") || lower.contains("quantifier") {
        return PatternErrorKind::InvalidQuantifier;
    }
    if lower.contains("escape") {
        return PatternErrorKind::InvalidEscape;
    }

    PatternErrorKind::Syntax
}

fn suggest(kind: &PatternErrorKind, pattern: &str) -> Option<String> {
    match kind {
        PatternErrorKind::UnclosedDelimiter { delimiter, .. } => {
            let closer = match delimiter {
                '(' => ')',
                '[' => ']',
                _ => '}',
            };
            Some(format!(
                "Add a closing '{}', or escape the '{}' as '\\{}' to match it literally.",
                closer, delimiter, delimiter
            ))
        }
        PatternErrorKind::InvalidQuantifier => Some(
            "A quantifier (*, +, ?, {n,m}) needs something to repeat, e.g. '[0-9]+' or '(\\.[0-9]+)?'. \
             Escape it ('\\*', '\\+', '\\?') to match the character itself."
                .to_string(),
        ),
        PatternErrorKind::InvalidEscape => Some(
            "Only standard escapes are recognized (\\d, \\w, \\s, \\., \\^, \\$, \\xHH, ...). \
             Remove the backslash if the character is not special."
                .to_string(),
        ),
        PatternErrorKind::Lookaround => Some(
            "Look-ahead and look-behind are not supported. Match the surrounding text instead \
             and repeat it in the replacement, e.g. '\"version\": \"[^\"]*\"' with \
             '\"version\": \"{{version}}\"'."
                .to_string(),
        ),
        PatternErrorKind::Backreference => Some(
            "Backreferences such as \\1 are not supported in search patterns.".to_string(),
        ),
        PatternErrorKind::Syntax => {
            if pattern.contains('[') && !pattern.contains(']') {
                Some("Unclosed character class '[...]'. Add a closing ']'.".to_string())
            } else {
                Some(
                    "Escape special characters to match them literally: . + * ? ^ $ | ( ) [ ] { } \\"
                        .to_string(),
                )
            }
        }
    }
}

/// Char position of the last opening delimiter left unclosed.
fn find_unclosed_delimiter(pattern: &str, open: char, close: char) -> Option<usize> {
    let mut stack = Vec::new();
    let mut in_class = false;
    let mut escaped = false;

    for (i, c) in pattern.chars().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        if c == '\\' {
            escaped = true;
            continue;
        }

        if open != '[' {
            if c == '[' {
                in_class = true;
            } else if c == ']' {
                in_class = false;
            }
            if in_class {
                continue;
            }
        }

        if c == open {
            stack.push(i);
        } else if c == close {
            stack.pop();
        }
    }

    stack.last().copied()
}
