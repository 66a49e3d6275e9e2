//! Error classifier - the predicate deciding which records count as
//! errors, plus the ordered keyword -> taxonomy-tag rule table.

use crate::{ErrorTag, LogLevel, LogRecord};
use regex::Regex;

/// Case-insensitive tokens that mark a message as an error regardless of
/// its level. The boolean result is an existential OR over all of them.
/// HTTP status codes are matched separately on word boundaries, so a code
/// at the start of a line counts and "5000ms" does not.
const ERROR_PATTERNS: &[&str] = &[
    "error",
    "critical",
    "exception",
    "failed",
    "timeout",
    "deadlock",
    "connection refused",
    "pool exhausted",
    "oom",
    "out of memory",
];

/// Ordered keyword -> tag rules. A message may match several rows; row
/// order decides the output order of the tags. Evaluation order matters
/// downstream (error-type priority mapping), so this table is part of the
/// behavioral contract.
const TAG_RULES: &[(&[&str], ErrorTag)] = &[
    (&["timeout", "timed out"], ErrorTag::Timeout),
    (&["connection refused"], ErrorTag::ConnectionRefused),
    (&["pool exhausted", "pool is exhausted"], ErrorTag::PoolExhausted),
    (&["deadlock"], ErrorTag::Deadlock),
    (&["out of memory", "oom", "memory leak", "heap"], ErrorTag::MemoryError),
    (
        &["null pointer", "nullpointerexception", "npe", "undefined is not"],
        ErrorTag::NullPointer,
    ),
    (
        &["unauthorized", "auth failed", "authentication", "forbidden"],
        ErrorTag::AuthFailure,
    ),
    (&["rate limit", "too many requests"], ErrorTag::RateLimit),
    (&["duplicate"], ErrorTag::DuplicateError),
    (&["http error"], ErrorTag::HttpError),
    (&["failed", "failure"], ErrorTag::OperationFailed),
];

/// Error classifier. Keyword tables are fixed; the status-code patterns
/// are compiled once at construction.
#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    server_error_code: Regex,
    auth_code: Regex,
    rate_limit_code: Regex,
}

impl ErrorClassifier {
    pub fn new() -> Self {
        Self {
            server_error_code: Regex::new(r"\b50[0234]\b").unwrap(),
            auth_code: Regex::new(r"\b40[13]\b").unwrap(),
            rate_limit_code: Regex::new(r"\b429\b").unwrap(),
        }
    }

    /// True if the record's level is Error/Critical or its message matches
    /// any error pattern.
    pub fn is_error(&self, record: &LogRecord) -> bool {
        record.level >= LogLevel::Error || self.message_is_error(&record.message)
    }

    /// Pattern half of the predicate, usable on the full pre-truncation
    /// line.
    pub fn message_is_error(&self, message: &str) -> bool {
        let lower = message.to_lowercase();
        ERROR_PATTERNS.iter().any(|p| lower.contains(p))
            || self.server_error_code.is_match(message)
    }

    /// All taxonomy tags the message matches, in rule-table order. Returns
    /// UNKNOWN_ERROR when nothing matched (callers only ask for tags of
    /// records already classified as errors).
    pub fn tags(&self, message: &str) -> Vec<ErrorTag> {
        let lower = message.to_lowercase();
        let mut tags: Vec<ErrorTag> = TAG_RULES
            .iter()
            .filter(|(keywords, tag)| {
                keywords.iter().any(|k| lower.contains(k)) || self.code_match(*tag, message)
            })
            .map(|(_, tag)| *tag)
            .collect();
        if tags.is_empty() {
            tags.push(ErrorTag::UnknownError);
        }
        tags
    }

    /// Status-code half of the tag rules, word-bounded.
    fn code_match(&self, tag: ErrorTag, message: &str) -> bool {
        match tag {
            ErrorTag::AuthFailure => self.auth_code.is_match(message),
            ErrorTag::RateLimit => self.rate_limit_code.is_match(message),
            ErrorTag::HttpError => self.server_error_code.is_match(message),
            _ => false,
        }
    }
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::new()
    }
}
