//! Core types for the causelog error-correlation system.
//! This crate contains the shared data structures used across all components.

pub mod classify;
pub mod parser;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Storage cap for `message` and `raw` fields. Classification always runs
/// on the full line before this cap is applied.
pub const MESSAGE_STORE_CAP: usize = 500;

/// Truncation length used when deduplicating error messages.
pub const ERROR_MESSAGE_CAP: usize = 200;

// LOG LEVEL //

/// Log severity levels (ordered from lowest to highest)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
    Critical,
}

impl LogLevel {
    /// Parse log level from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" | "err" => Some(Self::Error),
            "critical" | "crit" | "fatal" => Some(Self::Critical),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        }
    }
}

// LOG RECORD //

/// One observed log event, immutable after creation.
///
/// `id` is a per-process monotonic sequence so records with equal
/// timestamps still have a stable order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    pub id: u64,

    /// Canonical upper-case service identifier
    pub service: String,

    pub timestamp: DateTime<Utc>,

    pub level: LogLevel,

    /// Message text, truncated to [`MESSAGE_STORE_CAP`] for storage
    pub message: String,

    /// Raw container/source name before normalization
    pub source_identity: String,

    /// Original line, retained for diagnostics (also capped)
    pub raw: String,
}

/// Truncate to a char boundary without panicking on multibyte input.
pub fn truncate_chars(s: &str, cap: usize) -> String {
    if s.chars().count() <= cap {
        s.to_string()
    } else {
        s.chars().take(cap).collect()
    }
}

// ERROR TAXONOMY //

/// Taxonomy tags attached to error messages by the keyword rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorTag {
    Timeout,
    ConnectionRefused,
    PoolExhausted,
    Deadlock,
    MemoryError,
    NullPointer,
    AuthFailure,
    RateLimit,
    DuplicateError,
    HttpError,
    OperationFailed,
    UnknownError,
}

// CORRELATION OUTPUT //

/// The time interval a correlation pass considered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// One step in the reconstructed causal chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainEntry {
    pub timestamp: DateTime<Utc>,
    pub service: String,
    pub level: LogLevel,
    pub message: String,
    pub is_error: bool,
    /// Set when a different service produced the previous error in the
    /// chain. A heuristic hop, not trace-grade causality.
    pub propagated_from: Option<String>,
}

/// Aggregated error evidence extracted during correlation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub error_count: usize,
    /// Tags in rule-table order, no duplicates
    pub error_types: Vec<ErrorTag>,
    /// Deduplicated, truncated messages
    pub error_messages: Vec<String>,
    /// Endpoint-looking substrings (`/api/...`) without duplicates
    pub affected_endpoints: Vec<String>,
}

/// Output of one correlation pass. `origin_service` is always a non-empty
/// canonical name, never an "unknown" sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationResult {
    pub id: Uuid,
    pub trigger_id: u64,
    pub trigger_timestamp: DateTime<Utc>,
    pub origin_service: String,
    /// Discovery order, no duplicates
    pub affected_services: Vec<String>,
    /// Sorted ascending by timestamp
    pub log_chain: Vec<ChainEntry>,
    pub error_details: ErrorDetails,
    pub time_window: TimeWindow,
}

// CLASSIFICATION //

/// Error categories produced by the deterministic classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    DatabaseTimeout,
    NetworkError,
    ConnectionPoolExhaustion,
    MemoryLeak,
    NullPointer,
    ValidationError,
    Other,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DatabaseTimeout => "database_timeout",
            Self::NetworkError => "network_error",
            Self::ConnectionPoolExhaustion => "connection_pool_exhaustion",
            Self::MemoryLeak => "memory_leak",
            Self::NullPointer => "null_pointer",
            Self::ValidationError => "validation_error",
            Self::Other => "other",
        }
    }
}

/// Severity, total order (Low < Medium < High < Critical)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// Blast-radius estimate attached to every classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimatedImpact {
    pub users_affected: String,
    pub data_at_risk: String,
    /// Remaining availability as a percentage string, keyed by severity
    pub service_availability: String,
}

/// Structured analysis of a correlated error context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub root_cause: String,
    pub error_type: ErrorType,
    pub severity: Severity,
    pub technical_details: String,
    pub immediate_actions: Vec<String>,
    pub long_term_fixes: Vec<String>,
    pub related_error_patterns: Vec<String>,
    pub estimated_impact: EstimatedImpact,
}

/// Where a classification came from, so operators can calibrate trust.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisProvenance {
    /// Produced by the external AI collaborator
    Model,
    /// Produced by the deterministic rule tables
    RuleFallback,
}

/// A classification plus its provenance/confidence marker. A report is
/// always produced; it is never withheld on collaborator failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub classification: Classification,
    pub provenance: AnalysisProvenance,
    pub confidence: f64,
}

// METRICS //

/// One resource sample from the external sampler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub service: String,
    pub timestamp: DateTime<Utc>,
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub pid_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    CpuSpike,
    MemorySpike,
}

/// A flagged resource spike for one service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    pub id: Uuid,
    pub service: String,
    pub kind: AnomalyKind,
    pub current: f64,
    pub average: f64,
    pub timestamp: DateTime<Utc>,
}
