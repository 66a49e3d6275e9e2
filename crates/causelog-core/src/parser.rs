//! Line parser - turns one raw line + source identity into a LogRecord.
//!
//! Parsing never fails: lines that do not match the structured pattern get
//! best-effort fallbacks for service, timestamp and level.

use crate::{LogLevel, LogRecord};
use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Canonical service names known out of the box. Raw container names are
/// matched against these by substring before any stripping heuristics run.
pub const DEFAULT_KNOWN_SERVICES: &[&str] = &[
    "API-GATEWAY",
    "USER-SERVICE",
    "DB-SERVICE",
    "AUTH-SERVICE",
    "PAYMENT-SERVICE",
    "ORDER-SERVICE",
    "CACHE-SERVICE",
    "NOTIFICATION-SERVICE",
];

// SERVICE NORMALIZER //

/// Maps raw container/source names to canonical upper-case service names.
/// Shared between the parser fallback and the correlator's origin
/// inference, which needs the exact same mapping.
#[derive(Debug, Clone)]
pub struct ServiceNormalizer {
    known: Vec<String>,
}

impl ServiceNormalizer {
    pub fn new() -> Self {
        Self {
            known: DEFAULT_KNOWN_SERVICES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    pub fn with_known(known: Vec<String>) -> Self {
        Self { known }
    }

    pub fn known_services(&self) -> &[String] {
        &self.known
    }

    /// True if `name` normalizes to one of the known canonical services.
    pub fn is_known(&self, name: &str) -> bool {
        let needle = name.to_lowercase().replace('_', "-");
        self.known.iter().any(|k| k.to_lowercase() == needle)
    }

    /// Exact substring match against the known table, if any.
    pub fn match_known(&self, raw: &str) -> Option<String> {
        let haystack = raw.to_lowercase().replace('_', "-");
        self.known
            .iter()
            .find(|k| haystack.contains(&k.to_lowercase()))
            .cloned()
    }

    /// Normalize a raw source identity to a canonical service name.
    ///
    /// Order: known-table substring match, then container prefix/suffix
    /// stripping, then uppercased verbatim. Always non-empty.
    pub fn normalize(&self, raw: &str) -> String {
        if let Some(known) = self.match_known(raw) {
            return known;
        }

        let mut name = raw.trim().to_lowercase();
        for prefix in ["docker-", "docker_", "compose_", "compose-", "k8s_", "pod-"] {
            if let Some(rest) = name.strip_prefix(prefix) {
                name = rest.to_string();
                break;
            }
        }
        // trailing replica counters like "-1" / "_7"
        while let Some(idx) = name.rfind(['-', '_']) {
            if idx > 0 && name[idx + 1..].chars().all(|c| c.is_ascii_digit())
                && !name[idx + 1..].is_empty()
            {
                name.truncate(idx);
            } else {
                break;
            }
        }

        let canonical = name.replace('_', "-").to_uppercase();
        if canonical.is_empty() {
            "SOURCE".to_string()
        } else {
            canonical
        }
    }
}

impl Default for ServiceNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

// LINE PARSER //

/// Parses `[SERVICE] TIMESTAMP LEVEL: message` lines, with fallbacks for
/// everything else. Ids come from a per-parser monotonic counter.
pub struct LineParser {
    pattern: Regex,
    normalizer: ServiceNormalizer,
    next_id: AtomicU64,
}

impl LineParser {
    pub fn new() -> Self {
        Self::with_normalizer(ServiceNormalizer::new())
    }

    pub fn with_normalizer(normalizer: ServiceNormalizer) -> Self {
        Self {
            // [SERVICE] TIMESTAMP LEVEL: message
            pattern: Regex::new(
                r"^\[([A-Za-z0-9_-]+)\]\s+(\S+)\s+(?i)(DEBUG|INFO|WARN|WARNING|ERROR|CRITICAL|FATAL):\s*(.*)$",
            )
            .unwrap(),
            normalizer,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn normalizer(&self) -> &ServiceNormalizer {
        &self.normalizer
    }

    /// Parse one raw line. Never fails; unstructured lines get fallback
    /// service/timestamp/level. Caller filters empty lines first.
    pub fn parse(&self, raw_line: &str, source_identity: &str) -> LogRecord {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        if let Some(caps) = self.pattern.captures(raw_line) {
            let service = caps.get(1).map(|m| m.as_str()).unwrap_or("").to_uppercase();
            let ts_str = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            let level_str = caps.get(3).map(|m| m.as_str()).unwrap_or("");
            let message = caps.get(4).map(|m| m.as_str()).unwrap_or("").to_string();

            return LogRecord {
                id,
                service: service.replace('_', "-"),
                timestamp: parse_timestamp(ts_str).unwrap_or_else(Utc::now),
                level: LogLevel::from_str(level_str).unwrap_or(LogLevel::Info),
                message,
                source_identity: source_identity.to_string(),
                raw: raw_line.to_string(),
            };
        }

        // fallback path: derive everything from the source name and message text
        LogRecord {
            id,
            service: self.normalizer.normalize(source_identity),
            timestamp: Utc::now(),
            level: infer_level(raw_line),
            message: raw_line.to_string(),
            source_identity: source_identity.to_string(),
            raw: raw_line.to_string(),
        }
    }
}

impl Default for LineParser {
    fn default() -> Self {
        Self::new()
    }
}

/// ISO-8601 timestamp, RFC 3339 first then naive datetime.
fn parse_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc))
}

/// Keyword scan for unstructured lines. First match wins in priority
/// order: CRITICAL > ERROR > WARN > DEBUG > default INFO.
fn infer_level(line: &str) -> LogLevel {
    let upper = line.to_uppercase();
    if upper.contains("CRITICAL") || upper.contains("FATAL") {
        LogLevel::Critical
    } else if upper.contains("ERROR") {
        LogLevel::Error
    } else if upper.contains("WARN") {
        LogLevel::Warn
    } else if upper.contains("DEBUG") {
        LogLevel::Debug
    } else {
        LogLevel::Info
    }
}
