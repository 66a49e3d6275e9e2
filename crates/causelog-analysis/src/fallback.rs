//! Deterministic classifier - pure rule-table evaluation over a
//! correlation result. No network, no file I/O, always produces a
//! classification.
//!
//! The tables below are part of the behavioral contract: error-type
//! resolution is first-match-wins over a fixed priority order, severity
//! escalation is monotonic non-decreasing through an ordered rule chain.

use causelog_core::{
    Classification, CorrelationResult, ErrorTag, ErrorType, EstimatedImpact, Severity,
};
use regex::Regex;

/// Error-type priority order: the first tag present in the correlation's
/// evidence decides the type.
const TYPE_RULES: &[(ErrorTag, ErrorType)] = &[
    (ErrorTag::Timeout, ErrorType::DatabaseTimeout),
    (ErrorTag::ConnectionRefused, ErrorType::NetworkError),
    (ErrorTag::PoolExhausted, ErrorType::ConnectionPoolExhaustion),
    (ErrorTag::MemoryError, ErrorType::MemoryLeak),
    (ErrorTag::NullPointer, ErrorType::NullPointer),
    (ErrorTag::Deadlock, ErrorType::DatabaseTimeout),
    (ErrorTag::DuplicateError, ErrorType::ValidationError),
    (ErrorTag::OperationFailed, ErrorType::NetworkError),
    (ErrorTag::HttpError, ErrorType::NetworkError),
];

pub struct FallbackClassifier {
    root_cause_rules: Vec<(Regex, &'static str)>,
}

impl FallbackClassifier {
    pub fn new() -> Self {
        // ordered phrase templates, first match against the primary error
        // message wins
        let rules = [
            (r"(?i)timeout|timed out", "Database query timeout under load"),
            (r"(?i)deadlock", "Database deadlock between concurrent transactions"),
            (r"(?i)out of memory|oom|memory leak|heap", "Memory exhaustion in the service process"),
            (r"(?i)duplicate", "Duplicate record rejected by a uniqueness constraint"),
            (r"(?i)connection refused", "Connection refused by a downstream dependency"),
            (r"(?i)pool exhausted", "Database connection pool exhausted, connections not being released"),
            (r"(?i)failed to fetch|fetch failed", "Upstream fetch failed against a dependency"),
            (r"(?i)failed to create|create failed", "Resource creation failed in a downstream store"),
            (r"(?i)gateway timeout|\b504\b", "Gateway timeout waiting for an upstream response"),
            (r"\b50[023]\b", "Upstream returned a 5xx server error"),
        ];
        Self {
            root_cause_rules: rules
                .iter()
                .map(|(pattern, cause)| (Regex::new(pattern).unwrap(), *cause))
                .collect(),
        }
    }

    /// Derive a full classification from correlated evidence.
    pub fn classify(&self, correlation: &CorrelationResult) -> Classification {
        let error_type = resolve_error_type(&correlation.error_details.error_types);
        let severity = resolve_severity(
            correlation.affected_services.len(),
            correlation.error_details.error_count,
            error_type,
        );
        let root_cause = self.resolve_root_cause(correlation);
        let templates = type_templates(error_type);

        Classification {
            root_cause,
            error_type,
            severity,
            technical_details: templates.technical_details.to_string(),
            immediate_actions: to_strings(templates.immediate_actions),
            long_term_fixes: to_strings(templates.long_term_fixes),
            related_error_patterns: to_strings(templates.related_patterns),
            estimated_impact: estimate_impact(
                correlation.affected_services.len(),
                error_type,
                severity,
            ),
        }
    }

    /// First matching phrase template over the primary error message;
    /// default is the message's first pipe-delimited segment.
    fn resolve_root_cause(&self, correlation: &CorrelationResult) -> String {
        let primary = correlation
            .error_details
            .error_messages
            .first()
            .map(String::as_str)
            .unwrap_or("");

        for (pattern, cause) in &self.root_cause_rules {
            if pattern.is_match(primary) {
                return cause.to_string();
            }
        }

        let segment = primary.split('|').next().unwrap_or(primary).trim();
        if segment.is_empty() {
            "Unclassified failure, see correlated log chain".to_string()
        } else {
            segment.to_string()
        }
    }
}

impl Default for FallbackClassifier {
    fn default() -> Self {
        Self::new()
    }
}

fn resolve_error_type(tags: &[ErrorTag]) -> ErrorType {
    for (tag, error_type) in TYPE_RULES {
        if tags.contains(tag) {
            return *error_type;
        }
    }
    ErrorType::Other
}

/// Ordered escalation from Medium. Later rules can only raise severity,
/// never lower it.
fn resolve_severity(affected_services: usize, error_count: usize, error_type: ErrorType) -> Severity {
    let mut severity = Severity::Medium;

    if affected_services >= 3 {
        severity = severity.max(Severity::Critical);
    }
    if affected_services == 2 {
        severity = severity.max(Severity::High);
    }
    if error_count > 5 {
        severity = severity.max(Severity::High);
    }
    if error_type == ErrorType::MemoryLeak {
        severity = severity.max(Severity::High);
    }
    if error_type == ErrorType::DatabaseTimeout && error_count > 2 {
        severity = severity.max(Severity::High);
    }

    severity
}

fn estimate_impact(
    affected_services: usize,
    error_type: ErrorType,
    severity: Severity,
) -> EstimatedImpact {
    let users_affected = if affected_services >= 3 {
        "many"
    } else if affected_services >= 2 {
        "some"
    } else {
        "few"
    };

    let data_at_risk = match error_type {
        ErrorType::DatabaseTimeout | ErrorType::ValidationError => "medium",
        _ => "none",
    };

    let service_availability = match severity {
        Severity::Critical => "50%",
        Severity::High => "80%",
        _ => "95%",
    };

    EstimatedImpact {
        users_affected: users_affected.to_string(),
        data_at_risk: data_at_risk.to_string(),
        service_availability: service_availability.to_string(),
    }
}

struct TypeTemplates {
    technical_details: &'static str,
    immediate_actions: &'static [&'static str],
    long_term_fixes: &'static [&'static str],
    related_patterns: &'static [&'static str],
}

/// Fixed per-error-type remediation templates; unknown types fall back to
/// the generic set.
fn type_templates(error_type: ErrorType) -> TypeTemplates {
    match error_type {
        ErrorType::DatabaseTimeout => TypeTemplates {
            technical_details:
                "Database operations exceeded their deadline; queries are queuing behind slow or locked statements.",
            immediate_actions: &[
                "Check database load and active query count",
                "Kill long-running queries holding locks",
                "Raise statement timeout temporarily to drain the queue",
            ],
            long_term_fixes: &[
                "Add indexes for the slowest queries",
                "Introduce read replicas for reporting traffic",
                "Set per-query timeouts below the upstream request timeout",
            ],
            related_patterns: &["lock wait timeout", "statement timeout", "slow query log growth"],
        },
        ErrorType::ConnectionPoolExhaustion => TypeTemplates {
            technical_details:
                "All pooled database connections are checked out; new requests block or fail immediately.",
            immediate_actions: &[
                "Restart the affected service to release leaked connections",
                "Raise the pool ceiling as a stopgap",
                "Check for transactions left open by failed requests",
            ],
            long_term_fixes: &[
                "Audit connection release on every error path",
                "Add pool utilization metrics and alerts",
                "Introduce a connection acquisition timeout with backpressure",
            ],
            related_patterns: &["pool exhausted", "connection checkout timeout", "too many clients"],
        },
        ErrorType::MemoryLeak => TypeTemplates {
            technical_details:
                "Resident memory grows without bound until the process is OOM-killed or allocation fails.",
            immediate_actions: &[
                "Restart the leaking service to reclaim memory",
                "Capture a heap snapshot before the restart if possible",
                "Lower traffic to the instance while it recovers",
            ],
            long_term_fixes: &[
                "Profile heap growth under sustained load",
                "Bound in-process caches and queues",
                "Add memory limits with alerting well before the kill threshold",
            ],
            related_patterns: &["OOMKilled", "GC pressure", "heap out of memory"],
        },
        ErrorType::NetworkError => TypeTemplates {
            technical_details:
                "Calls between services are failing at the transport or HTTP layer; upstreams return 5xx or refuse connections.",
            immediate_actions: &[
                "Verify the downstream service is up and reachable",
                "Check DNS and service discovery entries",
                "Inspect recent deploys of the failing dependency",
            ],
            long_term_fixes: &[
                "Add retries with exponential backoff and jitter",
                "Introduce circuit breakers around flaky dependencies",
                "Define timeouts tighter than the caller's own deadline",
            ],
            related_patterns: &["connection refused", "502/503/504 responses", "DNS resolution failure"],
        },
        ErrorType::NullPointer => TypeTemplates {
            technical_details:
                "A code path dereferenced a missing value; usually an unhandled optional on an error branch.",
            immediate_actions: &[
                "Locate the failing code path from the stack trace",
                "Guard the dereference and redeploy",
            ],
            long_term_fixes: &[
                "Add validation at the boundary where the value enters the system",
                "Extend tests to cover the error branch that produced the null",
            ],
            related_patterns: &["NullPointerException", "undefined is not an object", "nil dereference"],
        },
        ErrorType::ValidationError => TypeTemplates {
            technical_details:
                "Input rejected by integrity rules; duplicates or constraint violations are surfacing as request failures.",
            immediate_actions: &[
                "Identify the client sending the conflicting writes",
                "Check for retry storms re-submitting the same payload",
            ],
            long_term_fixes: &[
                "Make the write path idempotent",
                "Validate uniqueness before the write where practical",
            ],
            related_patterns: &["duplicate key", "constraint violation", "409 conflict"],
        },
        ErrorType::Other => TypeTemplates {
            technical_details:
                "Error pattern does not match a known category; inspect the correlated chain for the first failing service.",
            immediate_actions: &[
                "Read the earliest error in the correlated chain",
                "Check the origin service's recent deploys and config changes",
            ],
            long_term_fixes: &[
                "Add structured logging around the failing operation",
                "Extend the classification tables once the pattern is understood",
            ],
            related_patterns: &["unclassified error"],
        },
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_priority_first_match_wins() {
        // Timeout outranks HttpError even when both tagged
        let tags = vec![ErrorTag::HttpError, ErrorTag::Timeout];
        assert_eq!(resolve_error_type(&tags), ErrorType::DatabaseTimeout);

        let tags = vec![ErrorTag::OperationFailed, ErrorTag::PoolExhausted];
        assert_eq!(resolve_error_type(&tags), ErrorType::ConnectionPoolExhaustion);
    }

    #[test]
    fn test_deadlock_maps_to_database_timeout() {
        assert_eq!(
            resolve_error_type(&[ErrorTag::Deadlock]),
            ErrorType::DatabaseTimeout
        );
    }

    #[test]
    fn test_unknown_tags_map_to_other() {
        assert_eq!(resolve_error_type(&[ErrorTag::UnknownError]), ErrorType::Other);
        assert_eq!(resolve_error_type(&[]), ErrorType::Other);
    }

    #[test]
    fn test_severity_three_services_critical() {
        assert_eq!(resolve_severity(3, 1, ErrorType::Other), Severity::Critical);
        assert_eq!(resolve_severity(5, 1, ErrorType::Other), Severity::Critical);
    }

    #[test]
    fn test_severity_two_services_high() {
        assert_eq!(resolve_severity(2, 1, ErrorType::Other), Severity::High);
    }

    #[test]
    fn test_severity_monotonic_in_services() {
        // adding services never decreases severity
        let mut last = Severity::Low;
        for services in 1..6 {
            let sev = resolve_severity(services, 1, ErrorType::Other);
            assert!(sev >= last, "severity dropped at {} services", services);
            last = sev;
        }
    }

    #[test]
    fn test_severity_escalations_never_lower() {
        // a Critical context stays Critical through later High rules
        assert_eq!(
            resolve_severity(3, 10, ErrorType::DatabaseTimeout),
            Severity::Critical
        );
        assert_eq!(resolve_severity(1, 1, ErrorType::MemoryLeak), Severity::High);
        assert_eq!(
            resolve_severity(1, 3, ErrorType::DatabaseTimeout),
            Severity::High
        );
        assert_eq!(resolve_severity(1, 6, ErrorType::Other), Severity::High);
        assert_eq!(resolve_severity(1, 1, ErrorType::Other), Severity::Medium);
    }

    #[test]
    fn test_impact_table() {
        let impact = estimate_impact(3, ErrorType::DatabaseTimeout, Severity::Critical);
        assert_eq!(impact.users_affected, "many");
        assert_eq!(impact.data_at_risk, "medium");
        assert_eq!(impact.service_availability, "50%");

        let impact = estimate_impact(1, ErrorType::NetworkError, Severity::Medium);
        assert_eq!(impact.users_affected, "few");
        assert_eq!(impact.data_at_risk, "none");
        assert_eq!(impact.service_availability, "95%");
    }
}
