//! Origin service inference.
//!
//! Ordered precedence chain, first success wins:
//!   a. first error/critical record with a usable service name
//!   b. first record whose service is on the known-services whitelist
//!   c. first record whose source identity maps to a known service
//!   d. the trigger's own service (re-normalized), else message-content
//!      heuristics over the trigger message
//!   e. the configured default service
//!
//! The chain terminates in the default, so the result is never an
//! "unknown" sentinel.

use causelog_core::parser::ServiceNormalizer;
use causelog_core::LogRecord;
use regex::Regex;
use tracing::debug;

pub struct OriginResolver {
    normalizer: ServiceNormalizer,
    default_service: String,
    // "from payment-service", "to db-service", "in user-service"
    relation_pattern: Regex,
    // bracketed service tags inside the message body
    bracket_pattern: Regex,
}

impl OriginResolver {
    pub fn new(normalizer: ServiceNormalizer, default_service: String) -> Self {
        Self {
            normalizer,
            default_service,
            relation_pattern: Regex::new(r"(?i)\b(?:from|to|in)\s+([A-Za-z0-9_-]+[-_]service)\b")
                .unwrap(),
            bracket_pattern: Regex::new(r"\[([A-Z][A-Z0-9_-]{2,})\]").unwrap(),
        }
    }

    /// Resolve the origin service for a sorted selection plus its trigger.
    /// `is_error` carries the classifier verdict per selected record, same
    /// indexing as `sorted`.
    pub fn resolve(&self, trigger: &LogRecord, sorted: &[LogRecord], is_error: &[bool]) -> String {
        // a. first error record with a usable service name
        if let Some(record) = sorted
            .iter()
            .zip(is_error)
            .find(|(r, e)| **e && usable_service(&r.service))
            .map(|(r, _)| r)
        {
            debug!(service = %record.service, "origin from first error record");
            return record.service.clone();
        }

        // b. first record on the known-services whitelist
        if let Some(record) = sorted.iter().find(|r| self.normalizer.is_known(&r.service)) {
            debug!(service = %record.service, "origin from whitelist");
            return record.service.clone();
        }

        // c. first record whose source identity maps to a known service
        if let Some(known) = sorted
            .iter()
            .find_map(|r| self.normalizer.match_known(&r.source_identity))
        {
            debug!(service = %known, "origin from source identity");
            return known;
        }

        // d. the trigger itself, re-normalized, else message content
        if usable_service(&trigger.service) {
            return self.normalizer.normalize(&trigger.service);
        }
        if let Some(service) = self.from_message(&trigger.message) {
            debug!(service = %service, "origin from message content");
            return service;
        }

        // e. configured default, never "unknown"
        self.default_service.clone()
    }

    /// Message-content heuristics: relation phrases, then bracketed tags.
    fn from_message(&self, message: &str) -> Option<String> {
        if let Some(caps) = self.relation_pattern.captures(message) {
            let name = caps.get(1)?.as_str().to_uppercase().replace('_', "-");
            return Some(name);
        }
        self.bracket_pattern
            .captures(message)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().replace('_', "-"))
    }
}

/// A service name we are willing to surface as an origin.
fn usable_service(service: &str) -> bool {
    let trimmed = service.trim();
    !trimmed.is_empty() && !trimmed.eq_ignore_ascii_case("unknown")
}
